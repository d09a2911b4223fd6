//! Key mapping for terminal input
//!
//! Converts crossterm key events to router-level key inputs.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::input::{KeyInput, Modifiers, NamedKey};

/// Key mapper for converting crossterm events to router input
pub struct KeyMapper;

impl KeyMapper {
    /// Map a crossterm KeyEvent. Releases and unsupported keys map to `None`.
    pub fn map(event: &KeyEvent) -> Option<KeyInput> {
        if event.kind == KeyEventKind::Release {
            return None;
        }

        let mods = Modifiers::from(event.modifiers);

        match event.code {
            KeyCode::Char(ch) => Self::map_char(ch, mods),
            KeyCode::Enter => Some(KeyInput::Key(NamedKey::Enter, mods)),
            KeyCode::Backspace => Some(KeyInput::Key(NamedKey::Backspace, mods)),
            KeyCode::Tab => Some(KeyInput::Key(NamedKey::Tab, mods)),
            KeyCode::Esc => Some(KeyInput::Key(NamedKey::Escape, mods)),
            _ => None,
        }
    }

    /// Map a character with modifiers
    fn map_char(ch: char, mods: Modifiers) -> Option<KeyInput> {
        if mods.contains(Modifiers::CTRL) {
            // Only the interrupt and end-of-input controls reach the shell
            return match ch.to_ascii_lowercase() {
                'c' => Some(KeyInput::Key(NamedKey::CtrlC, mods)),
                'd' => Some(KeyInput::Key(NamedKey::CtrlD, mods)),
                _ => None,
            };
        }
        Some(KeyInput::Char(ch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, KeyModifiers};

    fn key_event(code: KeyCode, mods: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, mods)
    }

    #[test]
    fn test_char_keys() {
        let event = key_event(KeyCode::Char('a'), KeyModifiers::NONE);
        assert_eq!(KeyMapper::map(&event), Some(KeyInput::Char('a')));

        // Shifted characters arrive already cased
        let event = key_event(KeyCode::Char('A'), KeyModifiers::SHIFT);
        assert_eq!(KeyMapper::map(&event), Some(KeyInput::Char('A')));

        let event = key_event(KeyCode::Char('x'), KeyModifiers::ALT);
        assert_eq!(KeyMapper::map(&event), Some(KeyInput::Char('x')));
    }

    #[test]
    fn test_ctrl_keys() {
        let event = key_event(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(
            KeyMapper::map(&event),
            Some(KeyInput::Key(NamedKey::CtrlC, Modifiers::CTRL))
        );

        let event = key_event(KeyCode::Char('D'), KeyModifiers::CONTROL | KeyModifiers::SHIFT);
        assert!(matches!(
            KeyMapper::map(&event),
            Some(KeyInput::Key(NamedKey::CtrlD, _))
        ));

        let event = key_event(KeyCode::Char('z'), KeyModifiers::CONTROL);
        assert_eq!(KeyMapper::map(&event), None);
    }

    #[test]
    fn test_named_keys() {
        let event = key_event(KeyCode::Enter, KeyModifiers::SHIFT);
        assert_eq!(
            KeyMapper::map(&event),
            Some(KeyInput::Key(NamedKey::Enter, Modifiers::SHIFT))
        );

        let event = key_event(KeyCode::Backspace, KeyModifiers::NONE);
        assert_eq!(
            KeyMapper::map(&event),
            Some(KeyInput::Key(NamedKey::Backspace, Modifiers::empty()))
        );

        let event = key_event(KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(
            KeyMapper::map(&event),
            Some(KeyInput::Key(NamedKey::Escape, Modifiers::empty()))
        );

        let event = key_event(KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(KeyMapper::map(&event), None);

        let event = key_event(KeyCode::F(1), KeyModifiers::NONE);
        assert_eq!(KeyMapper::map(&event), None);
    }

    #[test]
    fn test_release_ignored() {
        let event = KeyEvent {
            code: KeyCode::Char('a'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(KeyMapper::map(&event), None);

        let event = KeyEvent {
            kind: KeyEventKind::Repeat,
            ..event
        };
        assert_eq!(KeyMapper::map(&event), Some(KeyInput::Char('a')));
    }
}
