//! Keyboard events as seen by the input router.

use bitflags::bitflags;
use crossterm::event::KeyModifiers;

bitflags! {
    /// Modifier keys
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
    }
}

impl From<KeyModifiers> for Modifiers {
    fn from(mods: KeyModifiers) -> Self {
        let mut result = Modifiers::empty();
        if mods.contains(KeyModifiers::SHIFT) {
            result |= Modifiers::SHIFT;
        }
        if mods.contains(KeyModifiers::CONTROL) {
            result |= Modifiers::CTRL;
        }
        if mods.contains(KeyModifiers::ALT) {
            result |= Modifiers::ALT;
        }
        result
    }
}

impl Modifiers {
    /// Parse a single modifier name ("shift", "alt", "ctrl")
    pub fn from_trigger_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "shift" => Some(Modifiers::SHIFT),
            "alt" | "meta" | "option" => Some(Modifiers::ALT),
            "ctrl" | "control" => Some(Modifiers::CTRL),
            _ => None,
        }
    }
}

/// Keys with a fixed meaning to the router
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NamedKey {
    Enter,
    Backspace,
    Tab,
    Escape,
    CtrlC,
    CtrlD,
}

/// A discrete keyboard event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyInput {
    /// A typed character
    Char(char),
    /// A named key with the modifiers held
    Key(NamedKey, Modifiers),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_crossterm_modifiers() {
        let mods = Modifiers::from(KeyModifiers::SHIFT | KeyModifiers::ALT);
        assert_eq!(mods, Modifiers::SHIFT | Modifiers::ALT);
        assert_eq!(Modifiers::from(KeyModifiers::NONE), Modifiers::empty());
    }

    #[test]
    fn test_from_trigger_name() {
        assert_eq!(Modifiers::from_trigger_name("Shift"), Some(Modifiers::SHIFT));
        assert_eq!(Modifiers::from_trigger_name("ctrl"), Some(Modifiers::CTRL));
        assert_eq!(Modifiers::from_trigger_name(" alt "), Some(Modifiers::ALT));
        assert_eq!(Modifiers::from_trigger_name("hyper"), None);
    }
}
