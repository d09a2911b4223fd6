//! Input router
//!
//! Routes each key event according to the current mode:
//!
//! | Mode              | Printable / editing keys | Enter            | y / n          |
//! |-------------------|--------------------------|------------------|----------------|
//! | `Normal`          | edit buffer + echo       | submit or ask AI | typed normally |
//! | `AwaitingAi`      | ignored                  | ignored          | ignored        |
//! | `AwaitingConfirm` | ignored                  | ignored          | run / cancel   |
//!
//! Ctrl+C and Ctrl+D reach the shell in every mode.

use tracing::{debug, trace};

use super::edit::EditBuffer;
use super::key::{KeyInput, Modifiers, NamedKey};
use crate::ai::{AiOutcome, AiService};
use crate::core::pty::ShellInput;
use crate::core::term::state::PLACEHOLDER;
use crate::core::term::ScreenBuffer;

const CTRL_C: u8 = 0x03;
const CTRL_D: u8 = 0x04;

/// Router mode
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RouterMode {
    #[default]
    Normal,
    /// A request is with the model
    AwaitingAi,
    /// A suggestion is on screen waiting for y/n
    AwaitingConfirm { command: String },
}

/// What the surrounding loop should do after a key
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouterOutcome {
    Continue,
    Quit,
}

/// Everything a key may touch, borrowed from the main loop
pub struct RouterContext<'a> {
    pub screen: &'a mut ScreenBuffer,
    pub shell: &'a mut dyn ShellInput,
    pub ai: &'a mut AiService,
}

pub struct InputRouter {
    mode: RouterMode,
    edit: EditBuffer,
    /// Modifier that turns Enter into "send to AI"
    ai_modifier: Modifiers,
}

impl InputRouter {
    pub fn new(ai_modifier: Modifiers) -> Self {
        Self {
            mode: RouterMode::Normal,
            edit: EditBuffer::new(),
            ai_modifier,
        }
    }

    #[allow(dead_code)]
    pub fn mode(&self) -> &RouterMode {
        &self.mode
    }

    /// Suggestion waiting for confirmation, if any
    #[allow(dead_code)]
    pub fn pending_command(&self) -> Option<&str> {
        match &self.mode {
            RouterMode::AwaitingConfirm { command } => Some(command),
            _ => None,
        }
    }

    #[allow(dead_code)]
    pub fn edit_buffer(&self) -> &EditBuffer {
        &self.edit
    }

    fn set_mode(&mut self, mode: RouterMode) {
        debug!("Input mode: {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
    }

    /// Route a single key event
    pub fn handle_key(&mut self, key: KeyInput, ctx: &mut RouterContext<'_>) -> RouterOutcome {
        match key {
            KeyInput::Key(NamedKey::CtrlC, _) => {
                ctx.shell.send(&[CTRL_C]);
                return RouterOutcome::Continue;
            }
            KeyInput::Key(NamedKey::CtrlD, _) => {
                ctx.shell.send(&[CTRL_D]);
                return RouterOutcome::Continue;
            }
            _ => {}
        }

        match self.mode {
            RouterMode::Normal => self.handle_normal(key, ctx),
            RouterMode::AwaitingAi => {
                if matches!(key, KeyInput::Key(NamedKey::Escape, _)) {
                    return RouterOutcome::Quit;
                }
                trace!("Ignoring {:?} while waiting for AI", key);
                RouterOutcome::Continue
            }
            RouterMode::AwaitingConfirm { .. } => {
                self.handle_confirm(key, ctx);
                RouterOutcome::Continue
            }
        }
    }

    fn handle_normal(&mut self, key: KeyInput, ctx: &mut RouterContext<'_>) -> RouterOutcome {
        match key {
            KeyInput::Char(ch) => self.type_char(ch, ctx.screen),
            KeyInput::Key(NamedKey::Backspace, _) => self.backspace(ctx.screen),
            KeyInput::Key(NamedKey::Tab, _) => self.append(b'\t', ctx.screen),
            KeyInput::Key(NamedKey::Enter, mods) => {
                if !self.ai_modifier.is_empty() && mods.contains(self.ai_modifier) {
                    self.ask_ai(ctx);
                } else {
                    self.submit_line(ctx);
                }
            }
            KeyInput::Key(NamedKey::Escape, _) => return RouterOutcome::Quit,
            KeyInput::Key(NamedKey::CtrlC | NamedKey::CtrlD, _) => {}
        }
        RouterOutcome::Continue
    }

    fn type_char(&mut self, ch: char, screen: &mut ScreenBuffer) {
        if !ch.is_ascii() {
            self.append(PLACEHOLDER, screen);
            return;
        }
        match ch as u8 {
            b'\r' | b'\n' => {}
            0x7F => self.backspace(screen),
            byte => self.append(byte, screen),
        }
    }

    fn append(&mut self, byte: u8, screen: &mut ScreenBuffer) {
        self.edit.push(byte);
        screen.put_byte(byte);
    }

    fn backspace(&mut self, screen: &mut ScreenBuffer) {
        if self.edit.pop().is_some() {
            screen.backspace();
        }
    }

    fn submit_line(&mut self, ctx: &mut RouterContext<'_>) {
        ctx.shell.send(&self.edit.to_submission());
        ctx.screen.put_byte(b'\n');
        self.edit.clear();
    }

    fn ask_ai(&mut self, ctx: &mut RouterContext<'_>) {
        let request = self.edit.request_text();
        if request.is_empty() {
            ctx.screen.put_line("[AI] Nothing to send (empty line).");
            return;
        }

        self.set_mode(RouterMode::AwaitingAi);
        ctx.ai.submit(&request);
        ctx.screen.put_line("[AI] Thinking...");
    }

    fn handle_confirm(&mut self, key: KeyInput, ctx: &mut RouterContext<'_>) {
        let accept = match key {
            KeyInput::Char('y' | 'Y') => true,
            KeyInput::Char('n' | 'N') => false,
            _ => {
                trace!("Ignoring {:?} while awaiting confirmation", key);
                return;
            }
        };

        let RouterMode::AwaitingConfirm { command } = std::mem::take(&mut self.mode) else {
            return;
        };

        if accept {
            let mut line = command.clone().into_bytes();
            line.push(b'\n');
            ctx.shell.send(&line);

            ctx.screen.reset_line();
            self.edit.clear();
            ctx.screen.put_line(&command);
            ctx.screen.put_line(&format!("[AI executed] {}", command));
        } else {
            ctx.screen.put_line("[AI cancelled]");
            ctx.shell.send(&[CTRL_C]);
            ctx.screen.put_line("^C");
        }
        debug!("Input mode: AwaitingConfirm -> Normal (accepted: {})", accept);
    }

    /// Pick up a finished AI request. Returns whether the mode changed.
    pub fn poll_ai(&mut self, screen: &mut ScreenBuffer, ai: &mut AiService) -> bool {
        if self.mode != RouterMode::AwaitingAi {
            return false;
        }
        let Some(outcome) = ai.try_take() else {
            return false;
        };

        match outcome {
            AiOutcome::Suggestion(command) => {
                screen.put_line(&format!("[AI suggestion] {}", command));
                screen.put_line("Execute? (y/n)");
                self.set_mode(RouterMode::AwaitingConfirm { command });
            }
            AiOutcome::Empty => self.set_mode(RouterMode::Normal),
            AiOutcome::Failed(message) => {
                screen.put_line(&format!("[AI error] {}", message));
                self.set_mode(RouterMode::Normal);
            }
        }
        true
    }
}
