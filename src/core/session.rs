//! Session management
//!
//! Ties the shell's pseudo-terminal to the parser and the screen it draws on.
//! Everything here is owned and mutated by the main loop only.

use super::pty::{PtyError, PtySession};
use super::term::{AnsiParser, ScreenBuffer};

/// A running shell and the screen it draws on
pub struct Session {
    /// Screen state, read by the renderer once per frame
    pub screen: ScreenBuffer,
    /// Shell process
    pub pty: PtySession,
    parser: AnsiParser,
}

impl Session {
    /// Spawn `shell` with a screen of `cols` x `rows`
    pub fn start(shell: &str, cols: u16, rows: u16) -> Result<Self, PtyError> {
        let pty = PtySession::spawn(shell, cols, rows)?;
        Ok(Self {
            screen: ScreenBuffer::new(cols, rows),
            pty,
            parser: AnsiParser::new(),
        })
    }

    /// Move pending shell output through the parser (non-blocking).
    /// Returns whether anything was read.
    pub fn pump(&mut self) -> bool {
        let Some(data) = self.pty.read_nonblocking() else {
            return false;
        };
        self.feed_bytes(&data);
        true
    }

    /// Feed raw shell output into the screen
    pub fn feed_bytes(&mut self, bytes: &[u8]) {
        self.parser.feed(bytes, &mut self.screen);
    }

    pub fn is_closed(&self) -> bool {
        self.pty.is_closed()
    }
}
