//! ANSI stream parser
//!
//! Parses shell output one byte at a time and updates the screen buffer.
//! The state survives between calls, so a sequence split across two reads
//! resumes where it stopped.

use super::state::{Color, ScreenBuffer};

const ESC: u8 = 0x1B;
const BEL: u8 = 0x07;

/// Accumulator limits; bytes past them are dropped but the sequence is
/// still tracked until its terminator.
const MAX_CSI_LEN: usize = 256;
const MAX_OSC_LEN: usize = 4096;

/// Parser state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ParserState {
    #[default]
    Normal,
    Escape,
    /// Parameter and intermediate bytes seen after `ESC [`
    Csi(Vec<u8>),
    /// Payload after `ESC ]`; `escape` is set once an ESC arrives inside it
    Osc { payload: Vec<u8>, escape: bool },
}

/// A complete control sequence, minus the `ESC [` prefix
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsiSequence {
    pub params: Vec<u8>,
    pub final_byte: u8,
}

impl CsiSequence {
    /// `;`-separated parameters. Empty fields are `None`; fields that are
    /// not a number read as 0.
    pub fn params(&self) -> Vec<Option<u16>> {
        if self.params.is_empty() {
            return Vec::new();
        }
        self.params
            .split(|&b| b == b';')
            .map(|field| {
                if field.is_empty() {
                    return None;
                }
                if !field.iter().all(u8::is_ascii_digit) {
                    return Some(0);
                }
                // Oversized values saturate so they clamp like any large value
                let value = field.iter().fold(0u16, |acc, &b| {
                    acc.saturating_mul(10).saturating_add(u16::from(b - b'0'))
                });
                Some(value)
            })
            .collect()
    }

    /// Parameter `index`, or `default` when missing
    pub fn param_or(&self, index: usize, default: u16) -> u16 {
        self.params()
            .get(index)
            .copied()
            .flatten()
            .unwrap_or(default)
    }
}

/// Effect of a single byte on the screen
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Byte goes through the printable-insertion policy
    Print(u8),
    /// Control sequence ready for dispatch
    Csi(CsiSequence),
}

/// Pure transition function: no I/O, no screen access.
pub fn step(state: ParserState, byte: u8) -> (ParserState, Option<Action>) {
    match state {
        ParserState::Normal => {
            if byte == ESC {
                (ParserState::Escape, None)
            } else {
                (ParserState::Normal, Some(Action::Print(byte)))
            }
        }
        ParserState::Escape => match byte {
            b'[' => (ParserState::Csi(Vec::new()), None),
            b']' => (
                ParserState::Osc {
                    payload: Vec::new(),
                    escape: false,
                },
                None,
            ),
            _ => (ParserState::Normal, None),
        },
        ParserState::Csi(mut params) => {
            if (0x40..=0x7E).contains(&byte) {
                let seq = CsiSequence {
                    params,
                    final_byte: byte,
                };
                (ParserState::Normal, Some(Action::Csi(seq)))
            } else {
                if params.len() < MAX_CSI_LEN {
                    params.push(byte);
                }
                (ParserState::Csi(params), None)
            }
        }
        ParserState::Osc {
            escape: true,
            payload: _,
        } => {
            if byte == b'\\' {
                (ParserState::Normal, None)
            } else {
                // Not ST: the OSC is over and the ESC starts a new sequence
                step(ParserState::Escape, byte)
            }
        }
        ParserState::Osc {
            mut payload,
            escape: false,
        } => match byte {
            BEL => (ParserState::Normal, None),
            ESC => (
                ParserState::Osc {
                    payload,
                    escape: true,
                },
                None,
            ),
            _ => {
                if payload.len() < MAX_OSC_LEN {
                    payload.push(byte);
                }
                (
                    ParserState::Osc {
                        payload,
                        escape: false,
                    },
                    None,
                )
            }
        },
    }
}

/// Streaming parser bound to a screen buffer at feed time
#[derive(Debug, Default)]
pub struct AnsiParser {
    state: ParserState,
}

impl AnsiParser {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn state(&self) -> &ParserState {
        &self.state
    }

    /// Feed a chunk of shell output
    pub fn feed(&mut self, bytes: &[u8], screen: &mut ScreenBuffer) {
        for &byte in bytes {
            self.advance(byte, screen);
        }
    }

    /// Feed a single byte
    pub fn advance(&mut self, byte: u8, screen: &mut ScreenBuffer) {
        let (next, action) = step(std::mem::take(&mut self.state), byte);
        self.state = next;

        match action {
            Some(Action::Print(b)) => screen.put_byte(b),
            Some(Action::Csi(seq)) => execute_csi(&seq, screen),
            None => {}
        }
    }
}

/// Apply a control sequence to the screen
pub fn execute_csi(seq: &CsiSequence, screen: &mut ScreenBuffer) {
    match seq.final_byte {
        b'm' => execute_sgr(seq, screen),
        b'H' | b'f' => {
            // CUP - Cursor Position
            let row = seq.param_or(0, 1);
            let col = seq.param_or(1, 1);
            screen.cursor_position(row, col);
        }
        b'J' => {
            // ED - only the full-screen form
            if seq.param_or(0, 0) == 2 {
                screen.erase_display();
            }
        }
        b'K' => match seq.param_or(0, 0) {
            0 => screen.erase_line_from_cursor(),
            2 => screen.erase_line(),
            _ => {}
        },
        _ => {
            tracing::debug!(
                "Unknown CSI: params={:?}, final={:?}",
                String::from_utf8_lossy(&seq.params),
                seq.final_byte as char
            );
        }
    }
}

fn execute_sgr(seq: &CsiSequence, screen: &mut ScreenBuffer) {
    let mut codes: Vec<u16> = seq.params().into_iter().map(|p| p.unwrap_or(0)).collect();
    if codes.is_empty() {
        codes.push(0);
    }

    for code in codes {
        match code {
            0 => {
                screen.fg = Color::WHITE;
                screen.bg = Color::BLACK;
            }
            30..=37 => screen.fg = Color::ansi(code - 30),
            39 => screen.fg = Color::WHITE,
            40..=47 => screen.bg = Color::ansi(code - 40),
            49 => screen.bg = Color::BLACK,
            _ => {}
        }
    }
}
