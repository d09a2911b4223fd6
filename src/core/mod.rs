//! Core terminal emulation components.
//!
//! This module contains the low-level terminal emulation logic:
//!
//! - **pty**: pseudo-terminal wrapper around the user's shell
//! - **term**: screen buffer and ANSI escape sequence parser
//! - **session**: PTY + parser + screen owned by the main loop
//!
//! # Architecture
//!
//! ```text
//! Session
//! ├── PtySession (shell I/O, reader thread)
//! ├── AnsiParser (Normal / Escape / Csi / Osc)
//! └── ScreenBuffer
//!     ├── rows (ring of fixed-width rows)
//!     ├── cursor
//!     └── current fg / bg
//! ```

pub mod pty;
pub mod session;
pub mod term;
