//! User interface rendering and input handling.
//!
//! - **renderer**: Draws the screen buffer and the blinking cursor
//! - **keymapper**: Keyboard events to router key inputs

pub mod keymapper;
pub mod renderer;

pub use keymapper::KeyMapper;
pub use renderer::{CursorBlink, Renderer};
