//! Keyboard input routing.
//!
//! - **key**: router-level key events and modifiers
//! - **edit**: the locally edited command line
//! - **router**: decides where each key goes (edit buffer, shell, or AI)

pub mod edit;
pub mod key;
pub mod router;

pub use key::{KeyInput, Modifiers, NamedKey};
pub use router::{InputRouter, RouterContext, RouterOutcome};
