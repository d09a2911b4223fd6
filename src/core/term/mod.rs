//! Screen buffer and ANSI stream parser.

pub mod parser;
pub mod state;

pub use parser::AnsiParser;
pub use state::{Color, ScreenBuffer};
