//! Natural-language to shell command suggestions.
//!
//! - **backend**: invokes the external language-model runtime
//! - **service**: runs requests on worker threads and hands results to the main loop

pub mod backend;
pub mod service;

pub use backend::CommandRuntime;
pub use service::{AiOutcome, AiService};
