//! Core module - descriptor types and runner traits

pub mod traits;
pub mod types;

pub use traits::{Execution, InputOptions, LogOutputHandler, OutputHandler, Runner};
pub use types::Metadata;
