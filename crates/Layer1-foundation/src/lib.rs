//! # styx-foundation
//!
//! Foundation layer for the Styx runner:
//! - Core: the `Runner` / `Execution` / `OutputHandler` traits and the
//!   `Metadata` descriptor the workflow system hands in
//! - Error: the central error type shared by every layer
//!
//! Engine-specific behavior (mount grammar, process supervision, directory
//! allocation) lives in the runner layer; this crate only defines the seams.

pub mod core;
pub mod error;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Core (traits and descriptor types)
// ============================================================================
pub use self::core::{Execution, InputOptions, LogOutputHandler, Metadata, OutputHandler, Runner};
