//! Core Traits - interfaces implemented by engine runners
//!
//! The workflow system talks to these traits only; the container engine
//! behind them is interchangeable.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │  Workflow system (caller)                              │
//! │      │ start_execution(metadata)                       │
//! │      ▼                                                 │
//! │  Runner ──► Execution (single-use)                     │
//! │      input_file / output_file / run                    │
//! │      │                                                 │
//! │      ▼                                                 │
//! │  OutputHandler (line callbacks, default: tracing)      │
//! └────────────────────────────────────────────────────────┘
//! ```

use crate::core::types::Metadata;
use crate::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

// ============================================================================
// OutputHandler - per-stream line callbacks
// ============================================================================

/// Receives child process output one line at a time.
///
/// Lines arrive with the trailing newline stripped, in producer order within
/// each stream. No ordering is guaranteed between the two streams.
pub trait OutputHandler: Send + Sync {
    /// Called once per line written to standard output
    fn on_stdout_line(&self, line: &str);

    /// Called once per line written to standard error
    fn on_stderr_line(&self, line: &str);
}

/// Default handler - forwards output to structured logging in real time
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOutputHandler;

impl OutputHandler for LogOutputHandler {
    fn on_stdout_line(&self, line: &str) {
        info!("{line}");
    }

    fn on_stderr_line(&self, line: &str) {
        error!("{line}");
    }
}

// ============================================================================
// Execution - per-invocation context
// ============================================================================

/// Options for declaring an input file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputOptions {
    /// Mount the parent directory instead of the file itself, so the tool can
    /// reach undeclared sibling files (e.g. an index next to a data file)
    pub resolve_parent: bool,
    /// Mount writable instead of read-only
    pub mutable: bool,
}

impl InputOptions {
    pub fn resolve_parent(mut self) -> Self {
        self.resolve_parent = true;
        self
    }

    pub fn mutable(mut self) -> Self {
        self.mutable = true;
        self
    }
}

/// A single logical invocation: declare files first, then run.
///
/// Declarations return in-container paths up front so the caller can build
/// its command line before anything is mounted. `run` consumes the execution;
/// contexts are single-use by construction.
#[async_trait]
pub trait Execution: Send {
    /// Register a host input and return the path it will be visible at
    /// inside the container.
    ///
    /// Fails with `NotFound` when the file (or, with `resolve_parent`, its
    /// parent directory) does not exist on the host.
    fn input_file(&mut self, host_file: &Path, options: InputOptions) -> Result<String>;

    /// Resolve an output location relative to this execution's output
    /// directory. Pure path join; no filesystem access.
    ///
    /// `optional` is reserved metadata for the caller and has no effect here.
    fn output_file(&self, local_file: &str, optional: bool) -> PathBuf;

    /// Run the command inside the container, draining output through
    /// `handler`. Fails with `ExecutionFailed` on a non-zero or absent exit
    /// code.
    async fn run_with_handler(
        self: Box<Self>,
        cargs: &[String],
        handler: Arc<dyn OutputHandler>,
    ) -> Result<()>;

    /// Run with the default logging handler
    async fn run(self: Box<Self>, cargs: &[String]) -> Result<()> {
        self.run_with_handler(cargs, Arc::new(LogOutputHandler))
            .await
    }
}

// ============================================================================
// Runner - execution factory
// ============================================================================

/// Runner trait - implement to add a new container engine backend
pub trait Runner: Send + Sync {
    /// Start a fresh execution for the described command.
    ///
    /// Fails with `Config` when the descriptor names no container image.
    fn start_execution(&self, metadata: &Metadata) -> Result<Box<dyn Execution>>;
}
