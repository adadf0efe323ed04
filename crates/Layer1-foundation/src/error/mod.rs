//! Error types for the Styx runner
//!
//! All errors are managed centrally. Declaration-time checks fail at the
//! declaring call; run-time failures fail at `run()`. Nothing is swallowed.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Styx runner error type
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // Paths
    // ========================================================================
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // ========================================================================
    // Execution
    // ========================================================================
    #[error(
        "Command failed.\n- Return code: {}\n- Engine args: {}\n- Command args: {}",
        display_return_code(.return_code),
        quote_args(.engine_args),
        quote_args(.command_args)
    )]
    ExecutionFailed {
        /// Raw exit code; `None` when the child was terminated by a signal
        return_code: Option<i32>,
        /// Full engine command line, verbatim
        engine_args: Vec<String>,
        /// Original in-container command, verbatim
        command_args: Vec<String>,
    },

    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    // ========================================================================
    // External conversions
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check whether the error should be shown to the caller as their mistake
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::Config(_) | Error::InvalidPath(_) | Error::NotFound(_)
        )
    }

    /// Configuration error helper
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// Invalid path error helper
    pub fn invalid_path(message: impl Into<String>) -> Self {
        Error::InvalidPath(message.into())
    }

    /// Not found error helper
    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound(message.into())
    }

    /// Execution failure helper
    pub fn execution_failed(
        return_code: Option<i32>,
        engine_args: Vec<String>,
        command_args: Vec<String>,
    ) -> Self {
        Error::ExecutionFailed {
            return_code,
            engine_args,
            command_args,
        }
    }
}

/// Shell-quote an argument vector for display; failure messages must be
/// reproducible by hand
fn quote_args(args: &[String]) -> String {
    shlex::try_join(args.iter().map(String::as_str)).unwrap_or_else(|_| args.join(" "))
}

fn display_return_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}
