//! # styx-runner
//!
//! Container-engine execution backend for Styx workflows. Translates a
//! logical command (program arguments plus declared input/output files)
//! into a concrete engine invocation, supervises the child process, and
//! reports failures as typed errors.
//!
//! ## Features
//!
//! - Two-phase declare-then-run execution contexts (in-container paths are
//!   known before anything is mounted)
//! - Two bind-mount dialects behind one formatter interface
//! - Concurrent stdout/stderr draining with per-line callbacks
//! - Per-invocation output directories with an inspectable `run.sh`
//!
//! ## Usage
//!
//! ```ignore
//! use styx_foundation::{InputOptions, Metadata, Runner};
//! use styx_runner::{ContainerRunner, RunnerConfig};
//!
//! let runner = ContainerRunner::new(RunnerConfig::default())?;
//! let metadata = Metadata::new("fsl.bet", "bet").container_image_tag("brainlife/fsl:6.0.4");
//!
//! let mut execution = runner.start_execution(&metadata)?;
//! let input = execution.input_file(host_path, InputOptions::default())?;
//! let output = execution.output_file("brain.nii.gz", false);
//! execution.run(&["bet".into(), input, "brain.nii.gz".into()]).await?;
//! ```

pub mod config;
pub mod engine;
pub mod execution;
pub mod mount;
pub mod process;
pub mod runner;

// Runner surface
pub use config::RunnerConfig;
pub use engine::MountDialect;
pub use runner::ContainerRunner;

// Execution internals, exposed for callers supervising processes themselves
pub use execution::{ContainerExecution, INPUT_ROOT, OUTPUT_ROOT, RUN_SCRIPT_NAME};
pub use mount::{ColonMountFormatter, CsvMountFormatter, Mount, MountFormatter};
pub use process::SupervisedProcess;

// Re-exported so downstream crates need only one dependency
pub use styx_foundation::{
    Error, Execution, InputOptions, LogOutputHandler, Metadata, OutputHandler, Result, Runner,
};
