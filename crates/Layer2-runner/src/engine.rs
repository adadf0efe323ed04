//! Engine dialect selection
//!
//! Both supported dialects invoke the engine binary the same way
//! (`<executable> exec … <image> <entrypoint> <script>`); they differ in the
//! mount-argument grammar and in the isolation flags passed by default.

use crate::mount::{ColonMountFormatter, CsvMountFormatter, MountFormatter};
use serde::{Deserialize, Serialize};

/// Subcommand used for every invocation
pub const SUBCOMMAND: &str = "exec";

/// Flag carrying the comma-joined `key=value` environment list
pub const ENV_FLAG: &str = "--env";

/// Mount-argument dialect spoken by the engine binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountDialect {
    /// Single `--bind host:container[:ro]` flag
    #[default]
    Bind,
    /// `--mount type=bind,…` key=value flag; the engine's host-filesystem
    /// auto-mounts are suppressed with `--containall`
    Mount,
}

impl MountDialect {
    /// Get the mount formatter for this dialect
    pub fn formatter(&self) -> Box<dyn MountFormatter> {
        match self {
            Self::Bind => Box::new(ColonMountFormatter),
            Self::Mount => Box::new(CsvMountFormatter),
        }
    }

    /// Dialect-fixed flags inserted right after the subcommand
    pub fn base_args(&self) -> &'static [&'static str] {
        match self {
            Self::Bind => &[],
            Self::Mount => &["--containall"],
        }
    }
}
