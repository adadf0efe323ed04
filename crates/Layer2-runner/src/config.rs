//! Runner configuration

use crate::engine::MountDialect;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Configuration for a [`ContainerRunner`](crate::ContainerRunner).
///
/// Shared read-only by every execution the runner starts. Maps are ordered so
/// regenerated engine commands stay byte-stable for identical inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Engine binary to invoke
    pub executable: String,

    /// Root directory under which per-execution output directories are created
    pub data_dir: PathBuf,

    /// Extra engine arguments inserted after the subcommand
    pub extra_args: Vec<String>,

    /// Environment variables injected into every container
    pub environment: BTreeMap<String, String>,

    /// Exact-match container image tag overrides
    pub image_overrides: BTreeMap<String, String>,

    /// Mount-argument dialect spoken by the engine
    pub mount_dialect: MountDialect,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            executable: "singularity".to_string(),
            data_dir: PathBuf::from("styx_tmp"),
            extra_args: Vec::new(),
            environment: BTreeMap::new(),
            image_overrides: BTreeMap::new(),
            mount_dialect: MountDialect::default(),
        }
    }
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = executable.into();
        self
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_extra_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    pub fn with_image_override(
        mut self,
        tag: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        self.image_overrides.insert(tag.into(), replacement.into());
        self
    }

    pub fn with_mount_dialect(mut self, dialect: MountDialect) -> Self {
        self.mount_dialect = dialect;
        self
    }
}
