//! Runner factory
//!
//! The long-lived entry point: resolves the descriptor's container reference
//! against configuration and hands out a fresh, single-use execution context
//! per invocation. Output directories are partitioned by a per-runner random
//! token plus an atomic counter, so concurrent runners sharing one data root
//! never collide.

use crate::config::RunnerConfig;
use crate::execution::ContainerExecution;
use regex::Regex;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use styx_foundation::{Error, Execution, Metadata, Result, Runner};
use tracing::debug;

/// Reference schemes the engine accepts as-is
const KNOWN_SCHEMES: &[&str] = &["docker://", "library://", "oras://", "shub://"];

/// Scheme prepended to bare image tags
const DEFAULT_SCHEME: &str = "docker://";

/// Container-engine implementation of [`Runner`].
pub struct ContainerRunner {
    config: RunnerConfig,
    /// Random hex token fixed for this runner's lifetime
    uid: String,
    execution_counter: AtomicU64,
}

impl ContainerRunner {
    /// Create a new runner.
    ///
    /// Fails with `Config` on Windows, which the supported engines do not
    /// run on.
    pub fn new(config: RunnerConfig) -> Result<Self> {
        if cfg!(windows) {
            return Err(Error::config(
                "the container runner is not supported on Windows",
            ));
        }

        let token: [u8; 8] = rand::random();
        let uid = token.iter().map(|b| format!("{b:02x}")).collect();

        Ok(Self {
            config,
            uid,
            execution_counter: AtomicU64::new(0),
        })
    }

    /// Create a runner with default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(RunnerConfig::default())
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Token distinguishing this runner's output directories from those of
    /// other runners (including past process runs) sharing the data root
    pub fn instance_token(&self) -> &str {
        &self.uid
    }

    /// Probe whether the configured engine binary responds
    pub async fn is_available(&self) -> bool {
        tokio::process::Command::new(&self.config.executable)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Resolve an image tag: exact-match override first, then scheme fixup
    fn resolve_image(&self, tag: &str) -> String {
        let resolved = self
            .config
            .image_overrides
            .get(tag)
            .cloned()
            .unwrap_or_else(|| tag.to_string());

        if KNOWN_SCHEMES.iter().any(|scheme| resolved.starts_with(scheme)) {
            resolved
        } else {
            format!("{DEFAULT_SCHEME}{resolved}")
        }
    }
}

impl Runner for ContainerRunner {
    fn start_execution(&self, metadata: &Metadata) -> Result<Box<dyn Execution>> {
        let tag = metadata.container_image_tag.as_deref().ok_or_else(|| {
            Error::config(format!(
                "No container image tag specified in metadata for '{}'",
                metadata.name
            ))
        })?;
        let image = self.resolve_image(tag);

        let sequence = self.execution_counter.fetch_add(1, Ordering::SeqCst);
        let output_dir = self.config.data_dir.join(format!(
            "{}_{}_{}",
            self.uid,
            sequence,
            filesafe_name(&metadata.name)
        ));
        debug!(
            "Starting execution {} for '{}' in {}",
            sequence,
            metadata.name,
            output_dir.display()
        );

        Ok(Box::new(ContainerExecution::new(output_dir, image, &self.config)))
    }
}

/// Collapse every run of non-word characters to a single underscore
fn filesafe_name(name: &str) -> String {
    static NON_WORD: OnceLock<Regex> = OnceLock::new();
    NON_WORD
        .get_or_init(|| Regex::new(r"\W+").expect("valid pattern"))
        .replace_all(name, "_")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn runner() -> ContainerRunner {
        ContainerRunner::with_defaults().unwrap()
    }

    fn described(tag: Option<&str>) -> Metadata {
        let metadata = Metadata::new("pkg.tool", "tool");
        match tag {
            Some(tag) => metadata.container_image_tag(tag),
            None => metadata,
        }
    }

    #[test]
    fn test_missing_image_tag_is_a_config_error() {
        let result = runner().start_execution(&described(None));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_bare_tag_gets_default_scheme() {
        assert_eq!(
            runner().resolve_image("ubuntu:22.04"),
            "docker://ubuntu:22.04"
        );
    }

    #[test]
    fn test_schemed_references_pass_through() {
        let runner = runner();
        for reference in [
            "docker://ubuntu:22.04",
            "library://sylabs/default/alpine",
            "oras://registry/image:1",
            "shub://repo/image",
        ] {
            assert_eq!(runner.resolve_image(reference), reference);
        }
    }

    #[test]
    fn test_override_is_exact_match_only() {
        let config =
            RunnerConfig::default().with_image_override("fsl:6.0", "mirror.internal/fsl:6.0");
        let runner = ContainerRunner::new(config).unwrap();

        assert_eq!(
            runner.resolve_image("fsl:6.0"),
            "docker://mirror.internal/fsl:6.0"
        );
        // near-misses resolve as plain tags
        assert_eq!(runner.resolve_image("fsl:6.0.1"), "docker://fsl:6.0.1");
    }

    #[test]
    fn test_sequential_starts_yield_distinct_output_dirs() {
        let runner = runner();
        let metadata = described(Some("ubuntu:22.04"));

        let dirs: Vec<PathBuf> = (0..4)
            .map(|_| {
                runner
                    .start_execution(&metadata)
                    .unwrap()
                    .output_file("run.sh", false)
            })
            .collect();

        for (i, a) in dirs.iter().enumerate() {
            for b in &dirs[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_independent_runners_use_independent_tokens() {
        let first = runner();
        let second = runner();
        assert_eq!(first.instance_token().len(), 16);
        assert_ne!(first.instance_token(), second.instance_token());
    }

    #[test]
    fn test_filesafe_name_collapses_non_word_runs() {
        assert_eq!(filesafe_name("bet"), "bet");
        assert_eq!(filesafe_name("my tool/v2!"), "my_tool_v2_");
        assert_eq!(filesafe_name("a -- b"), "a_b");
    }
}
