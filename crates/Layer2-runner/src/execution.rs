//! Per-invocation execution context
//!
//! The context is a plain owned accumulation object: the caller declares
//! input files and receives in-container paths back before any process
//! exists, then `run` turns the accumulated mounts plus the requested command
//! into one engine invocation. Declarations and run are a single-writer
//! sequence, so no locking is involved; `run` consumes the context, making it
//! single-use by construction.

use crate::config::RunnerConfig;
use crate::engine::{self, MountDialect};
use crate::mount::Mount;
use crate::process::SupervisedProcess;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use styx_foundation::{Error, Execution, InputOptions, OutputHandler, Result};
use tokio::fs;
use tracing::debug;

/// Root under which every declared input is mounted
pub const INPUT_ROOT: &str = "/styx_input";

/// In-container mount point of the execution's output directory
pub const OUTPUT_ROOT: &str = "/styx_output";

/// Name of the generated run script inside the output directory
pub const RUN_SCRIPT_NAME: &str = "run.sh";

const ENTRYPOINT: &str = "/bin/bash";

/// Execution context for one logical command.
///
/// Created by [`ContainerRunner::start_execution`](crate::ContainerRunner);
/// see the [`Execution`] trait for the caller-facing contract.
pub struct ContainerExecution {
    output_dir: PathBuf,
    container_image: String,
    executable: String,
    extra_args: Vec<String>,
    environment: BTreeMap<String, String>,
    mount_dialect: MountDialect,
    mounts: Vec<Mount>,
    next_mount_id: u32,
}

impl ContainerExecution {
    pub(crate) fn new(output_dir: PathBuf, container_image: String, config: &RunnerConfig) -> Self {
        Self {
            output_dir,
            container_image,
            executable: config.executable.clone(),
            extra_args: config.extra_args.clone(),
            environment: config.environment.clone(),
            mount_dialect: config.mount_dialect,
            mounts: Vec::new(),
            next_mount_id: 0,
        }
    }

    /// Host directory this execution writes into
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Mounts declared so far, in declaration order
    pub fn mounts(&self) -> &[Mount] {
        &self.mounts
    }

    /// Register a host input and return its in-container path.
    ///
    /// With `resolve_parent`, the parent directory is mounted instead of the
    /// file so the tool can reach undeclared siblings; the returned path
    /// still points at the file itself.
    pub fn input_file(&mut self, host_file: &Path, options: InputOptions) -> Result<String> {
        let file_name = file_name_str(host_file)?;

        if options.resolve_parent {
            let parent = host_file
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .ok_or_else(|| {
                    Error::invalid_path(format!(
                        "'{}' has no parent directory to mount",
                        host_file.display()
                    ))
                })?;
            if !parent.is_dir() {
                return Err(Error::not_found(format!(
                    "Parent directory of input file '{}' does not exist",
                    host_file.display()
                )));
            }
            let parent_name = file_name_str(parent)?;

            let id = self.next_id();
            let mount_point = format!("{INPUT_ROOT}/{id}/{parent_name}");
            self.mounts.push(Mount {
                host_path: absolute_path(parent)?,
                container_path: mount_point.clone(),
                writable: options.mutable,
                sequence_id: id,
            });
            Ok(format!("{mount_point}/{file_name}"))
        } else {
            if !host_file.exists() {
                return Err(Error::not_found(format!(
                    "Input file '{}' does not exist",
                    host_file.display()
                )));
            }

            let id = self.next_id();
            let container_path = format!("{INPUT_ROOT}/{id}/{file_name}");
            self.mounts.push(Mount {
                host_path: absolute_path(host_file)?,
                container_path: container_path.clone(),
                writable: options.mutable,
                sequence_id: id,
            });
            Ok(container_path)
        }
    }

    /// Resolve an output location against the output directory. Pure join;
    /// `optional` is reserved metadata with no effect.
    pub fn output_file(&self, local_file: &str, _optional: bool) -> PathBuf {
        self.output_dir.join(local_file)
    }

    /// Run `cargs` inside the container, draining output through `handler`.
    ///
    /// The generated `run.sh` is left in the output directory even on
    /// failure, as a post-mortem record of exactly what ran.
    pub async fn run_with_handler(
        mut self,
        cargs: &[String],
        handler: Arc<dyn OutputHandler>,
    ) -> Result<()> {
        fs::create_dir_all(&self.output_dir).await?;

        let script = Self::render_script(cargs)?;
        fs::write(self.output_dir.join(RUN_SCRIPT_NAME), script).await?;

        self.mount_output_dir()?;
        let engine_args = self.engine_args()?;

        debug!("Running engine: {}", quoted(&engine_args));
        debug!("Running command: {}", quoted(cargs));

        let return_code = SupervisedProcess::spawn(&engine_args, handler)?.wait().await?;
        match return_code {
            Some(0) => Ok(()),
            code => Err(Error::execution_failed(code, engine_args, cargs.to_vec())),
        }
    }

    /// Render the script that runs as the container entrypoint: shebang, a
    /// `cd` into the output mount point, then the shell-escaped command.
    /// UTF-8, `\n` line endings.
    fn render_script(cargs: &[String]) -> Result<String> {
        let command = shlex::try_join(cargs.iter().map(String::as_str))
            .map_err(|_| Error::invalid_path("command contains a NUL byte"))?;
        Ok(format!("#!/bin/bash\ncd {OUTPUT_ROOT}\n{command}\n"))
    }

    /// Append the output directory as the final, writable mount
    fn mount_output_dir(&mut self) -> Result<()> {
        let id = self.next_id();
        self.mounts.push(Mount {
            host_path: absolute_path(&self.output_dir)?,
            container_path: OUTPUT_ROOT.to_string(),
            writable: true,
            sequence_id: id,
        });
        Ok(())
    }

    /// Assemble the full engine argument vector: executable, subcommand,
    /// dialect flags, extra args, mounts in declaration order, environment
    /// injection, image, entrypoint, script.
    fn engine_args(&self) -> Result<Vec<String>> {
        let formatter = self.mount_dialect.formatter();

        let mut args = Vec::with_capacity(self.mounts.len() * 2 + self.extra_args.len() + 8);
        args.push(self.executable.clone());
        args.push(engine::SUBCOMMAND.to_string());
        args.extend(self.mount_dialect.base_args().iter().map(|s| s.to_string()));
        args.extend(self.extra_args.iter().cloned());

        for mount in &self.mounts {
            let host_path = mount.host_path.to_str().ok_or_else(|| {
                Error::invalid_path(format!(
                    "'{}' is not valid UTF-8",
                    mount.host_path.display()
                ))
            })?;
            args.push(formatter.flag().to_string());
            args.push(formatter.format(host_path, &mount.container_path, mount.writable)?);
        }

        if !self.environment.is_empty() {
            let joined = self
                .environment
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect::<Vec<_>>()
                .join(",");
            args.push(engine::ENV_FLAG.to_string());
            args.push(joined);
        }

        args.push(self.container_image.clone());
        args.push(ENTRYPOINT.to_string());
        args.push(format!("{OUTPUT_ROOT}/{RUN_SCRIPT_NAME}"));
        Ok(args)
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_mount_id;
        self.next_mount_id += 1;
        id
    }
}

#[async_trait]
impl Execution for ContainerExecution {
    fn input_file(&mut self, host_file: &Path, options: InputOptions) -> Result<String> {
        ContainerExecution::input_file(self, host_file, options)
    }

    fn output_file(&self, local_file: &str, optional: bool) -> PathBuf {
        ContainerExecution::output_file(self, local_file, optional)
    }

    async fn run_with_handler(
        self: Box<Self>,
        cargs: &[String],
        handler: Arc<dyn OutputHandler>,
    ) -> Result<()> {
        (*self).run_with_handler(cargs, handler).await
    }
}

fn file_name_str(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            Error::invalid_path(format!("'{}' has no usable file name", path.display()))
        })
}

/// Absolute form of `path` without resolving symlinks; mount specs must not
/// depend on the process's working directory at spawn time
fn absolute_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn quoted(args: &[String]) -> String {
    shlex::try_join(args.iter().map(String::as_str)).unwrap_or_else(|_| args.join(" "))
}
