//! Child process supervision with concurrent stream draining
//!
//! Both output streams are read by their own task while the process runs.
//! Draining them concurrently is what prevents the classic pipe deadlock: a
//! child blocking on a full stderr buffer while the parent reads stdout to
//! completion (or vice versa) would otherwise hang both sides.

use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use styx_foundation::{Error, OutputHandler, Result};

/// A spawned engine process with both output streams being drained.
///
/// `wait` joins the stream readers before reaping the child, so no trailing
/// output is lost. Exit status is reported raw; deciding that a non-zero code
/// is an error is the caller's job.
pub struct SupervisedProcess {
    child: Child,
    stdout_task: JoinHandle<()>,
    stderr_task: JoinHandle<()>,
}

impl SupervisedProcess {
    /// Spawn `argv[0]` with the remaining arguments, wiring both output
    /// streams into `handler` line by line.
    pub fn spawn(argv: &[String], handler: Arc<dyn OutputHandler>) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| Error::config("cannot spawn an empty argument vector"))?;

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // dropping a pending wait (caller-imposed deadline) must not leak
            // the child
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|source| Error::Spawn {
            program: program.clone(),
            source,
        })?;

        let stdout = child.stdout.take().expect("stdout was piped");
        let stderr = child.stderr.take().expect("stderr was piped");

        let stdout_handler = Arc::clone(&handler);
        let stdout_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                stdout_handler.on_stdout_line(&line);
            }
        });

        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                handler.on_stderr_line(&line);
            }
        });

        Ok(Self {
            child,
            stdout_task,
            stderr_task,
        })
    }

    /// OS process id, if the child is still running
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Kill the child. The surface for callers wrapping [`wait`](Self::wait)
    /// with their own deadline.
    pub async fn kill(&mut self) -> Result<()> {
        self.child.kill().await?;
        Ok(())
    }

    /// Wait for both streams to reach end-of-stream, then reap the child and
    /// return its raw exit code (`None` when terminated by a signal).
    pub async fn wait(mut self) -> Result<Option<i32>> {
        let _ = self.stdout_task.await;
        let _ = self.stderr_task.await;

        let status = self.child.wait().await?;
        Ok(status.code())
    }

    /// Spawn and wait in one step
    pub async fn run(argv: &[String], handler: Arc<dyn OutputHandler>) -> Result<Option<i32>> {
        Self::spawn(argv, handler)?.wait().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectingHandler {
        stdout: Mutex<Vec<String>>,
        stderr: Mutex<Vec<String>>,
    }

    impl OutputHandler for CollectingHandler {
        fn on_stdout_line(&self, line: &str) {
            self.stdout.lock().unwrap().push(line.to_string());
        }

        fn on_stderr_line(&self, line: &str) {
            self.stderr.lock().unwrap().push(line.to_string());
        }
    }

    fn shell(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn test_run_success_delivers_lines_in_order() {
        let handler = Arc::new(CollectingHandler::default());
        let code = SupervisedProcess::run(&shell("printf 'a\\nb\\nc\\n'"), handler.clone())
            .await
            .unwrap();

        assert_eq!(code, Some(0));
        assert_eq!(*handler.stdout.lock().unwrap(), ["a", "b", "c"]);
        assert!(handler.stderr.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_reports_raw_exit_code() {
        let handler = Arc::new(CollectingHandler::default());
        let code = SupervisedProcess::run(&shell("exit 17"), handler).await.unwrap();
        assert_eq!(code, Some(17));
    }

    #[tokio::test]
    async fn test_stderr_lines_are_routed_separately() {
        let handler = Arc::new(CollectingHandler::default());
        let code = SupervisedProcess::run(
            &shell("echo out; echo err >&2; echo 'no newline check' >&2"),
            handler.clone(),
        )
        .await
        .unwrap();

        assert_eq!(code, Some(0));
        assert_eq!(*handler.stdout.lock().unwrap(), ["out"]);
        // trailing newlines are stripped
        assert_eq!(
            *handler.stderr.lock().unwrap(),
            ["err", "no newline check"]
        );
    }

    #[tokio::test]
    async fn test_heavy_cross_stream_output_does_not_deadlock() {
        // Each stream writes far beyond the pipe buffer while the other is
        // also full; this hangs unless both streams drain concurrently.
        let handler = Arc::new(CollectingHandler::default());
        let script = "i=0; while [ \"$i\" -lt 20000 ]; do echo \"out $i\"; echo \"err $i\" >&2; i=$((i+1)); done";
        let code = SupervisedProcess::run(&shell(script), handler.clone())
            .await
            .unwrap();

        assert_eq!(code, Some(0));
        let stdout = handler.stdout.lock().unwrap();
        let stderr = handler.stderr.lock().unwrap();
        assert_eq!(stdout.len(), 20000);
        assert_eq!(stderr.len(), 20000);
        assert_eq!(stdout[19999], "out 19999");
        assert_eq!(stderr[19999], "err 19999");
    }

    #[tokio::test]
    async fn test_kill_yields_no_exit_code() {
        let handler = Arc::new(CollectingHandler::default());
        let mut process =
            SupervisedProcess::spawn(&["sleep".to_string(), "30".to_string()], handler).unwrap();
        assert!(process.id().is_some());

        process.kill().await.unwrap();
        let code = process.wait().await.unwrap();
        assert_eq!(code, None);
    }

    #[tokio::test]
    async fn test_spawn_missing_program() {
        let handler = Arc::new(CollectingHandler::default());
        let result =
            SupervisedProcess::spawn(&["styx-no-such-binary".to_string()], handler);
        assert!(matches!(result, Err(Error::Spawn { .. })));
    }

    #[tokio::test]
    async fn test_spawn_empty_argv() {
        let handler = Arc::new(CollectingHandler::default());
        let result = SupervisedProcess::spawn(&[], handler);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
