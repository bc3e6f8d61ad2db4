use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Cooperative cancellation token backed by an `AtomicBool`.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// One invocation of the container CLI.
#[derive(Debug, Clone)]
pub struct ContainerCommand {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

/// What the external process left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// stdout and stderr interleaved in arrival order.
    pub log: String,
    pub cancelled: bool,
    pub timed_out: bool,
}

impl ExecResult {
    /// A process that ran to completion with the given status.
    pub fn exited(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        let stdout = stdout.into();
        let stderr = stderr.into();
        let log = format!("{stdout}{stderr}");
        Self {
            exit_code: Some(code),
            stdout,
            stderr,
            log,
            cancelled: false,
            timed_out: false,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0) && !self.cancelled && !self.timed_out
    }

    /// Last non-empty stdout line, trimmed. CLIs print the id they created there.
    pub fn last_stdout_line(&self) -> Option<&str> {
        self.stdout
            .lines()
            .map(str::trim)
            .rev()
            .find(|l| !l.is_empty())
    }
}

/// Streamed output from a running process.
#[derive(Debug)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
    Done(ExecResult),
}
