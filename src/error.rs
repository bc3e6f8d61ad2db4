use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Every way a build, launch or stop can fail.
///
/// Failures are values: the facade hands them back to the caller and never
/// retries on its own. Variants that involve the runtime carry whatever it
/// printed before giving up.
#[derive(Debug, Clone, Error)]
pub enum OrchestrationError {
    #[error("unknown workload `{name}`")]
    UnknownWorkload { name: String },

    #[error("invalid build context entry `{}`: {reason}", .path.display())]
    InvalidContext { path: PathBuf, reason: String },

    #[error("build timed out after {}s", .after.as_secs())]
    BuildTimeout { after: Duration, output: String },

    #[error("build failed ({})", exit_label(.exit_code))]
    BuildFailed {
        exit_code: Option<i32>,
        output: String,
    },

    #[error("host port {port} is already held by {holder}")]
    PortConflict { port: u16, holder: String },

    #[error("launch failed: {reason}")]
    LaunchFailed { reason: String, output: String },

    #[error("no tracked container `{container_id}`")]
    NotFound { container_id: String },

    #[error("failed to stop container `{container_id}`: {reason}")]
    StopFailed {
        container_id: String,
        reason: String,
        output: String,
    },

    #[error("operation cancelled")]
    Cancelled { output: String },
}

pub type OperationResult<T> = std::result::Result<T, OrchestrationError>;

/// Fieldless mirror of [`OrchestrationError`] for matching and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnknownWorkload,
    InvalidContext,
    BuildTimeout,
    BuildFailed,
    PortConflict,
    LaunchFailed,
    NotFound,
    StopFailed,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnknownWorkload => "unknown-workload",
            ErrorKind::InvalidContext => "invalid-context",
            ErrorKind::BuildTimeout => "build-timeout",
            ErrorKind::BuildFailed => "build-failed",
            ErrorKind::PortConflict => "port-conflict",
            ErrorKind::LaunchFailed => "launch-failed",
            ErrorKind::NotFound => "not-found",
            ErrorKind::StopFailed => "stop-failed",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl OrchestrationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownWorkload { .. } => ErrorKind::UnknownWorkload,
            Self::InvalidContext { .. } => ErrorKind::InvalidContext,
            Self::BuildTimeout { .. } => ErrorKind::BuildTimeout,
            Self::BuildFailed { .. } => ErrorKind::BuildFailed,
            Self::PortConflict { .. } => ErrorKind::PortConflict,
            Self::LaunchFailed { .. } => ErrorKind::LaunchFailed,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::StopFailed { .. } => ErrorKind::StopFailed,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Output captured from the runtime, if the failure produced any.
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::BuildTimeout { output, .. }
            | Self::BuildFailed { output, .. }
            | Self::LaunchFailed { output, .. }
            | Self::StopFailed { output, .. }
            | Self::Cancelled { output } => Some(output.as_str()),
            _ => None,
        }
    }

    /// Text to show the user. Never empty: falls back to the error message
    /// when the runtime printed nothing.
    pub fn diagnostic(&self) -> String {
        match self.output() {
            Some(out) if !out.trim().is_empty() => format!("{self}\n{}", out.trim_end()),
            _ => self.to_string(),
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit {c}"),
        None => "no exit status".to_string(),
    }
}
