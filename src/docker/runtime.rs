use std::path::Path;
use std::time::Duration;

use anyhow::Result;

use super::types::{CancelToken, ExecResult};
use crate::registry::RunSpec;

/// Per-call controls handed to the runtime.
pub struct Invocation<'a> {
    pub cancel: &'a CancelToken,
    pub timeout: Duration,
    /// Receives each output line as the runtime prints it.
    pub on_line: &'a dyn Fn(&str),
}

/// A materialized build context ready for the runtime.
#[derive(Debug, Clone, Copy)]
pub struct BuildRequest<'a> {
    pub tag: &'a str,
    pub context_dir: &'a Path,
    pub dockerfile: &'a Path,
}

/// The external system that builds images and runs containers.
///
/// Implementations block until the operation finishes, times out or is
/// cancelled. `Err` means the operation could not be started at all; a
/// process that ran and failed is reported through [`ExecResult`].
pub trait ContainerRuntime: Send + Sync {
    fn build(&self, request: &BuildRequest<'_>, invocation: &Invocation<'_>) -> Result<ExecResult>;

    fn run(&self, spec: &RunSpec, invocation: &Invocation<'_>) -> Result<ExecResult>;

    /// Stop and remove a container.
    fn remove(&self, container_id: &str, invocation: &Invocation<'_>) -> Result<ExecResult>;
}
