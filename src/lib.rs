//! Build and launch a fixed menu of container workloads through an
//! injected container runtime, keeping track of what was started.

pub mod builder;
pub mod config;
pub mod docker;
pub mod error;
pub mod launcher;
pub mod logging;
pub mod orchestrator;
pub mod registry;

#[cfg(test)]
mod test_support;

pub use builder::{BuiltImage, Builder};
pub use docker::{CancelToken, CliRuntime, ContainerRuntime};
pub use error::{ErrorKind, OperationResult, OrchestrationError};
pub use launcher::{Launcher, RunningContainerRecord};
pub use orchestrator::Orchestrator;
pub use registry::{Registry, WorkloadSpec};
