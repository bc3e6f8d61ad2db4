// Container runtime plumbing: the runtime seam, the CLI binding, process supervision.

pub mod engine;
pub mod exec;
pub mod runtime;
pub mod types;

pub use engine::CliRuntime;
pub use runtime::{BuildRequest, ContainerRuntime, Invocation};
pub use types::{CancelToken, ContainerCommand, ExecResult, OutputLine};
