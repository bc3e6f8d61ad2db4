// Image builder: stage a build context, invoke the runtime, interpret the result.

pub mod context;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::{info, warn};

use crate::docker::{BuildRequest, CancelToken, ContainerRuntime, Invocation};
use crate::error::{OperationResult, OrchestrationError};
use crate::registry::BuildSpec;

pub use context::StagedContext;

/// A successfully built image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltImage {
    pub tag: String,
    /// Id reported by the runtime, or the tag when it printed none.
    pub image_id: String,
    pub context_dir: PathBuf,
    pub output: String,
}

pub struct Builder {
    runtime: Arc<dyn ContainerRuntime>,
    context_root: PathBuf,
    timeout: Duration,
    /// One lock per tag, held from staging until the runtime build returns.
    tag_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Builder {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        context_root: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            runtime,
            context_root: context_root.into(),
            timeout,
            tag_locks: Mutex::new(HashMap::new()),
        }
    }

    fn tag_lock(&self, tag: &str) -> Arc<Mutex<()>> {
        let mut locks = self.tag_locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(tag.to_string()).or_default().clone()
    }

    pub fn context_root(&self) -> &Path {
        &self.context_root
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn build(&self, spec: &BuildSpec, cancel: &CancelToken) -> OperationResult<BuiltImage> {
        self.build_streaming(spec, cancel, &|_| {})
    }

    /// Like [`build`](Self::build), forwarding runtime output lines to `on_line`.
    pub fn build_streaming(
        &self,
        spec: &BuildSpec,
        cancel: &CancelToken,
        on_line: &dyn Fn(&str),
    ) -> OperationResult<BuiltImage> {
        if cancel.is_cancelled() {
            return Err(OrchestrationError::Cancelled {
                output: String::new(),
            });
        }

        // Builds of one tag share `<root>/<tag>`; the guard lives until the
        // runtime has finished reading it.
        let lock = self.tag_lock(&spec.tag);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        if cancel.is_cancelled() {
            return Err(OrchestrationError::Cancelled {
                output: String::new(),
            });
        }

        let staged = context::materialize(&self.context_root, spec)?;
        info!(tag = %spec.tag, context = %staged.dir.display(), "building image");

        let request = BuildRequest {
            tag: &spec.tag,
            context_dir: &staged.dir,
            dockerfile: &staged.dockerfile,
        };
        let invocation = Invocation {
            cancel,
            timeout: self.timeout,
            on_line,
        };

        let result = match self.runtime.build(&request, &invocation) {
            Ok(r) => r,
            Err(e) => {
                warn!(tag = %spec.tag, error = %format!("{e:#}"), "build could not start");
                return Err(OrchestrationError::BuildFailed {
                    exit_code: None,
                    output: format!("{e:#}"),
                });
            }
        };

        if result.cancelled {
            warn!(tag = %spec.tag, "build cancelled");
            return Err(OrchestrationError::Cancelled { output: result.log });
        }
        if result.timed_out {
            warn!(tag = %spec.tag, timeout_secs = self.timeout.as_secs(), "build timed out");
            return Err(OrchestrationError::BuildTimeout {
                after: self.timeout,
                output: result.log,
            });
        }
        if !result.success() {
            warn!(tag = %spec.tag, exit_code = ?result.exit_code, "build failed");
            return Err(OrchestrationError::BuildFailed {
                exit_code: result.exit_code,
                output: result.log,
            });
        }

        let image_id = result
            .last_stdout_line()
            .map(str::to_string)
            .unwrap_or_else(|| spec.tag.clone());
        info!(tag = %spec.tag, image_id = %image_id, "image built");

        Ok(BuiltImage {
            tag: spec.tag.clone(),
            image_id,
            context_dir: staged.dir,
            output: result.log,
        })
    }
}
