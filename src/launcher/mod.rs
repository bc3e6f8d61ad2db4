// Container launcher: starts containers, tracks them, tears them down.

mod table;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

use tracing::{info, warn};

use crate::docker::{CancelToken, ContainerRuntime, ExecResult, Invocation};
use crate::error::{OperationResult, OrchestrationError};
use crate::registry::{PortMapping, RunSpec};

pub use table::RunningContainerRecord;
use table::Table;

pub struct Launcher {
    runtime: Arc<dyn ContainerRuntime>,
    run_timeout: Duration,
    stop_timeout: Duration,
    table: Mutex<Table>,
}

impl Launcher {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, run_timeout: Duration, stop_timeout: Duration) -> Self {
        Self {
            runtime,
            run_timeout,
            stop_timeout,
            table: Mutex::new(Table::default()),
        }
    }

    pub fn run(
        &self,
        workload: &str,
        spec: &RunSpec,
        cancel: &CancelToken,
    ) -> OperationResult<RunningContainerRecord> {
        self.run_streaming(workload, spec, cancel, &|_| {})
    }

    /// Start a container for `workload`.
    ///
    /// Host ports are checked and reserved in one critical section, so two
    /// concurrent launches asking for the same port cannot both proceed. The
    /// runtime call itself happens outside the lock.
    pub fn run_streaming(
        &self,
        workload: &str,
        spec: &RunSpec,
        cancel: &CancelToken,
        on_line: &dyn Fn(&str),
    ) -> OperationResult<RunningContainerRecord> {
        let ports: Vec<PortMapping> = spec.ports.iter().copied().collect();
        if let Err(e) = self.lock().claim(workload, &ports) {
            warn!(workload, error = %e, "launch rejected");
            return Err(e);
        }

        info!(workload, image = %spec.image, "starting container");
        match self.start(spec, cancel, on_line) {
            Ok(container_id) => {
                let record = RunningContainerRecord {
                    workload: workload.to_string(),
                    container_id,
                    image: spec.image.clone(),
                    ports,
                    started_at: SystemTime::now(),
                };
                info!(workload, container = %record.short_id(), "container started");
                self.lock().commit(record.clone());
                Ok(record)
            }
            Err(e) => {
                warn!(workload, error = %e, "launch failed");
                self.lock().release(&ports);
                Err(e)
            }
        }
    }

    fn start(&self, spec: &RunSpec, cancel: &CancelToken, on_line: &dyn Fn(&str)) -> OperationResult<String> {
        if cancel.is_cancelled() {
            return Err(OrchestrationError::Cancelled {
                output: String::new(),
            });
        }

        let invocation = Invocation {
            cancel,
            timeout: self.run_timeout,
            on_line,
        };
        let result = self
            .runtime
            .run(spec, &invocation)
            .map_err(|e| OrchestrationError::LaunchFailed {
                reason: "runtime could not be started".into(),
                output: format!("{e:#}"),
            })?;

        check(&result, self.run_timeout, |reason, output| OrchestrationError::LaunchFailed {
            reason,
            output,
        })?;

        // `run -d` prints the full container id as its last line.
        result
            .last_stdout_line()
            .and_then(|line| line.split_whitespace().next())
            .map(str::to_string)
            .ok_or_else(|| OrchestrationError::LaunchFailed {
                reason: "runtime reported no container id".into(),
                output: result.log.clone(),
            })
    }

    /// Stop and remove a tracked container, then forget it.
    ///
    /// When the runtime fails, the record stays so the stop can be retried.
    pub fn stop(&self, container_id: &str, cancel: &CancelToken) -> OperationResult<RunningContainerRecord> {
        if !self.lock().contains(container_id) {
            return Err(OrchestrationError::NotFound {
                container_id: container_id.to_string(),
            });
        }

        info!(container = %table::short(container_id), "stopping container");
        let invocation = Invocation {
            cancel,
            timeout: self.stop_timeout,
            on_line: &|_| {},
        };
        let stop_failed = |reason: String, output: String| OrchestrationError::StopFailed {
            container_id: container_id.to_string(),
            reason,
            output,
        };

        let outcome = self
            .runtime
            .remove(container_id, &invocation)
            .map_err(|e| stop_failed("runtime could not be started".into(), format!("{e:#}")))
            .and_then(|result| check(&result, self.stop_timeout, stop_failed));

        if let Err(e) = outcome {
            warn!(container = %table::short(container_id), error = %e, "stop failed");
            return Err(e);
        }

        let record = self
            .lock()
            .remove(container_id)
            .ok_or_else(|| OrchestrationError::NotFound {
                container_id: container_id.to_string(),
            })?;
        info!(workload = %record.workload, container = %record.short_id(), "container removed");
        Ok(record)
    }

    /// Snapshot of tracked containers, oldest first.
    pub fn list(&self) -> Vec<RunningContainerRecord> {
        self.lock().snapshot()
    }

    // The table is consistent between statements, so a panic elsewhere while
    // holding the lock cannot leave it half-updated.
    fn lock(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Map a finished runtime process onto the operation's failure variant.
fn check(
    result: &ExecResult,
    timeout: Duration,
    fail: impl FnOnce(String, String) -> OrchestrationError,
) -> OperationResult<()> {
    if result.cancelled {
        return Err(OrchestrationError::Cancelled {
            output: result.log.clone(),
        });
    }
    if result.timed_out {
        return Err(fail(
            format!("timed out after {}s", timeout.as_secs()),
            result.log.clone(),
        ));
    }
    if !result.success() {
        let reason = match result.exit_code {
            Some(code) => format!("exit {code}"),
            None => "terminated by signal".to_string(),
        };
        return Err(fail(reason, result.log.clone()));
    }
    Ok(())
}
