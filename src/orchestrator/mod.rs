// Orchestration facade: one call per workload, build then run.

mod events;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::builder::Builder;
use crate::config::Config;
use crate::docker::{CancelToken, ContainerRuntime};
use crate::error::OperationResult;
use crate::launcher::{Launcher, RunningContainerRecord};
use crate::registry::Registry;

pub use events::{Action, LaunchEvent, Stage, spawn_launch, spawn_stop};

pub struct Orchestrator {
    registry: Registry,
    builder: Builder,
    launcher: Launcher,
}

impl Orchestrator {
    pub fn new(registry: Registry, builder: Builder, launcher: Launcher) -> Self {
        Self {
            registry,
            builder,
            launcher,
        }
    }

    /// Wire the builtin registry to `runtime` using the configured timeouts.
    /// Relative paths in `cfg` resolve against `cwd`.
    pub fn from_config(cfg: &Config, cwd: &Path, runtime: Arc<dyn ContainerRuntime>) -> Self {
        let builder = Builder::new(
            runtime.clone(),
            cfg.context_root(cwd),
            Duration::from_secs(cfg.build_timeout),
        );
        let launcher = Launcher::new(
            runtime,
            Duration::from_secs(cfg.run_timeout),
            Duration::from_secs(cfg.stop_timeout),
        );
        Self::new(Registry::builtin(), builder, launcher)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn launch_workload(
        &self,
        name: &str,
        cancel: &CancelToken,
    ) -> OperationResult<RunningContainerRecord> {
        self.launch_observed(name, cancel, &|_| {})
    }

    /// Build (when the workload has a build step) and then run `name`.
    ///
    /// The first failure is returned unchanged and later stages are skipped.
    /// An image that built fine stays in place if the launch then fails.
    #[instrument(skip(self, cancel, observer))]
    pub fn launch_observed(
        &self,
        name: &str,
        cancel: &CancelToken,
        observer: &dyn Fn(LaunchEvent),
    ) -> OperationResult<RunningContainerRecord> {
        let workload = self.registry.lookup(name)?;

        if let Some(build) = &workload.build {
            observer(LaunchEvent::StageStarted(Stage::Build));
            let built = self.builder.build_streaming(build, cancel, &|line| {
                observer(LaunchEvent::Log {
                    stage: Stage::Build,
                    line: line.to_string(),
                })
            });
            observer(LaunchEvent::StageFinished {
                stage: Stage::Build,
                success: built.is_ok(),
            });
            let built = built?;
            info!(image_id = %built.image_id, "build stage done");
        }

        observer(LaunchEvent::StageStarted(Stage::Run));
        let launched = self
            .launcher
            .run_streaming(workload.name, &workload.run, cancel, &|line| {
                observer(LaunchEvent::Log {
                    stage: Stage::Run,
                    line: line.to_string(),
                })
            });
        observer(LaunchEvent::StageFinished {
            stage: Stage::Run,
            success: launched.is_ok(),
        });

        match &launched {
            Ok(record) => info!(container = %record.short_id(), "workload running"),
            Err(e) => warn!(error = %e, "workload did not start"),
        }
        launched
    }

    pub fn stop(
        &self,
        container_id: &str,
        cancel: &CancelToken,
    ) -> OperationResult<RunningContainerRecord> {
        self.launcher.stop(container_id, cancel)
    }

    pub fn list(&self) -> Vec<RunningContainerRecord> {
        self.launcher.list()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Barrier, Mutex};

    use super::*;
    use crate::error::{ErrorKind, OrchestrationError};
    use crate::test_support::StubRuntime;

    fn orchestrator(stub: Arc<StubRuntime>, root: &Path) -> Orchestrator {
        let cfg = Config {
            context_root: root.to_path_buf(),
            ..Config::default()
        };
        Orchestrator::from_config(&cfg, root, stub)
    }

    #[test]
    fn apache_end_to_end_success() {
        let root = tempfile::tempdir().unwrap();
        let stub = Arc::new(StubRuntime::ok());
        let orch = orchestrator(stub.clone(), root.path());

        let record = orch.launch_workload("apache", &CancelToken::new()).unwrap();

        assert!(!record.container_id.is_empty());
        assert_eq!(record.workload, "apache");
        assert_eq!(record.image, "my-apache");
        assert_eq!((stub.builds(), stub.runs()), (1, 1));
        assert_eq!(orch.list(), [record]);
    }

    #[test]
    fn build_failure_short_circuits_before_run() {
        let root = tempfile::tempdir().unwrap();
        let stub = Arc::new(StubRuntime::failing_build(2, "COPY failed: no source files\n"));
        let orch = orchestrator(stub.clone(), root.path());

        let err = orch.launch_workload("apache", &CancelToken::new()).unwrap_err();

        match &err {
            OrchestrationError::BuildFailed { exit_code, output } => {
                assert_eq!(*exit_code, Some(2));
                assert!(output.contains("COPY failed"));
            }
            other => panic!("expected BuildFailed, got {other:?}"),
        }
        assert_eq!(stub.runs(), 0);
        assert!(orch.list().is_empty());
    }

    #[test]
    fn remote_image_skips_build() {
        let root = tempfile::tempdir().unwrap();
        let stub = Arc::new(StubRuntime::ok());
        let orch = orchestrator(stub.clone(), root.path());

        let record = orch.launch_workload("firefox", &CancelToken::new()).unwrap();
        assert_eq!(record.image, "jlesage/firefox");
        assert_eq!((stub.builds(), stub.runs()), (0, 1));
    }

    #[test]
    fn unknown_workload_touches_nothing() {
        let root = tempfile::tempdir().unwrap();
        let stub = Arc::new(StubRuntime::ok());
        let orch = orchestrator(stub.clone(), root.path());

        let err = orch.launch_workload("jenkins", &CancelToken::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownWorkload);
        assert_eq!((stub.builds(), stub.runs()), (0, 0));
    }

    #[test]
    fn launch_failure_after_build_keeps_image_and_reports_launch_error() {
        let root = tempfile::tempdir().unwrap();
        let stub = Arc::new(StubRuntime::failing_run(125, "Conflict. The container name \"/apache-server\" is already in use\n"));
        let orch = orchestrator(stub.clone(), root.path());

        let err = orch.launch_workload("apache", &CancelToken::new()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::LaunchFailed);
        assert!(err.diagnostic().contains("already in use"));
        assert_eq!(stub.builds(), 1);
        assert_eq!(stub.removes(), 0, "built image must not be rolled back");
        assert!(root.path().join("my-apache").join("Dockerfile").exists());
    }

    #[test]
    fn second_launch_of_same_workload_conflicts_on_port() {
        let root = tempfile::tempdir().unwrap();
        let orch = orchestrator(Arc::new(StubRuntime::ok()), root.path());
        orch.launch_workload("flask-api", &CancelToken::new()).unwrap();

        let err = orch.launch_workload("flask-api", &CancelToken::new()).unwrap_err();
        assert!(matches!(err, OrchestrationError::PortConflict { port: 5000, .. }));
    }

    #[test]
    fn concurrent_launches_of_apache_conflict_on_port() {
        for _ in 0..20 {
            let root = tempfile::tempdir().unwrap();
            let stub = Arc::new(StubRuntime {
                build_delay: Duration::from_millis(5),
                ..StubRuntime::default()
            });
            let orch = orchestrator(stub.clone(), root.path());
            let barrier = Barrier::new(2);

            let results: Vec<_> = std::thread::scope(|s| {
                let handles: Vec<_> = (0..2)
                    .map(|_| {
                        s.spawn(|| {
                            barrier.wait();
                            orch.launch_workload("apache", &CancelToken::new())
                        })
                    })
                    .collect();
                handles.into_iter().map(|h| h.join().unwrap()).collect()
            });

            let ok = results.iter().filter(|r| r.is_ok()).count();
            let conflicts = results
                .iter()
                .filter(|r| matches!(r, Err(OrchestrationError::PortConflict { port: 8080, .. })))
                .count();
            assert_eq!((ok, conflicts), (1, 1), "unexpected outcomes: {results:?}");
            assert_eq!(stub.max_parallel_builds(), 1);
        }
    }

    #[test]
    fn concurrent_dind_builds_take_turns_on_the_context() {
        let root = tempfile::tempdir().unwrap();
        let stub = Arc::new(StubRuntime {
            build_delay: Duration::from_millis(150),
            ..StubRuntime::default()
        });
        let orch = orchestrator(stub.clone(), root.path());

        let results: Vec<_> = std::thread::scope(|s| {
            let first = s.spawn(|| orch.launch_workload("dind", &CancelToken::new()));
            std::thread::sleep(Duration::from_millis(50));
            let second = s.spawn(|| orch.launch_workload("dind", &CancelToken::new()));
            vec![first.join().unwrap(), second.join().unwrap()]
        });

        assert!(results.iter().all(Result::is_ok), "{results:?}");
        assert_eq!(stub.builds(), 2);
        assert_eq!(stub.max_parallel_builds(), 1);
        assert_eq!(stub.seen_dockerfiles.lock().unwrap().len(), 2);
        assert_eq!(orch.list().len(), 2);
        assert!(root.path().join("docker-dind").join("Dockerfile").exists());
    }

    #[test]
    fn stop_then_list_no_longer_contains_container() {
        let root = tempfile::tempdir().unwrap();
        let orch = orchestrator(Arc::new(StubRuntime::ok()), root.path());
        let vlc = orch.launch_workload("vlc", &CancelToken::new()).unwrap();
        let firefox = orch.launch_workload("firefox", &CancelToken::new()).unwrap();

        orch.stop(&vlc.container_id, &CancelToken::new()).unwrap();

        assert_eq!(orch.list(), [firefox]);
    }

    #[test]
    fn observer_sees_stages_in_order() {
        let root = tempfile::tempdir().unwrap();
        let orch = orchestrator(Arc::new(StubRuntime::ok()), root.path());
        let events = Mutex::new(Vec::new());

        orch.launch_observed("dind", &CancelToken::new(), &|ev| {
            events.lock().unwrap().push(ev)
        })
        .unwrap();

        let events = events.into_inner().unwrap();
        let stages: Vec<_> = events
            .iter()
            .filter_map(|ev| match ev {
                LaunchEvent::StageStarted(s) => Some(format!("start:{}", s.as_str())),
                LaunchEvent::StageFinished { stage, success } => {
                    Some(format!("end:{}:{success}", stage.as_str()))
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            stages,
            ["start:build", "end:build:true", "start:run", "end:run:true"]
        );
        assert!(events.iter().any(|ev| matches!(ev, LaunchEvent::Log { stage: Stage::Build, .. })));
    }
}
