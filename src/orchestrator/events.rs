use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};

use super::Orchestrator;
use crate::docker::CancelToken;
use crate::error::OperationResult;
use crate::launcher::RunningContainerRecord;

/// Which part of a launch is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Build,
    Run,
    Stop,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Build => "build",
            Stage::Run => "run",
            Stage::Stop => "stop",
        }
    }
}

/// What a background operation was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Launch { workload: String },
    Stop { container_id: String },
}

/// Events emitted while a background operation runs.
#[derive(Debug)]
pub enum LaunchEvent {
    StageStarted(Stage),
    Log { stage: Stage, line: String },
    StageFinished { stage: Stage, success: bool },
    Finished {
        action: Action,
        result: OperationResult<RunningContainerRecord>,
    },
}

/// Launch `name` on a background thread.
///
/// The returned receiver streams progress; the last event is always
/// [`LaunchEvent::Finished`].
pub fn spawn_launch(
    orchestrator: Arc<Orchestrator>,
    name: impl Into<String>,
    cancel: CancelToken,
) -> Receiver<LaunchEvent> {
    let name = name.into();
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let result = orchestrator.launch_observed(&name, &cancel, &|ev| {
            // Receiver may be dropped; ignore send errors.
            let _ = tx.send(ev);
        });
        let _ = tx.send(LaunchEvent::Finished {
            action: Action::Launch { workload: name },
            result,
        });
    });
    rx
}

/// Stop a tracked container on a background thread.
pub fn spawn_stop(
    orchestrator: Arc<Orchestrator>,
    container_id: impl Into<String>,
    cancel: CancelToken,
) -> Receiver<LaunchEvent> {
    let container_id = container_id.into();
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let _ = tx.send(LaunchEvent::StageStarted(Stage::Stop));
        let result = orchestrator.stop(&container_id, &cancel);
        let _ = tx.send(LaunchEvent::StageFinished {
            stage: Stage::Stop,
            success: result.is_ok(),
        });
        let _ = tx.send(LaunchEvent::Finished {
            action: Action::Stop { container_id },
            result,
        });
    });
    rx
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::config::Config;
    use crate::error::ErrorKind;
    use crate::test_support::StubRuntime;

    fn orchestrator(root: &Path) -> Arc<Orchestrator> {
        let cfg = Config {
            context_root: root.to_path_buf(),
            ..Config::default()
        };
        Arc::new(Orchestrator::from_config(&cfg, root, Arc::new(StubRuntime::ok())))
    }

    #[test]
    fn launch_stream_ends_with_finished() {
        let root = tempfile::tempdir().unwrap();
        let events: Vec<_> = spawn_launch(orchestrator(root.path()), "vlc", CancelToken::new())
            .into_iter()
            .collect();

        assert!(matches!(events.first(), Some(LaunchEvent::StageStarted(Stage::Run))));
        match events.last() {
            Some(LaunchEvent::Finished { action, result }) => {
                assert_eq!(action, &Action::Launch { workload: "vlc".into() });
                assert!(result.is_ok());
            }
            other => panic!("expected Finished, got {other:?}"),
        }
    }

    #[test]
    fn unknown_workload_still_finishes() {
        let root = tempfile::tempdir().unwrap();
        let events: Vec<_> = spawn_launch(orchestrator(root.path()), "nope", CancelToken::new())
            .into_iter()
            .collect();

        assert_eq!(events.len(), 1);
        match &events[0] {
            LaunchEvent::Finished { result: Err(e), .. } => {
                assert_eq!(e.kind(), ErrorKind::UnknownWorkload)
            }
            other => panic!("expected failed Finished, got {other:?}"),
        }
    }

    #[test]
    fn stop_stream_reports_outcome() {
        let root = tempfile::tempdir().unwrap();
        let orch = orchestrator(root.path());
        let record = orch.launch_workload("firefox", &CancelToken::new()).unwrap();

        let events: Vec<_> = spawn_stop(orch.clone(), record.container_id.clone(), CancelToken::new())
            .into_iter()
            .collect();

        match events.last() {
            Some(LaunchEvent::Finished {
                action: Action::Stop { container_id },
                result: Ok(stopped),
            }) => {
                assert_eq!(container_id, &record.container_id);
                assert_eq!(stopped, &record);
            }
            other => panic!("expected successful stop, got {other:?}"),
        }
        assert!(orch.list().is_empty());
    }
}
