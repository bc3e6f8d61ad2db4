use std::sync::mpsc::TryRecvError;

use dockmenu::orchestrator::{self, Action, LaunchEvent};
use dockmenu::{CancelToken, ErrorKind};
use tracing::warn;

use super::state::{App, Status, Task};

impl App {
    /// Launch the selected workload in the background.
    pub fn start_launch(&mut self) {
        if self.busy() {
            return;
        }
        let Some(name) = self.selected_workload() else {
            return;
        };
        let cancel = CancelToken::new();
        let rx = orchestrator::spawn_launch(self.orchestrator.clone(), name, cancel.clone());
        self.begin(format!("Launching {name}"), rx, cancel);
    }

    /// Stop the selected container in the background.
    pub fn start_stop(&mut self) {
        if self.busy() {
            return;
        }
        let Some(record) = self.selected_container() else {
            return;
        };
        let label = format!("Stopping {} ({})", record.workload, record.short_id());
        let cancel = CancelToken::new();
        let rx = orchestrator::spawn_stop(
            self.orchestrator.clone(),
            record.container_id.clone(),
            cancel.clone(),
        );
        self.begin(label, rx, cancel);
    }

    pub fn cancel_task(&mut self) {
        if let Some(task) = &self.task {
            task.cancel.cancel();
            self.status = Status::Busy(format!("{}: cancelling", task.label));
        }
    }

    fn begin(
        &mut self,
        label: String,
        rx: std::sync::mpsc::Receiver<LaunchEvent>,
        cancel: CancelToken,
    ) {
        self.live_log.clear();
        self.output_scroll = 0;
        self.status = Status::Busy(label.clone());
        self.task = Some(Task { label, rx, cancel });
    }

    /// Drain pending task events without blocking.
    pub fn drain_events(&mut self) {
        let mut finished = None;
        let mut lost = false;
        if let Some(task) = &self.task {
            loop {
                let ev = match task.rx.try_recv() {
                    Ok(ev) => ev,
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        lost = true;
                        break;
                    }
                };
                match ev {
                    LaunchEvent::StageStarted(stage) => {
                        self.live_log
                            .push_str(&format!("── {} ──\n", stage.as_str()));
                        self.status = Status::Busy(format!("{}: {}", task.label, stage.as_str()));
                    }
                    LaunchEvent::Log { line, .. } => {
                        self.live_log.push_str(&line);
                        self.live_log.push('\n');
                    }
                    LaunchEvent::StageFinished { .. } => {}
                    LaunchEvent::Finished { action, result } => {
                        finished = Some((action, result));
                        break;
                    }
                }
            }
        }

        if lost && finished.is_none() {
            // Worker went away without reporting a result.
            if let Some(task) = self.task.take() {
                warn!(task = %task.label, "background operation ended without a result");
                self.status = Status::Failure {
                    kind: ErrorKind::Cancelled,
                    message: format!("{}: worker exited without a result", task.label),
                };
            }
            self.refresh_containers();
            return;
        }
        let Some((action, result)) = finished else {
            return;
        };
        self.task = None;
        self.status = match (&action, &result) {
            (Action::Launch { workload }, Ok(record)) => {
                Status::Success(format!("{workload} running as {}", record.short_id()))
            }
            (Action::Stop { .. }, Ok(record)) => Status::Success(format!(
                "{} ({}) stopped and removed",
                record.workload,
                record.short_id()
            )),
            (_, Err(e)) => {
                self.live_log.push_str(&e.diagnostic());
                self.live_log.push('\n');
                Status::Failure {
                    kind: e.kind(),
                    message: e.to_string(),
                }
            }
        };
        self.refresh_containers();
    }
}
