use std::sync::Arc;
use std::sync::mpsc::Receiver;

use dockmenu::orchestrator::{LaunchEvent, Orchestrator};
use dockmenu::registry::WorkloadSpec;
use dockmenu::{CancelToken, ErrorKind, RunningContainerRecord};

/// Which panel currently has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Workloads,
    Containers,
    Output,
}

impl Panel {
    pub const ALL: [Panel; 3] = [Panel::Workloads, Panel::Containers, Panel::Output];

    pub fn index(self) -> usize {
        match self {
            Panel::Workloads => 0,
            Panel::Containers => 1,
            Panel::Output => 2,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    pub fn next(self) -> Self {
        let i = (self.index() + 1) % Self::ALL.len();
        Self::ALL[i]
    }

    pub fn prev(self) -> Self {
        let i = (self.index() + Self::ALL.len() - 1) % Self::ALL.len();
        Self::ALL[i]
    }
}

/// The line shown under the panels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Idle(String),
    Busy(String),
    Success(String),
    Failure { kind: ErrorKind, message: String },
}

/// A background operation and its event stream.
pub struct Task {
    pub label: String,
    pub rx: Receiver<LaunchEvent>,
    pub cancel: CancelToken,
}

/// Top-level application state.
pub struct App {
    pub running: bool,
    pub focused_panel: Panel,
    pub show_help: bool,

    pub workload_index: usize,
    pub container_index: usize,
    /// Scroll offset for the output panel.
    pub output_scroll: u16,

    pub orchestrator: Arc<Orchestrator>,
    /// Last snapshot of the launcher's records.
    pub containers: Vec<RunningContainerRecord>,
    /// Output of the current (or last) operation.
    pub live_log: String,
    pub status: Status,
    pub task: Option<Task>,
}

impl App {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            running: true,
            focused_panel: Panel::Workloads,
            show_help: false,
            workload_index: 0,
            container_index: 0,
            output_scroll: 0,
            orchestrator,
            containers: Vec::new(),
            live_log: String::new(),
            status: Status::Idle("Select a workload and press Enter".into()),
            task: None,
        }
    }

    pub fn busy(&self) -> bool {
        self.task.is_some()
    }

    pub fn workloads(&self) -> Vec<&WorkloadSpec> {
        self.orchestrator.registry().iter().collect()
    }

    pub fn selected_workload(&self) -> Option<&'static str> {
        self.orchestrator
            .registry()
            .iter()
            .nth(self.workload_index)
            .map(|w| w.name)
    }

    pub fn selected_container(&self) -> Option<&RunningContainerRecord> {
        self.containers.get(self.container_index)
    }

    pub fn refresh_containers(&mut self) {
        self.containers = self.orchestrator.list();
        self.clamp_indices();
    }

    pub fn clamp_indices(&mut self) {
        let workloads = self.orchestrator.registry().len();
        self.workload_index = self.workload_index.min(workloads.saturating_sub(1));
        self.container_index = self
            .container_index
            .min(self.containers.len().saturating_sub(1));
        let lines = u16::try_from(self.live_log.lines().count()).unwrap_or(u16::MAX);
        self.output_scroll = self.output_scroll.min(lines.saturating_sub(1));
    }
}
