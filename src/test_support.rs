//! Scriptable in-process runtime for unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Result, bail};

use crate::docker::{BuildRequest, ContainerRuntime, ExecResult, Invocation};
use crate::registry::RunSpec;

#[derive(Default)]
pub struct StubRuntime {
    pub build_result: Option<ExecResult>,
    pub run_result: Option<ExecResult>,
    pub remove_result: Option<ExecResult>,
    pub spawn_error: bool,
    pub run_delay: Duration,
    pub build_delay: Duration,
    pub builds: AtomicUsize,
    pub runs: AtomicUsize,
    pub removes: AtomicUsize,
    pub building: AtomicUsize,
    /// Most builds seen in flight at the same time.
    pub max_parallel_builds: AtomicUsize,
    /// Dockerfile contents seen by `build`, read from the staged context.
    pub seen_dockerfiles: Mutex<Vec<String>>,
}

impl StubRuntime {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn failing_build(code: i32, stderr: &str) -> Self {
        Self {
            build_result: Some(ExecResult::exited(code, "", stderr)),
            ..Self::default()
        }
    }

    pub fn failing_run(code: i32, stderr: &str) -> Self {
        Self {
            run_result: Some(ExecResult::exited(code, "", stderr)),
            ..Self::default()
        }
    }

    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    pub fn max_parallel_builds(&self) -> usize {
        self.max_parallel_builds.load(Ordering::SeqCst)
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn removes(&self) -> usize {
        self.removes.load(Ordering::SeqCst)
    }
}

impl ContainerRuntime for StubRuntime {
    fn build(&self, request: &BuildRequest<'_>, invocation: &Invocation<'_>) -> Result<ExecResult> {
        let n = self.builds.fetch_add(1, Ordering::SeqCst);
        if self.spawn_error {
            bail!("stub runtime refused to start");
        }
        let in_flight = self.building.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_parallel_builds.fetch_max(in_flight, Ordering::SeqCst);
        if let Ok(text) = std::fs::read_to_string(request.dockerfile) {
            self.seen_dockerfiles.lock().unwrap().push(text);
        }
        std::thread::sleep(self.build_delay);
        self.building.fetch_sub(1, Ordering::SeqCst);
        let result = self
            .build_result
            .clone()
            .unwrap_or_else(|| ExecResult::exited(0, format!("sha256:{:064x}\n", n + 1), ""));
        for line in result.log.lines() {
            (invocation.on_line)(line);
        }
        Ok(result)
    }

    fn run(&self, _spec: &RunSpec, invocation: &Invocation<'_>) -> Result<ExecResult> {
        let n = self.runs.fetch_add(1, Ordering::SeqCst);
        if self.spawn_error {
            bail!("stub runtime refused to start");
        }
        std::thread::sleep(self.run_delay);
        let result = self
            .run_result
            .clone()
            .unwrap_or_else(|| ExecResult::exited(0, format!("{:064x}\n", n + 1), ""));
        for line in result.log.lines() {
            (invocation.on_line)(line);
        }
        Ok(result)
    }

    fn remove(&self, container_id: &str, _invocation: &Invocation<'_>) -> Result<ExecResult> {
        self.removes.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .remove_result
            .clone()
            .unwrap_or_else(|| ExecResult::exited(0, format!("{container_id}\n"), "")))
    }
}
