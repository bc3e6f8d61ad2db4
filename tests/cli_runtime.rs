//! End-to-end tests through the real process plumbing.
//!
//! A generated shell script stands in for `docker`, so these run anywhere
//! `sh` exists and never touch a container daemon.

#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dockmenu::config::Config;
use dockmenu::{CancelToken, CliRuntime, ErrorKind, OrchestrationError, Orchestrator};

const BUILD_OK: &str = r##"echo "#5 exporting layers" >&2
    echo "sha256:5f1ec0ffee""##;

const RUN_OK: &str = r#"echo "4f2a9c0d1e2b3c4d5e6f7a8b9c0d1e2f""#;

/// Write a fake `docker` into `dir` whose `build` and `run` branches execute
/// the given shell snippets. Every invocation is appended to `calls.log`.
fn fake_docker(dir: &Path, build: &str, run: &str) -> CliRuntime {
    let script = format!(
        r#"echo "$@" >> "{dir}/calls.log"
case "$1" in
  build)
    {build}
    ;;
  run)
    {run}
    ;;
  rm)
    echo "$3"
    ;;
  *)
    echo "unexpected command: $1" >&2
    exit 64
    ;;
esac
"#,
        dir = dir.display(),
    );
    let path = dir.join("fake-docker.sh");
    std::fs::write(&path, script).expect("failed to write fake docker");
    CliRuntime::with_args("sh", vec![path.display().to_string()])
}

fn setup(build: &str, run: &str, build_timeout: u64) -> (tempfile::TempDir, Orchestrator) {
    let dir = tempfile::tempdir().expect("failed to create tempdir");
    let runtime = fake_docker(dir.path(), build, run);
    let cfg = Config {
        context_root: PathBuf::from("contexts"),
        build_timeout,
        ..Config::default()
    };
    let orch = Orchestrator::from_config(&cfg, dir.path(), Arc::new(runtime));
    (dir, orch)
}

fn calls(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("calls.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn apache_builds_and_runs_through_cli() {
    let (dir, orch) = setup(BUILD_OK, RUN_OK, 30);

    let record = orch
        .launch_workload("apache", &CancelToken::new())
        .expect("launch should succeed");

    assert_eq!(record.container_id, "4f2a9c0d1e2b3c4d5e6f7a8b9c0d1e2f");
    assert_eq!(record.short_id(), "4f2a9c0d1e2b");

    let calls = calls(dir.path());
    assert_eq!(calls.len(), 2);
    let context = dir.path().join("contexts").join("my-apache");
    assert_eq!(
        calls[0],
        format!(
            "build -q -t my-apache -f {} {}",
            context.join("Dockerfile").display(),
            context.display()
        )
    );
    assert_eq!(calls[1], "run -d -it --name apache-server -p 8080:80 my-apache");
    assert!(context.join("apache_html").join("index.html").exists());
}

#[test]
fn failing_build_returns_captured_text_and_skips_run() {
    let failing = r#"echo "ERROR: failed to solve: unknown instruction: FORM" >&2
    exit 1"#;
    let (dir, orch) = setup(failing, RUN_OK, 30);

    let err = orch
        .launch_workload("apache", &CancelToken::new())
        .unwrap_err();

    match &err {
        OrchestrationError::BuildFailed { exit_code, output } => {
            assert_eq!(*exit_code, Some(1));
            assert!(output.contains("unknown instruction: FORM"));
        }
        other => panic!("expected BuildFailed, got {other:?}"),
    }
    assert!(calls(dir.path()).iter().all(|c| !c.starts_with("run")));
    assert!(orch.list().is_empty());
}

#[test]
fn hung_build_times_out_and_process_is_killed() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("build.pid");
    let hang = format!(
        r##"echo $$ > "{}"
    echo "#1 [internal] load build definition" >&2
    exec sleep 30"##,
        pid_file.display()
    );
    let runtime = fake_docker(dir.path(), &hang, RUN_OK);
    let cfg = Config {
        context_root: dir.path().join("contexts"),
        build_timeout: 1,
        ..Config::default()
    };
    let orch = Orchestrator::from_config(&cfg, dir.path(), Arc::new(runtime));

    let start = Instant::now();
    let err = orch
        .launch_workload("flask-api", &CancelToken::new())
        .unwrap_err();
    let elapsed = start.elapsed();

    match &err {
        OrchestrationError::BuildTimeout { after, output } => {
            assert_eq!(*after, Duration::from_secs(1));
            assert!(output.contains("load build definition"));
        }
        other => panic!("expected BuildTimeout, got {other:?}"),
    }
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_secs(10), "took {elapsed:?}");

    let pid: libc::pid_t = std::fs::read_to_string(&pid_file)
        .expect("stub never started")
        .trim()
        .parse()
        .unwrap();
    // SAFETY: signal 0 performs only the existence check.
    let alive = unsafe { libc::kill(pid, 0) } == 0;
    assert!(!alive, "stub build process {pid} is still running");
    assert!(orch.list().is_empty());
}

#[test]
fn cancel_aborts_a_hung_build() {
    let (_dir, orch) = setup("exec sleep 30", RUN_OK, 60);
    let orch = Arc::new(orch);
    let cancel = CancelToken::new();

    let rx = dockmenu::orchestrator::spawn_launch(orch.clone(), "dind", cancel.clone());
    std::thread::sleep(Duration::from_millis(300));
    cancel.cancel();

    let start = Instant::now();
    let finished = rx
        .into_iter()
        .find_map(|ev| match ev {
            dockmenu::orchestrator::LaunchEvent::Finished { result, .. } => Some(result),
            _ => None,
        })
        .expect("expected a Finished event");

    assert_eq!(finished.unwrap_err().kind(), ErrorKind::Cancelled);
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[test]
fn launch_then_stop_issues_rm() {
    let (dir, orch) = setup(BUILD_OK, RUN_OK, 30);
    let record = orch.launch_workload("vlc", &CancelToken::new()).unwrap();

    let stopped = orch.stop(&record.container_id, &CancelToken::new()).unwrap();

    assert_eq!(stopped.container_id, record.container_id);
    assert!(orch.list().is_empty());
    let calls = calls(dir.path());
    assert_eq!(calls[0], "run -d -p 5801:5800 jlesage/vlc");
    assert_eq!(calls[1], format!("rm -f {}", record.container_id));

    let err = orch.stop(&record.container_id, &CancelToken::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn run_failure_reports_runtime_stderr() {
    let failing_run = r#"echo "docker: Error response from daemon: pull access denied for jlesage/firefox" >&2
    exit 125"#;
    let (_dir, orch) = setup(BUILD_OK, failing_run, 30);

    let err = orch
        .launch_workload("firefox", &CancelToken::new())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::LaunchFailed);
    assert!(err.to_string().contains("exit 125"));
    assert!(err.diagnostic().contains("pull access denied"));
}
