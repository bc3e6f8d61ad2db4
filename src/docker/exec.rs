use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};

use super::types::{CancelToken, ContainerCommand, ExecResult, OutputLine};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Spawn the command and return a channel that streams its output.
///
/// The caller receives [`OutputLine::Stdout`]/[`Stderr`] as they arrive,
/// followed by exactly one [`OutputLine::Done`] carrying the final result.
/// On timeout or cancellation the process (and, on Unix, its whole process
/// group) is killed and reaped before `Done` is sent.
pub fn spawn(cmd: ContainerCommand, cancel: CancelToken) -> Result<Receiver<OutputLine>> {
    debug!(
        command = %format!("{} {}", cmd.program, shell_words::join(&cmd.args)),
        timeout_secs = cmd.timeout.as_secs(),
        "spawning runtime process"
    );

    let mut command = Command::new(&cmd.program);
    command
        .args(&cmd.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let mut child = command
        .spawn()
        .with_context(|| format!("failed to spawn `{}`: is it installed and on PATH?", cmd.program))?;

    let stdout = child.stdout.take().context("child stdout was not piped")?;
    let stderr = child.stderr.take().context("child stderr was not piped")?;

    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        supervise(child, stdout, stderr, tx, cancel, cmd.timeout);
    });

    Ok(rx)
}

/// Run the command to completion on the calling thread, handing each output
/// line to `on_line` as it arrives.
pub fn run(cmd: ContainerCommand, cancel: &CancelToken, on_line: &dyn Fn(&str)) -> Result<ExecResult> {
    let rx = spawn(cmd, cancel.clone())?;
    for line in rx {
        match line {
            OutputLine::Stdout(s) | OutputLine::Stderr(s) => on_line(&s),
            OutputLine::Done(result) => return Ok(result),
        }
    }
    bail!("process supervisor exited without reporting a result")
}

#[derive(Default)]
struct Captured {
    stdout: String,
    stderr: String,
    log: String,
}

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

fn pump<R: Read + Send + 'static>(
    reader: R,
    stream: Stream,
    tx: Sender<OutputLine>,
    captured: Arc<Mutex<Captured>>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for line in BufReader::new(reader).lines() {
            let Ok(line) = line else { break };
            if let Ok(mut buf) = captured.lock() {
                let target = match stream {
                    Stream::Stdout => &mut buf.stdout,
                    Stream::Stderr => &mut buf.stderr,
                };
                target.push_str(&line);
                target.push('\n');
                buf.log.push_str(&line);
                buf.log.push('\n');
            }
            // Receiver may be dropped; ignore send errors.
            let _ = tx.send(match stream {
                Stream::Stdout => OutputLine::Stdout(line),
                Stream::Stderr => OutputLine::Stderr(line),
            });
        }
    })
}

fn supervise(
    mut child: Child,
    stdout: std::process::ChildStdout,
    stderr: std::process::ChildStderr,
    tx: Sender<OutputLine>,
    cancel: CancelToken,
    timeout: Duration,
) {
    let captured = Arc::new(Mutex::new(Captured::default()));
    let stdout_handle = pump(stdout, Stream::Stdout, tx.clone(), captured.clone());
    let stderr_handle = pump(stderr, Stream::Stderr, tx.clone(), captured.clone());

    let start = Instant::now();
    let mut cancelled = false;
    let mut timed_out = false;

    let exit_status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "failed to poll runtime process");
                terminate(&mut child);
                break None;
            }
        }

        if cancel.is_cancelled() {
            cancelled = true;
            terminate(&mut child);
            break None;
        }

        if start.elapsed() > timeout {
            timed_out = true;
            warn!(pid = child.id(), timeout_secs = timeout.as_secs(), "runtime process timed out; killing");
            terminate(&mut child);
            break None;
        }

        std::thread::sleep(POLL_INTERVAL);
    };

    let _ = stdout_handle.join();
    let _ = stderr_handle.join();

    let captured = std::mem::take(&mut *captured.lock().unwrap_or_else(PoisonError::into_inner));

    let _ = tx.send(OutputLine::Done(ExecResult {
        exit_code: exit_status.and_then(|s| s.code()),
        stdout: captured.stdout,
        stderr: captured.stderr,
        log: captured.log,
        cancelled,
        timed_out,
    }));
}

/// Kill the child and reap it so nothing is left running.
fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        // process_group(0) made the child the leader of its own group.
        let pgid = child.id() as libc::pid_t;
        // SAFETY: kill(2) only sends a signal; a negative pid targets the group.
        unsafe {
            libc::kill(-pgid, libc::SIGKILL);
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}
