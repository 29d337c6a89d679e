//! Child process execution with a hard timeout and bounded output capture.

use std::io::{self, Read};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

/// How long output readers may keep draining after the child is gone.
///
/// Descendants that inherited the pipes can hold them open indefinitely.
pub const DRAIN_GRACE: Duration = Duration::from_millis(500);

const DRAIN_POLL: Duration = Duration::from_millis(10);

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
}

/// Why a child process could not be started.
#[derive(Debug)]
pub enum SpawnError {
    /// The program does not exist on this system.
    NotFound(io::Error),
    Other(io::Error),
}

impl std::fmt::Display for SpawnError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpawnError::NotFound(err) => write!(f, "program not found: {err}"),
            SpawnError::Other(err) => write!(f, "spawn failed: {err}"),
        }
    }
}

impl std::error::Error for SpawnError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SpawnError::NotFound(err) | SpawnError::Other(err) => Some(err),
        }
    }
}

/// Run a command with a timeout and capture stdout/stderr without risking pipe deadlocks.
///
/// Output is drained on reader threads while the child runs. `output_limit_bytes` bounds the
/// bytes kept per stream; the rest is discarded but still read. On timeout the child is killed
/// and reaped before returning with `timed_out = true`.
///
/// Reader threads get until `timeout + DRAIN_GRACE` after spawn to reach EOF. A stream still
/// held open past that point by a descendant process is abandoned and reported as truncated,
/// so a timeout is a hard stop.
///
/// Spawn failures are returned as a [`SpawnError`] inside the error chain so callers can tell
/// a missing program apart from other failures.
#[instrument(skip_all, fields(program = ?cmd.get_program(), timeout_secs = timeout.as_secs()))]
pub fn run_command_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<CommandOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!("spawning child process");
    let started = Instant::now();
    let mut child = cmd.spawn().map_err(|err| {
        if err.kind() == io::ErrorKind::NotFound {
            debug!(err = %err, "program not found");
            anyhow::Error::new(SpawnError::NotFound(err))
        } else {
            warn!(err = %err, "failed to spawn command");
            anyhow::Error::new(SpawnError::Other(err))
        }
    })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let stdout_handle = thread::spawn(move || read_stream_limited(stdout, output_limit_bytes));
    let stderr_handle = thread::spawn(move || read_stream_limited(stderr, output_limit_bytes));

    let mut timed_out = false;
    let status = match child.wait_timeout(timeout).context("wait for command")? {
        Some(status) => status,
        None => {
            warn!(
                timeout_secs = timeout.as_secs(),
                "command timed out, killing"
            );
            timed_out = true;
            child.kill().context("kill command")?;
            child.wait().context("wait command after kill")?
        }
    };

    let drain_deadline = started + timeout + DRAIN_GRACE;
    let (stdout, stdout_truncated) =
        join_output(stdout_handle, drain_deadline).context("join stdout")?;
    let (stderr, stderr_truncated) =
        join_output(stderr_handle, drain_deadline).context("join stderr")?;

    if stdout_truncated > 0 || stderr_truncated > 0 {
        warn!(stdout_truncated, stderr_truncated, "output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
        timed_out,
    })
}

/// Find the spawn failure in an error chain, if the error came from spawning.
pub fn spawn_error(err: &anyhow::Error) -> Option<&SpawnError> {
    err.chain().find_map(|cause| cause.downcast_ref::<SpawnError>())
}

/// Join a reader thread, giving up at `deadline`.
///
/// An abandoned reader stays detached and exits once the last writer closes the pipe.
fn join_output(
    handle: thread::JoinHandle<Result<(Vec<u8>, usize)>>,
    deadline: Instant,
) -> Result<(Vec<u8>, usize)> {
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            warn!("output pipe still open after child exit, abandoning reader");
            return Ok((Vec::new(), 1));
        }
        thread::sleep(DRAIN_POLL);
    }
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn read_stream_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let remaining = limit.saturating_sub(buf.len());
        let keep = n.min(remaining);
        buf.extend_from_slice(&chunk[..keep]);
        truncated += n - keep;
    }

    Ok((buf, truncated))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_reported_as_not_found() {
        let cmd = Command::new("quality-gates-definitely-missing-program");
        let err = run_command_with_timeout(cmd, Duration::from_secs(5), 1024)
            .expect_err("spawn should fail");
        assert!(matches!(spawn_error(&err), Some(SpawnError::NotFound(_))));
    }

    #[test]
    fn read_stream_limited_counts_discarded_bytes() {
        let data = vec![b'x'; 10_000];
        let (kept, truncated) = read_stream_limited(&data[..], 100).expect("read");
        assert_eq!(kept.len(), 100);
        assert_eq!(truncated, 9_900);
    }

    #[cfg(unix)]
    #[test]
    fn captures_exit_status_and_stdout() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo hello; exit 3"]);
        let output = run_command_with_timeout(cmd, Duration::from_secs(10), 1024).expect("run");
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
        assert!(!output.timed_out);
    }

    #[cfg(unix)]
    #[test]
    fn kills_child_on_timeout() {
        let mut cmd = Command::new("sleep");
        cmd.arg("30");
        let output = run_command_with_timeout(cmd, Duration::from_millis(200), 1024).expect("run");
        assert!(output.timed_out);
        assert!(!output.status.success());
    }

    #[cfg(unix)]
    #[test]
    fn timeout_does_not_wait_for_background_descendants() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "sleep 8 & sleep 8; wait"]);
        let started = Instant::now();
        let output = run_command_with_timeout(cmd, Duration::from_millis(500), 1024).expect("run");
        assert!(output.timed_out);
        assert!(
            started.elapsed() < Duration::from_secs(3),
            "returned after {:?}",
            started.elapsed()
        );
    }
}
