//! Subprocess runner.
//!
//! Spawns the requested program with stdin closed and both output streams piped. Each pipe is
//! drained on its own thread so a chatty tool cannot block on a full pipe while the caller
//! polls for exit. The time limit covers both the exit and the end of its output: a tool that
//! leaves a background process holding a pipe open still times out. On Unix the tool runs in
//! its own process group and the whole group is killed at the deadline. The invocation then
//! fails with [`HarnessError::StageTimeout`].

use std::env;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::invocation::{ToolRequest, ToolRunner, ToolchainInvocation};
use crate::common::HarnessError;

/// Interval between exit polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs tool requests as real subprocesses.
#[derive(Debug, Clone, Copy)]
pub struct ProcessRunner {
    poll_interval: Duration,
}

impl ProcessRunner {
    /// Creates a runner with the default poll interval.
    pub const fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Creates a runner that checks for child exit every `poll_interval`.
    pub const fn with_poll_interval(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    fn wait_until(
        &self,
        child: &mut Child,
        request: &ToolRequest,
        deadline: Instant,
    ) -> Result<ExitStatus, HarnessError> {
        loop {
            let polled = child.try_wait().map_err(|source| HarnessError::Spawn {
                stage: request.stage,
                program: request.program.clone(),
                source,
            })?;
            if let Some(status) = polled {
                return Ok(status);
            }

            let now = Instant::now();
            if now >= deadline {
                kill_tree(child);
                return Err(timed_out(request));
            }
            thread::sleep(self.poll_interval.min(deadline - now));
        }
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRunner for ProcessRunner {
    fn run(&self, request: &ToolRequest) -> Result<ToolchainInvocation, HarnessError> {
        // Relative program paths are looked up from where the tool will run.
        let path = env::var_os("PATH");
        let resolved = which::which_in(&request.program, path, &request.working_dir).map_err(
            |source| HarnessError::ToolNotFound {
                stage: request.stage,
                program: request.program.clone(),
                source,
            },
        )?;
        debug!(stage = %request.stage, program = %resolved.display(), "spawning tool");

        let mut command = Command::new(&resolved);
        let _ = command
            .args(&request.args)
            .current_dir(&request.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            let _ = command.process_group(0);
        }
        let mut child = command.spawn().map_err(|source| HarnessError::Spawn {
            stage: request.stage,
            program: request.program.clone(),
            source,
        })?;
        let deadline = Instant::now() + request.timeout;

        let (tx, rx) = mpsc::channel();
        drain(Stream::Stdout, child.stdout.take(), tx.clone());
        drain(Stream::Stderr, child.stderr.take(), tx);
        let status = self.wait_until(&mut child, request, deadline)?;

        let Some((stdout, stderr)) = collect(&rx, deadline) else {
            warn!(
                stage = %request.stage,
                program = %request.program,
                "tool exited but its output stayed open past the time limit"
            );
            kill_tree(&mut child);
            return Err(timed_out(request));
        };

        let invocation = ToolchainInvocation::from_request(request, status.code(), stdout, stderr);
        debug!(
            stage = %request.stage,
            status = ?invocation.status,
            stdout_bytes = invocation.stdout.len(),
            stderr_bytes = invocation.stderr.len(),
            "tool exited"
        );
        Ok(invocation)
    }
}

fn timed_out(request: &ToolRequest) -> HarnessError {
    warn!(
        stage = %request.stage,
        program = %request.program,
        timeout_ms = request.timeout.as_millis(),
        "tool exceeded its time limit and was killed"
    );
    HarnessError::StageTimeout {
        stage: request.stage,
        program: request.program.clone(),
        timeout: request.timeout,
    }
}

/// Kills the child and, on Unix, every process left in its group, then reaps the child.
fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
            // SAFETY: killpg takes plain integers and touches no memory. The group id is the
            // child's pid, which cannot be reused while the child is unreaped or the group
            // still has members.
            #[allow(unsafe_code)]
            let _ = unsafe { libc::killpg(pgid, libc::SIGKILL) };
        }
    }
    // Kill errors mean the child already exited; either way it is reaped here.
    let _ = child.kill();
    let _ = child.wait();
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

fn drain<R: Read + Send + 'static>(
    stream: Stream,
    pipe: Option<R>,
    tx: Sender<(Stream, Vec<u8>)>,
) {
    let _ = thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            // A read error truncates the capture; the exit status still decides the outcome.
            let _ = pipe.read_to_end(&mut buf);
        }
        // The receiver is gone once the run has timed out.
        let _ = tx.send((stream, buf));
    });
}

/// Waits until both streams reach end of file, or returns `None` at the deadline.
fn collect(rx: &Receiver<(Stream, Vec<u8>)>, deadline: Instant) -> Option<(String, String)> {
    let mut stdout = None;
    let mut stderr = None;
    while stdout.is_none() || stderr.is_none() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok((Stream::Stdout, bytes)) => stdout = Some(bytes),
            Ok((Stream::Stderr, bytes)) => stderr = Some(bytes),
            Err(RecvTimeoutError::Timeout) => return None,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    Some((lossy(stdout), lossy(stderr)))
}

fn lossy(bytes: Option<Vec<u8>>) -> String {
    String::from_utf8_lossy(&bytes.unwrap_or_default()).into_owned()
}
