//! ProcessRunner - confirmed, time-bounded, output-capped command execution
//!
//! The child runs in its own process group. Stdout and stderr are pumped
//! into separate buffers that stop growing at the byte ceiling while the
//! pipes keep draining, so a chatty command is never blocked on a full
//! pipe. A deadline races the child's exit; the loser is ignored, and a
//! kill aimed at an already-exited group is harmless.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::confirm::ConfirmationGate;
use crate::text::truncate_to_boundary;
use crate::tools::ToolError;

/// How long pipe readers may run after the child is gone
const READER_GRACE: Duration = Duration::from_millis(500);

/// Limits applied to spawned processes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessLimits {
    /// Wall-clock deadline per process
    pub timeout: Duration,
    /// Byte ceiling per captured stream
    pub output_limit: usize,
}

impl Default for ProcessLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(20_000),
            output_limit: 8192,
        }
    }
}

/// A command to run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessRequest {
    pub command: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Layered over the inherited environment
    pub env: BTreeMap<String, String>,
    /// Run through `sh -c` (`cmd /C` on Windows) with args joined by spaces
    pub shell: bool,
}

impl ProcessRequest {
    /// Shell request with no extra arguments
    pub fn shell(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            shell: true,
            ..Default::default()
        }
    }

    /// Command line as shown to the operator
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn build(&self) -> Command {
        let mut cmd = if self.shell {
            shell_command(&self.command_line())
        } else {
            let mut c = Command::new(&self.command);
            c.args(&self.args);
            c
        };
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd.envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);
        cmd
    }
}

#[cfg(windows)]
fn shell_command(line: &str) -> Command {
    let mut c = Command::new("cmd");
    c.arg("/C").arg(line);
    c
}

#[cfg(not(windows))]
fn shell_command(line: &str) -> Command {
    let mut c = Command::new("sh");
    c.arg("-c").arg(line);
    c
}

/// Per-stream truncation flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Truncation {
    pub stdout: bool,
    pub stderr: bool,
}

/// What a finished (or killed) process left behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    pub truncated: Truncation,
    pub elapsed: Duration,
}

impl ProcessOutput {
    /// Exited on its own with status zero
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

#[derive(Debug, Default)]
struct Capture {
    bytes: Vec<u8>,
    truncated: bool,
}

type SharedCapture = Arc<Mutex<Capture>>;

/// Spawns commands behind the confirmation gate
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner {
    limits: ProcessLimits,
}

impl ProcessRunner {
    pub fn new(limits: ProcessLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> ProcessLimits {
        self.limits
    }

    /// Ask the gate, then run `request` to completion or timeout
    ///
    /// Denial is `NotConfirmed`; a spawn failure is `Spawn`. Timeouts and
    /// non-zero exits are reported in the returned [`ProcessOutput`].
    pub async fn run(&self, request: &ProcessRequest, gate: &ConfirmationGate) -> Result<ProcessOutput, ToolError> {
        debug!(command = %request.command_line(), "ProcessRunner::run: called");
        let description = format!("Allow agent to execute: {}", request.command_line());
        if !gate.confirm(&description).await {
            debug!("ProcessRunner::run: denied");
            return Err(ToolError::NotConfirmed {
                action: "Command execution".to_string(),
            });
        }

        let start = Instant::now();
        let deadline = start + self.limits.timeout;
        let mut child = request.build().spawn().map_err(|source| ToolError::Spawn {
            command: request.command.clone(),
            source,
        })?;
        let pid = child.id();

        let stdout = SharedCapture::default();
        let stderr = SharedCapture::default();
        let limit = self.limits.output_limit;
        let mut readers = {
            let out = child.stdout.take();
            let err = child.stderr.take();
            let (stdout, stderr) = (stdout.clone(), stderr.clone());
            tokio::spawn(async move {
                tokio::join!(pump(out, stdout, limit), pump(err, stderr, limit));
            })
        };

        let (exit_code, timed_out) = tokio::select! {
            status = child.wait() => match status {
                Ok(status) => (status.code(), false),
                Err(e) => {
                    readers.abort();
                    return Err(ToolError::Io(e));
                }
            },
            _ = tokio::time::sleep_until(deadline) => {
                debug!(?pid, "ProcessRunner::run: deadline reached, killing");
                terminate(&mut child, pid).await;
                (None, true)
            }
        };

        // Background grandchildren may hold the pipes open past the exit
        let reader_deadline = if timed_out {
            Instant::now() + READER_GRACE
        } else {
            deadline.max(Instant::now() + READER_GRACE)
        };
        if tokio::time::timeout_at(reader_deadline, &mut readers).await.is_err() {
            debug!(?pid, "ProcessRunner::run: pipes still open, abandoning readers");
            kill_group(pid);
            readers.abort();
        }

        let (stdout, truncated_stdout) = finish(&stdout, limit);
        let (stderr, truncated_stderr) = finish(&stderr, limit);
        let output = ProcessOutput {
            exit_code,
            stdout,
            stderr,
            timed_out,
            truncated: Truncation {
                stdout: truncated_stdout,
                stderr: truncated_stderr,
            },
            elapsed: start.elapsed(),
        };
        debug!(?output.exit_code, %output.timed_out, ?output.elapsed, "ProcessRunner::run: finished");
        Ok(output)
    }
}

async fn pump<R: AsyncRead + Unpin>(reader: Option<R>, sink: SharedCapture, limit: usize) {
    let Some(mut reader) = reader else {
        return;
    };
    let mut chunk = [0u8; 8192];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                let Ok(mut capture) = sink.lock() else {
                    break;
                };
                let room = limit.saturating_sub(capture.bytes.len());
                if room > 0 {
                    capture.bytes.extend_from_slice(&chunk[..n.min(room)]);
                }
                if capture.bytes.len() >= limit {
                    capture.truncated = true;
                }
            }
            Err(e) => {
                debug!(%e, "pump: read failed");
                break;
            }
        }
    }
}

fn finish(capture: &SharedCapture, limit: usize) -> (String, bool) {
    let Ok(capture) = capture.lock() else {
        return (String::new(), false);
    };
    let mut text = String::from_utf8_lossy(&capture.bytes).into_owned();
    // Lossy decoding can grow a cut multi-byte sequence
    truncate_to_boundary(&mut text, limit);
    (text, capture.truncated)
}

async fn terminate(child: &mut Child, pid: Option<u32>) {
    kill_group(pid);
    if let Err(e) = child.kill().await {
        debug!(%e, "terminate: child already gone");
    }
}

#[cfg(unix)]
fn kill_group(pid: Option<u32>) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Some(pid) = pid.and_then(|p| i32::try_from(p).ok()) else {
        return;
    };
    match killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        Ok(()) | Err(nix::errno::Errno::ESRCH) => {}
        Err(e) => warn!(%pid, %e, "kill_group: failed to signal process group"),
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: Option<u32>) {}
