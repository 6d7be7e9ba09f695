//! Process invocation with bounded capture and a hard timeout
//!
//! Each output stream is drained by its own thread so a chatty tool cannot
//! deadlock on a full pipe. Only the first `max_output_bytes` of a stream are
//! kept; the remainder is read and discarded, and the kept text is marked as
//! truncated. The calling thread owns the `Child` and polls it against the
//! deadline and the cancellation token, killing and reaping it when either
//! fires.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::Serialize;

use super::cancellation::{Cancellable, CancellationToken};
use crate::errors::ToolExecutionError;

/// Exit code reported when the child was killed or ended by a signal
pub const SENTINEL_EXIT_CODE: i32 = -1;

/// Appended to a captured stream that exceeded the cap
pub const TRUNCATION_MARKER: &str = "\n[... output truncated ...]\n";

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const REAP_TIMEOUT: Duration = Duration::from_secs(5);
const READER_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Captured result of one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    /// Terminated because the run was cancelled (implies `timed_out`)
    pub cancelled: bool,
    pub stdout_truncated: bool,
    pub stderr_truncated: bool,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }
}

/// Runs the extraction tool
///
/// The pipeline only talks to the tool through this trait so tests can
/// substitute a scripted implementation.
pub trait ToolExecutor: Send + Sync {
    fn invoke(
        &self,
        program: &Path,
        args: &[String],
        timeout: Duration,
    ) -> Result<ExecutionResult, ToolExecutionError>;
}

/// [`ToolExecutor`] backed by `std::process`
#[derive(Debug, Clone)]
pub struct SystemToolExecutor {
    max_output_bytes: usize,
    working_dir: Option<PathBuf>,
    cancellation: Option<CancellationToken>,
}

impl SystemToolExecutor {
    pub fn new(max_output_bytes: usize) -> Self {
        Self {
            max_output_bytes,
            working_dir: None,
            cancellation: None,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .map(Cancellable::is_cancelled)
            .unwrap_or(false)
    }
}

enum Termination {
    Exited(ExitStatus),
    TimedOut,
    Cancelled,
}

impl ToolExecutor for SystemToolExecutor {
    fn invoke(
        &self,
        program: &Path,
        args: &[String],
        timeout: Duration,
    ) -> Result<ExecutionResult, ToolExecutionError> {
        let program_name = program.display().to_string();
        log::debug!(
            "Invoking {} with {} argument(s), timeout={}s",
            program_name,
            args.len(),
            timeout.as_secs()
        );

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| ToolExecutionError::Spawn {
            program: program_name.clone(),
            source,
        })?;

        let stdout = child.stdout.take().map(|p| capture(p, self.max_output_bytes));
        let stderr = child.stderr.take().map(|p| capture(p, self.max_output_bytes));

        let started = Instant::now();
        // A timeout too large to represent never fires
        let deadline = started.checked_add(timeout);
        let termination = loop {
            match child.try_wait() {
                Ok(Some(status)) => break Termination::Exited(status),
                Ok(None) => {}
                Err(source) => {
                    let _ = child.kill();
                    reap(&mut child);
                    return Err(ToolExecutionError::Wait {
                        program: program_name,
                        source,
                    });
                }
            }
            if self.is_cancelled() {
                log::warn!("Run cancelled; terminating {}", program_name);
                let _ = child.kill();
                reap(&mut child);
                break Termination::Cancelled;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                log::warn!(
                    "{} exceeded timeout of {}s; terminating",
                    program_name,
                    timeout.as_secs()
                );
                let _ = child.kill();
                reap(&mut child);
                break Termination::TimedOut;
            }
            thread::sleep(POLL_INTERVAL);
        };
        // Close our pipe ends before joining the readers.
        drop(child);

        let (stdout, stdout_truncated) = join_capture(stdout);
        let (stderr, stderr_truncated) = join_capture(stderr);

        let (exit_code, timed_out, cancelled) = match termination {
            Termination::Exited(status) => {
                (status.code().unwrap_or(SENTINEL_EXIT_CODE), false, false)
            }
            Termination::TimedOut => (SENTINEL_EXIT_CODE, true, false),
            Termination::Cancelled => (SENTINEL_EXIT_CODE, true, true),
        };

        log::debug!(
            "{} finished: exit_code={} timed_out={} elapsed_ms={}",
            program_name,
            exit_code,
            timed_out,
            started.elapsed().as_millis()
        );

        Ok(ExecutionResult {
            exit_code,
            stdout,
            stderr,
            timed_out,
            cancelled,
            stdout_truncated,
            stderr_truncated,
        })
    }
}

/// Keep the first `cap` bytes of `pipe` and drain the rest
fn capture<R: Read + Send + 'static>(pipe: R, cap: usize) -> JoinHandle<(Vec<u8>, bool)> {
    thread::spawn(move || {
        let mut kept = Vec::new();
        let mut limited = pipe.take(cap as u64);
        if let Err(e) = limited.read_to_end(&mut kept) {
            log::debug!("Output capture ended early: {}", e);
        }

        let mut rest = limited.into_inner();
        let mut scratch = [0u8; 8192];
        let mut truncated = false;
        loop {
            match rest.read(&mut scratch) {
                Ok(0) | Err(_) => break,
                Ok(_) => truncated = true,
            }
        }
        (kept, truncated)
    })
}

/// Join a reader within a bounded time; a descendant holding the pipe open
/// must not hang the run
fn join_capture(handle: Option<JoinHandle<(Vec<u8>, bool)>>) -> (String, bool) {
    let Some(handle) = handle else {
        return (String::new(), false);
    };

    let deadline = Instant::now() + READER_JOIN_TIMEOUT;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            log::warn!("Output reader did not finish; abandoning captured output");
            return (String::new(), false);
        }
        thread::sleep(POLL_INTERVAL);
    }

    match handle.join() {
        Ok((bytes, truncated)) => {
            let mut text = String::from_utf8_lossy(&bytes).into_owned();
            if truncated {
                text.push_str(TRUNCATION_MARKER);
            }
            (text, truncated)
        }
        Err(_) => (String::new(), false),
    }
}

/// Wait for a killed child with a bound
fn reap(child: &mut Child) {
    let deadline = Instant::now() + REAP_TIMEOUT;
    loop {
        match child.try_wait() {
            Ok(Some(_)) | Err(_) => return,
            Ok(None) => {}
        }
        if Instant::now() >= deadline {
            log::error!("Child process {} could not be reaped", child.id());
            return;
        }
        thread::sleep(POLL_INTERVAL);
    }
}
