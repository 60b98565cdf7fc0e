//! Per-apply command runner with correlated output logging.
//!
//! When output logging is on, every command gets an invocation number and
//! both of its output streams are teed: the bytes still reach whatever sink
//! the caller attached, and each line is also written to the run log as
//! `<NNNNNN> <stdout|stderr> line`.

use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};

use crate::application::ports::{Command, Executor, OutputSink};
use crate::domain::ProvisionError;

/// Buffer size of the pipes interposed on stdout/stderr.
const TEE_BUFFER: usize = 16 * 1024;

/// Destination of the correlated run log.
pub type LogSink<'a> = Box<dyn Write + Send + 'a>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        })
    }
}

/// Shared state for one apply: the executor, the invocation counter, and the
/// run log. Hooks receive it to run their own commands.
pub struct RunContext<'a> {
    executor: &'a dyn Executor,
    log_output: AtomicBool,
    next_run: AtomicU64,
    log: Mutex<LogSink<'a>>,
}

impl<'a> RunContext<'a> {
    /// Create a context that logs command output to `log`.
    #[must_use]
    pub fn new(executor: &'a dyn Executor, log: LogSink<'a>) -> Self {
        Self {
            executor,
            log_output: AtomicBool::new(true),
            next_run: AtomicU64::new(0),
            log: Mutex::new(log),
        }
    }

    /// Turn correlated output logging on or off for subsequent commands.
    pub fn set_log_output(&self, enabled: bool) {
        self.log_output.store(enabled, Ordering::Relaxed);
    }

    #[must_use]
    pub fn log_output(&self) -> bool {
        self.log_output.load(Ordering::Relaxed)
    }

    /// Number of commands issued through this context so far.
    #[must_use]
    pub fn invocations(&self) -> u64 {
        self.next_run.load(Ordering::Relaxed)
    }

    /// Run `argv[0]` with the remaining elements as arguments.
    ///
    /// # Errors
    ///
    /// Propagates the executor's error unchanged.
    pub async fn run<S: AsRef<str> + Sync>(&self, argv: &[S]) -> Result<(), ProvisionError> {
        self.run_command(Command::from_argv(argv)).await
    }

    /// Run one command, teeing its output into the run log when enabled.
    ///
    /// Returns only after the command has exited and both output streams have
    /// been drained into the log and the caller's sinks.
    ///
    /// # Errors
    ///
    /// Propagates the executor's error unchanged. If the command succeeded
    /// but writing to a caller-supplied sink failed, returns
    /// [`ProvisionError::CommandIo`].
    pub async fn run_command(&self, mut cmd: Command<'_>) -> Result<(), ProvisionError> {
        let run = self.next_run.fetch_add(1, Ordering::Relaxed);
        if !self.log_output() {
            return self.executor.run(cmd).await;
        }

        let program = cmd.program.clone();
        tracing::debug!(run, program = %program, args = ?cmd.args, "running command");

        let (stdout_pipe, stdout_tap) = tokio::io::duplex(TEE_BUFFER);
        let (stderr_pipe, stderr_tap) = tokio::io::duplex(TEE_BUFFER);
        let stdout_sink = cmd.stdout.replace(Box::new(stdout_pipe));
        let stderr_sink = cmd.stderr.replace(Box::new(stderr_pipe));

        // `cmd` owns the pipe write ends; they close when `run` returns, which
        // ends both scans.
        let (result, stdout_tee, stderr_tee) = tokio::join!(
            self.executor.run(cmd),
            self.tee_lines(run, Stream::Stdout, stdout_tap, stdout_sink),
            self.tee_lines(run, Stream::Stderr, stderr_tap, stderr_sink),
        );

        result?;
        stdout_tee
            .and(stderr_tee)
            .map_err(|source| ProvisionError::CommandIo { program, source })
    }

    /// Write one free-form line to the run log.
    pub fn log(&self, message: &str) {
        let mut sink = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(sink, "{message}") {
            tracing::warn!(error = %e, "failed to write run log");
        }
    }

    /// Drain `tap`, forwarding bytes to `sink` and logging each line.
    ///
    /// A failing sink is dropped and its error returned at the end; the tap
    /// keeps draining so the command never stalls on a full pipe.
    async fn tee_lines(
        &self,
        run: u64,
        stream: Stream,
        tap: DuplexStream,
        mut sink: Option<OutputSink<'_>>,
    ) -> io::Result<()> {
        let mut reader = BufReader::new(tap);
        let mut line = Vec::new();
        let mut sink_result = Ok(());

        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    self.log(&format!("<{run:>6}> <{stream}> Error while reading {stream}: {e}"));
                    break;
                }
            }

            if let Some(out) = sink.as_mut() {
                if let Err(e) = out.write_all(&line).await {
                    sink = None;
                    sink_result = Err(e);
                }
            }

            let text = String::from_utf8_lossy(&line);
            let text = text.trim_end_matches('\n').trim_end_matches('\r');
            self.log(&format!("<{run:>6}> <{stream}> {text}"));
        }

        if let Some(out) = sink.as_mut() {
            out.flush().await?;
        }
        sink_result
    }
}
