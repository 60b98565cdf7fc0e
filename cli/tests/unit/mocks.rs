//! Shared mock infrastructure for unit tests.
//!
//! Provides a recording [`Executor`], a capturing run log, and a recording
//! progress reporter so each test file doesn't have to re-define the same
//! boilerplate.

#![allow(clippy::expect_used)]

use std::collections::{BTreeMap, HashMap};
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use flate2::read::GzDecoder;
use stagehand_cli::application::ports::{Command, Executor, ProgressReporter};
use stagehand_cli::domain::ProvisionError;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

// ── Recording executor ────────────────────────────────────────────────────────

/// One command as the executor saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    /// Everything read from stdin.
    pub stdin: Vec<u8>,
}

/// Records every command and reads its stdin to the end.
///
/// Programs registered with [`fail`](Self::fail) exit non-zero immediately,
/// without reading stdin.
#[derive(Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<Invocation>>,
    failures: HashMap<String, i32>,
    stdout: Vec<u8>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `program` exit with `code`.
    pub fn fail(mut self, program: &str, code: i32) -> Self {
        self.failures.insert(program.to_string(), code);
        self
    }

    /// Write `bytes` to stdout of every command.
    pub fn with_stdout(mut self, bytes: &[u8]) -> Self {
        self.stdout = bytes.to_vec();
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().expect("lock").clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.program).collect()
    }

    pub fn call(&self, program: &str) -> Invocation {
        self.calls()
            .into_iter()
            .find(|c| c.program == program)
            .unwrap_or_else(|| panic!("{program} was not invoked"))
    }
}

#[async_trait]
impl Executor for RecordingExecutor {
    async fn run(&self, cmd: Command<'_>) -> Result<(), ProvisionError> {
        let Command {
            program,
            args,
            env,
            stdin,
            stdout,
            ..
        } = cmd;
        let io_err = |source| ProvisionError::CommandIo {
            program: program.clone(),
            source,
        };

        let failure = self.failures.get(&program).copied();
        let mut input = Vec::new();
        if failure.is_none() {
            if let Some(mut stdin) = stdin {
                stdin.read_to_end(&mut input).await.map_err(io_err)?;
            }
            if let Some(mut out) = stdout {
                out.write_all(&self.stdout).await.map_err(io_err)?;
            }
        }

        self.calls.lock().expect("lock").push(Invocation {
            program: program.clone(),
            args,
            env,
            stdin: input,
        });

        match failure {
            Some(code) => Err(ProvisionError::NonZeroExit {
                program,
                code: Some(code),
            }),
            None => Ok(()),
        }
    }
}

// ── Run log ───────────────────────────────────────────────────────────────────

/// Run log backed by a shared buffer so tests can inspect it.
#[derive(Clone, Default)]
pub struct SharedLog(Arc<Mutex<Vec<u8>>>);

impl Write for SharedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedLog {
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().expect("lock").clone())
            .expect("utf8")
            .lines()
            .map(String::from)
            .collect()
    }
}

// ── Progress reporter ─────────────────────────────────────────────────────────

/// Collects progress events as `"step: …"`, `"success: …"`, `"warn: …"`.
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("lock").clone()
    }

    fn push(&self, kind: &str, message: &str) {
        self.events
            .lock()
            .expect("lock")
            .push(format!("{kind}: {message}"));
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.push("step", message);
    }

    fn success(&self, message: &str) {
        self.push("success", message);
    }

    fn warn(&self, message: &str) {
        self.push("warn", message);
    }
}

// ── Archive helpers ───────────────────────────────────────────────────────────

/// A decoded archive entry: path, is-dir, mode, owner, group, contents.
pub type DecodedEntry = (String, bool, u32, String, String, Vec<u8>);

/// Decode a `.tar.gz` stream as a standard reader sees it.
pub fn decode_archive(bytes: &[u8]) -> Vec<DecodedEntry> {
    let mut archive = tar::Archive::new(GzDecoder::new(bytes));
    archive
        .entries()
        .expect("entries")
        .map(|entry| {
            let mut entry = entry.expect("entry");
            let header = entry.header().clone();
            let mut contents = Vec::new();
            entry.read_to_end(&mut contents).expect("contents");
            (
                entry.path().expect("path").display().to_string(),
                header.entry_type().is_dir(),
                header.mode().expect("mode"),
                header.username().expect("uname").unwrap_or_default().to_string(),
                header.groupname().expect("gname").unwrap_or_default().to_string(),
                contents,
            )
        })
        .collect()
}

/// Deterministic, poorly compressible bytes.
pub fn noise(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (state >> 56) as u8
        })
        .collect()
}
