//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::fmt;

use thiserror::Error;

// ── Provisioning errors ───────────────────────────────────────────────────────

/// Every failure the merge, execution, and deployment paths can produce.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("redefinition of path {path:?} with different attributes")]
    Conflict { path: String },

    #[error("transport failure: {message}")]
    Transport { message: String },

    #[error("{program} exited with {}", describe_exit(.code))]
    NonZeroExit { program: String, code: Option<i32> },

    #[error("{program}: stream I/O failed")]
    CommandIo {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid environment variable name {name:?}")]
    InvalidEnvName { name: String },

    #[error("archive stream failed")]
    Streaming {
        #[source]
        source: std::io::Error,
    },
}

/// Coarse classification of a [`ProvisionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Two roles declared the same path with different attributes.
    Conflict,
    /// Session or authentication could not be established.
    Transport,
    /// A command ran but failed, or its streams failed.
    Execution,
    /// The deployment archive could not be encoded or written.
    Streaming,
}

impl ProvisionError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::NonZeroExit { .. } | Self::CommandIo { .. } | Self::InvalidEnvName { .. } => {
                ErrorKind::Execution
            }
            Self::Streaming { .. } => ErrorKind::Streaming,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

#[allow(clippy::ref_option)] // thiserror passes fields by reference
fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "no exit status (terminated by signal)".to_string(),
    }
}

// ── Apply errors ──────────────────────────────────────────────────────────────

/// The apply state in which a failure happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Merge,
    PreRun { role: String },
    Install,
    Deploy,
    PostRun { role: String },
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Merge => f.write_str("merging roles"),
            Self::PreRun { role } => write!(f, "pre-run hook of role '{role}'"),
            Self::Install => f.write_str("installing packages"),
            Self::Deploy => f.write_str("deploying files"),
            Self::PostRun { role } => write!(f, "post-run hook of role '{role}'"),
        }
    }
}

/// A [`ProvisionError`] annotated with the stage that produced it.
///
/// The wrapped error keeps its kind; the stage is the only added context.
/// Display shows the stage only; the cause is reachable through `source()`.
#[derive(Debug, Error)]
#[error("{stage}")]
pub struct ApplyError {
    pub stage: Stage,
    #[source]
    pub source: ProvisionError,
}

impl ApplyError {
    #[must_use]
    pub fn new(stage: Stage, source: ProvisionError) -> Self {
        Self { stage, source }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}
