//! Domain types for Stagehand settings.
//!
//! Pure data only — no I/O, no async, no filesystem access.

use serde::{Deserialize, Serialize};

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level settings stored in `~/.stagehand/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct StagehandConfig {
    /// How to reach target hosts.
    pub ssh: SshSettings,
    /// Command-output logging.
    pub output: OutputSettings,
}

/// SSH connection defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SshSettings {
    /// Remote login user. Package installs need root.
    pub user: String,
    /// Remote SSH port.
    pub port: u16,
    /// Extra `-o KEY=VALUE` options passed to `ssh`.
    pub options: Vec<String>,
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            user: "root".to_string(),
            port: 22,
            options: Vec::new(),
        }
    }
}

/// Correlated command-output log settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputSettings {
    /// Tee every remote command's stdout/stderr into the run log.
    pub log_commands: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self { log_commands: true }
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
