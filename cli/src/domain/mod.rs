//! Domain layer — pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod file;
pub mod merge;
pub mod shell;

pub use config::{OutputSettings, SshSettings, StagehandConfig};
pub use error::{ApplyError, ErrorKind, ProvisionError, Stage};
pub use file::{FileEntry, Manifest};
pub use merge::{MergedState, merge};
pub use shell::{command_line, shell_escape};
