//! Infrastructure layer — concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution over ssh
//! or locally, role-file loading, and settings.
//!
//! Imports from `crate::domain` and `crate::application` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod config;
pub mod local;
pub mod process;
pub mod role_file;
pub mod ssh;

pub use config::YamlConfigStore;
pub use local::LocalExecutor;
pub use ssh::{SshExecutor, SshTarget};
