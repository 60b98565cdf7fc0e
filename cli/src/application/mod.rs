//! Application layer — ports, roles, the run context, and use-case
//! orchestration.
//!
//! This module depends only on `crate::domain` — never on `crate::infra`,
//! `crate::commands`, or `crate::output`.

pub mod archive;
pub mod ports;
pub mod role;
pub mod run_context;
pub mod services;

pub use ports::{Command, ConfigStore, Executor, InputStream, OutputSink, ProgressReporter};
pub use role::{CommandHook, Hook, Role, RoleBuilder};
pub use run_context::{LogSink, RunContext};
pub use services::apply::{ApplyOptions, ApplySummary, apply};
