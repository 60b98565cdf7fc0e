//! Roles: a named manifest plus optional pre-run and post-run hooks.
//!
//! Roles are assembled with [`RoleBuilder`] and are immutable afterwards.

use std::fmt;

use async_trait::async_trait;

use crate::application::run_context::RunContext;
use crate::domain::{FileEntry, Manifest, ProvisionError};

// ── Hooks ─────────────────────────────────────────────────────────────────────

/// Work a role runs before package installation or after file deployment.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Run the hook with the apply's shared run context.
    ///
    /// # Errors
    ///
    /// Any error aborts the apply at this hook's stage.
    async fn run(&self, ctx: &RunContext<'_>) -> Result<(), ProvisionError>;
}

/// A hook that runs a fixed list of commands in order, stopping at the first
/// failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandHook {
    commands: Vec<Vec<String>>,
}

impl CommandHook {
    #[must_use]
    pub fn new(commands: Vec<Vec<String>>) -> Self {
        Self { commands }
    }

    #[must_use]
    pub fn commands(&self) -> &[Vec<String>] {
        &self.commands
    }
}

#[async_trait]
impl Hook for CommandHook {
    async fn run(&self, ctx: &RunContext<'_>) -> Result<(), ProvisionError> {
        for argv in &self.commands {
            ctx.run(argv).await?;
        }
        Ok(())
    }
}

// ── Role ──────────────────────────────────────────────────────────────────────

/// A named bundle of desired packages, files, and lifecycle hooks.
pub struct Role {
    name: String,
    manifest: Manifest,
    pre_run: Option<Box<dyn Hook>>,
    post_run: Option<Box<dyn Hook>>,
}

impl Role {
    /// Start building a role called `name`.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> RoleBuilder {
        RoleBuilder {
            role: Self {
                name: name.into(),
                manifest: Manifest::default(),
                pre_run: None,
                post_run: None,
            },
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    #[must_use]
    pub fn pre_run(&self) -> Option<&dyn Hook> {
        self.pre_run.as_deref()
    }

    #[must_use]
    pub fn post_run(&self) -> Option<&dyn Hook> {
        self.post_run.as_deref()
    }
}

impl fmt::Debug for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Role")
            .field("name", &self.name)
            .field("manifest", &self.manifest)
            .field("pre_run", &self.pre_run.is_some())
            .field("post_run", &self.post_run.is_some())
            .finish()
    }
}

/// Accumulates packages, files, and hooks for one [`Role`].
#[must_use]
pub struct RoleBuilder {
    role: Role,
}

impl RoleBuilder {
    pub fn package(mut self, name: impl Into<String>) -> Self {
        self.role.manifest.packages.push(name.into());
        self
    }

    pub fn packages<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.role
            .manifest
            .packages
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn file(mut self, file: FileEntry) -> Self {
        self.role.manifest.files.push(file);
        self
    }

    pub fn files(mut self, files: impl IntoIterator<Item = FileEntry>) -> Self {
        self.role.manifest.files.extend(files);
        self
    }

    /// Set the pre-run hook, replacing any previously set one.
    pub fn pre_run(mut self, hook: impl Hook + 'static) -> Self {
        self.role.pre_run = Some(Box::new(hook));
        self
    }

    /// Set the post-run hook, replacing any previously set one.
    pub fn post_run(mut self, hook: impl Hook + 'static) -> Self {
        self.role.post_run = Some(Box::new(hook));
        self
    }

    pub fn build(self) -> Role {
        self.role
    }
}
