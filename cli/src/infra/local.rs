//! `Executor` that runs commands on this machine.
//!
//! The program is started directly, without a shell, so arguments reach it
//! exactly as given.

use async_trait::async_trait;

use crate::application::ports::{Command, Executor};
use crate::domain::ProvisionError;
use crate::infra::process::{self, Streams};

/// Runs commands as child processes of the current one.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalExecutor;

#[async_trait]
impl Executor for LocalExecutor {
    async fn run(&self, cmd: Command<'_>) -> Result<(), ProvisionError> {
        let Command {
            program,
            args,
            env,
            stdin,
            stdout,
            stderr,
        } = cmd;
        let streams = Streams {
            stdin,
            stdout,
            stderr,
        };
        let io_err = |source| ProvisionError::CommandIo {
            program: program.clone(),
            source,
        };

        tracing::debug!(program = %program, ?args, "running local command");
        let mut local = tokio::process::Command::new(&program);
        local.args(&args).envs(&env);
        let child = process::spawn(&mut local, &streams).map_err(io_err)?;
        let finished = process::drive(child, streams).await.map_err(io_err)?;

        if finished.status.success() {
            finished.streams.map_err(io_err)
        } else {
            Err(ProvisionError::NonZeroExit {
                program,
                code: finished.status.code(),
            })
        }
    }
}
