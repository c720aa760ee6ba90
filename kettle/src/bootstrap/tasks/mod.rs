//! Bootstrap pipeline tasks, one per build stage.

mod bundle;
mod stage1;
mod stage2;
mod toolchain;

pub use bundle::BundleResourcesTask;
pub use stage1::{Stage1BuildTask, discover_sources, stage1_command};
pub use stage2::{Stage2BuildTask, stage2_command};
pub use toolchain::ToolchainTask;

use super::types::BootstrapCtx;
use crate::pipeline::TaskReport;
use crate::util::StageCommand;
use kettle_shared::errors::{KettleError, KettleResult};
use std::io::Write;

pub(super) fn log_task_error(task_name: &str, error: &KettleError) {
    tracing::error!(task = task_name, error = %error, "Task failed");
}

/// Echo `command`, run it through the context's runner and report the exit
/// code. The context lock is not held while the process runs.
pub(super) async fn run_command(
    ctx: &BootstrapCtx,
    task_name: &str,
    command: StageCommand,
) -> KettleResult<TaskReport> {
    let runner = {
        let mut ctx = ctx.lock().await;
        let _ = writeln!(ctx.echo, "$ {}", command);
        let _ = ctx.echo.flush();
        ctx.collaborators.runner.clone()
    };

    tracing::debug!(task = task_name, command = %command, "Running stage command");
    let exit_code = runner
        .run(&command)
        .await
        .inspect_err(|e| log_task_error(task_name, e))?;
    tracing::debug!(task = task_name, exit_code, "Stage command exited");

    Ok(TaskReport::executed(command, exit_code))
}
