//! Task: Stage-2 self-build.
//!
//! Runs the portable artifact through its host runner so it compiles
//! itself for the native target. The stack allowance is part of every
//! invocation.

use super::{log_task_error, run_command};
use crate::bootstrap::types::BootstrapCtx;
use crate::pipeline::{PipelineTask, TaskReport};
use crate::runtime::StackAllowance;
use crate::util::StageCommand;
use async_trait::async_trait;
use kettle_shared::errors::{KettleError, KettleResult};
use std::path::Path;

pub struct Stage2BuildTask;

#[async_trait]
impl PipelineTask<BootstrapCtx> for Stage2BuildTask {
    async fn run(self: Box<Self>, ctx: BootstrapCtx) -> KettleResult<TaskReport> {
        let task_name = self.name();

        let (command, expected_output) = {
            let ctx = ctx.lock().await;
            let artifact = ctx
                .artifact
                .clone()
                .unwrap_or_else(|| ctx.options.artifact_path());
            if !artifact.is_file() {
                let err = KettleError::NotFound(format!(
                    "portable artifact {} does not exist",
                    artifact.display()
                ));
                log_task_error(task_name, &err);
                return Err(err);
            }

            let stage2 = &ctx.options.stage2;
            let working_dir = stage2
                .working_dir
                .clone()
                .unwrap_or_else(|| ctx.options.project_dir.clone());
            let mut command = stage2_command(
                &stage2.runner,
                &stage2.runner_args,
                stage2.stack_kib,
                &artifact,
                &stage2.args,
                &working_dir,
            );
            if let Some(toolchain) = &ctx.toolchain {
                command = command.envs(toolchain.env.iter().cloned());
            }
            (command, stage2.expected_output.clone())
        };

        let report = run_command(&ctx, task_name, command).await?;
        if report.exit_code == Some(0)
            && let Some(output) = expected_output
        {
            if output.exists() {
                tracing::info!(output = %output.display(), "Native artifact built");
            } else {
                tracing::warn!(
                    output = %output.display(),
                    "Self-build succeeded but the native artifact is missing"
                );
            }
        }
        Ok(report)
    }

    fn name(&self) -> &str {
        "stage2_build"
    }

    fn description(&self) -> &str {
        "Building the native compiler with the portable artifact"
    }
}

/// `<runner> <runner_args>... --stack-size=<kib> <artifact> <args>...`,
/// run in `working_dir`.
pub fn stage2_command(
    runner: &str,
    runner_args: &[String],
    stack: StackAllowance,
    artifact: &Path,
    args: &[String],
    working_dir: &Path,
) -> StageCommand {
    StageCommand::new(runner)
        .args(runner_args.iter().cloned())
        .arg(stack.as_flag())
        .arg(artifact.to_string_lossy())
        .args(args.iter().cloned())
        .current_dir(working_dir)
}
