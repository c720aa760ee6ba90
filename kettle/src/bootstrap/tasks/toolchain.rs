//! Task: Toolchain setup.
//!
//! Hands the resolved release to the configured toolchain source and keeps
//! the installed toolchain for the build stages.

use super::log_task_error;
use crate::bootstrap::types::BootstrapCtx;
use crate::pipeline::{PipelineTask, TaskReport};
use async_trait::async_trait;
use kettle_shared::errors::KettleResult;

pub struct ToolchainTask;

#[async_trait]
impl PipelineTask<BootstrapCtx> for ToolchainTask {
    async fn run(self: Box<Self>, ctx: BootstrapCtx) -> KettleResult<TaskReport> {
        let task_name = self.name();

        let (source, release) = {
            let ctx = ctx.lock().await;
            (ctx.collaborators.source.clone(), ctx.release.clone())
        };

        tracing::info!(
            source = source.name(),
            version = %release.version,
            url = %release.download_url,
            "Providing toolchain"
        );
        let installed = source
            .provide(&release)
            .await
            .inspect_err(|e| log_task_error(task_name, e))?;

        ctx.lock().await.toolchain = Some(installed);
        Ok(TaskReport::completed())
    }

    fn name(&self) -> &str {
        "toolchain_setup"
    }

    fn description(&self) -> &str {
        "Preparing the portable toolchain"
    }
}
