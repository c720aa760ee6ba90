//! Task: Resource bundling.
//!
//! Parses the manifest, bundles every resource and writes the container
//! source into the output directory. All-or-nothing: on failure no
//! container file is written.

use super::log_task_error;
use crate::bootstrap::types::BootstrapCtx;
use crate::pipeline::{PipelineTask, TaskReport};
use crate::resources::ResourceManifest;
use async_trait::async_trait;
use kettle_shared::errors::KettleResult;

pub struct BundleResourcesTask;

#[async_trait]
impl PipelineTask<BootstrapCtx> for BundleResourcesTask {
    async fn run(self: Box<Self>, ctx: BootstrapCtx) -> KettleResult<TaskReport> {
        let task_name = self.name();

        let (bundler, resources) = {
            let ctx = ctx.lock().await;
            (
                ctx.collaborators.bundler.clone(),
                ctx.options.resources.clone(),
            )
        };

        let container = ResourceManifest::from_file(&resources.manifest)
            .and_then(|manifest| bundler.bundle(&manifest))
            .and_then(|container| {
                container.write_c_source(&resources.container, &resources.symbol)?;
                Ok(container)
            })
            .inspect_err(|e| log_task_error(task_name, e))?;

        tracing::info!(
            bundler = bundler.name(),
            resources = container.len(),
            bytes = container.total_bytes(),
            path = %resources.container.display(),
            "Resource container written"
        );

        ctx.lock().await.container = Some(resources.container);
        Ok(TaskReport::completed())
    }

    fn name(&self) -> &str {
        "bundle_resources"
    }

    fn description(&self) -> &str {
        "Generating the resource container"
    }
}
