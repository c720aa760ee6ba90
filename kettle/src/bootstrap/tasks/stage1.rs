//! Task: Stage-1 build.
//!
//! Compiles the compiler sources and the resource container into the
//! portable artifact with one toolchain invocation. The artifact's entry
//! point is not invoked automatically; the sandbox host drives it.

use super::{log_task_error, run_command};
use crate::bootstrap::types::BootstrapCtx;
use crate::pipeline::{PipelineTask, TaskReport};
use crate::runtime::KettleOptions;
use crate::toolchain::InstalledToolchain;
use crate::util::StageCommand;
use async_trait::async_trait;
use kettle_shared::errors::{KettleError, KettleResult};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const SOURCE_EXTENSIONS: [&str; 2] = ["cpp", "c"];

pub struct Stage1BuildTask;

#[async_trait]
impl PipelineTask<BootstrapCtx> for Stage1BuildTask {
    async fn run(self: Box<Self>, ctx: BootstrapCtx) -> KettleResult<TaskReport> {
        let task_name = self.name();

        let (command, artifact) = {
            let ctx = ctx.lock().await;
            let toolchain = ctx.installed_toolchain()?;
            let container = ctx.container_path()?;
            let command = stage1_command(&ctx.options, toolchain, container)
                .inspect_err(|e| log_task_error(task_name, e))?;
            (command, ctx.options.artifact_path())
        };

        let report = run_command(&ctx, task_name, command).await?;
        if report.exit_code == Some(0) {
            tracing::info!(artifact = %artifact.display(), "Portable artifact built");
            ctx.lock().await.artifact = Some(artifact);
        }
        Ok(report)
    }

    fn name(&self) -> &str {
        "stage1_build"
    }

    fn description(&self) -> &str {
        "Building the portable artifact"
    }
}

/// The stage-1 toolchain invocation:
///
/// ```text
/// <compiler> -s INVOKE_MAIN=0 [--post-js <glue>] -I<dir>... -Wno-switch
///     [extra flags] <sources>... <container> -D<define>... -o <artifact>
/// ```
pub fn stage1_command(
    options: &KettleOptions,
    toolchain: &InstalledToolchain,
    container: &Path,
) -> KettleResult<StageCommand> {
    let stage1 = &options.stage1;
    let sources = if stage1.sources.is_empty() {
        discover_sources(&stage1.source_dir)?
    } else {
        stage1.sources.clone()
    };

    let mut command = StageCommand::new(&toolchain.compiler).args(["-s", "INVOKE_MAIN=0"]);
    if let Some(glue) = &stage1.post_js {
        command = command.arg("--post-js").arg(path_arg(glue));
    }
    command = command
        .args(
            stage1
                .include_dirs
                .iter()
                .map(|dir| format!("-I{}", dir.display())),
        )
        .arg("-Wno-switch")
        .args(stage1.extra_flags.iter().cloned())
        .args(sources.iter().map(|p| path_arg(p)))
        .arg(path_arg(container))
        .args(stage1.defines.iter().map(|d| format!("-D{}", d)))
        .arg("-o")
        .arg(path_arg(&options.artifact_path()))
        .current_dir(&options.project_dir)
        .envs(toolchain.env.iter().cloned());

    Ok(command)
}

/// `*.cpp` and `*.c` files directly inside `dir`, sorted by name.
pub fn discover_sources(dir: &Path) -> KettleResult<Vec<PathBuf>> {
    let mut sources = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            KettleError::NotFound(format!(
                "cannot read source directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        let is_source = entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext));
        if is_source {
            sources.push(entry.into_path());
        }
    }

    if sources.is_empty() {
        return Err(KettleError::NotFound(format!(
            "no C or C++ sources in {}",
            dir.display()
        )));
    }
    Ok(sources)
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discover_sources_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        for name in ["parser.cpp", "main.cpp", "incbin.c", "icetea.h", "notes.txt"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.cpp")).unwrap();

        let sources = discover_sources(dir.path()).unwrap();
        let names: Vec<_> = sources
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["incbin.c", "main.cpp", "parser.cpp"]);
    }

    #[test]
    fn test_discover_sources_empty_dir() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            discover_sources(dir.path()),
            Err(KettleError::NotFound(_))
        ));
    }
}
