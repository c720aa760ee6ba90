//! Two-stage bootstrap orchestration.
//!
//! ## Architecture
//!
//! The toolchain release is resolved up front (pure, no I/O); an unsupported
//! host fails before any stage runs. The remaining work is a linear plan:
//!
//! ```text
//! 1. ToolchainSetup    (toolchain source provides an installed SDK)
//! 2. BundleResources   (manifest -> resource container C source)
//! 3. Stage1Build       (compiler + container -> portable artifact)
//! 4. Stage2Build       (portable artifact rebuilds itself natively)
//! ```
//!
//! Every stage waits for the previous one; the first failure stops the run.

mod tasks;
mod types;

pub use tasks::{discover_sources, stage1_command, stage2_command};
pub use types::{BootstrapContext, BootstrapCtx, Collaborators};

use crate::pipeline::{
    BoxedTask, ExecutionPlan, PipelineBuilder, PipelineExecutor, PipelineMetrics, PipelineRun,
};
use crate::resources::{BundlerBackend, NativeBundler};
use crate::runtime::KettleOptions;
use crate::toolchain::{LocalToolchain, Platform, ToolchainSource, resolve_release};
use crate::util::{CommandRunner, ProcessRunner};
use kettle_shared::errors::{KettleError, KettleResult};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::Mutex;

use tasks::{BundleResourcesTask, Stage1BuildTask, Stage2BuildTask, ToolchainTask};

fn execution_plan() -> ExecutionPlan<BootstrapCtx> {
    let tasks: Vec<BoxedTask<BootstrapCtx>> = vec![
        Box::new(ToolchainTask),
        Box::new(BundleResourcesTask),
        Box::new(Stage1BuildTask),
        Box::new(Stage2BuildTask),
    ];
    ExecutionPlan::new(tasks)
}

/// Runs the bootstrap pipeline.
///
/// # Example
///
/// ```ignore
/// let options = KettleOptions::from_file(Path::new("kettle.json"))?;
/// let metrics = Bootstrap::new(options)?.execute().await?;
/// ```
pub struct Bootstrap {
    options: KettleOptions,
    platform: Platform,
    collaborators: Collaborators,
    progress: Box<dyn Write + Send>,
    echo: Box<dyn Write + Send>,
}

impl Bootstrap {
    /// Validate `options` and wire the default collaborators: a local SDK,
    /// the native bundler and real subprocesses.
    pub fn new(options: KettleOptions) -> KettleResult<Self> {
        options.validate()?;
        let source = LocalToolchain::new(options.toolchain.sdk_root.clone());
        Ok(Self {
            options,
            platform: Platform::host(),
            collaborators: Collaborators {
                source: Arc::new(source),
                bundler: Arc::new(NativeBundler),
                runner: Arc::new(ProcessRunner),
            },
            progress: Box::new(std::io::stdout()),
            echo: Box::new(std::io::stdout()),
        })
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_toolchain_source(mut self, source: Arc<dyn ToolchainSource>) -> Self {
        self.collaborators.source = source;
        self
    }

    pub fn with_bundler(mut self, bundler: Arc<dyn BundlerBackend>) -> Self {
        self.collaborators.bundler = bundler;
        self
    }

    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.collaborators.runner = runner;
        self
    }

    /// Send progress lines and command echoes to `out` instead of stdout.
    pub fn with_output<W>(mut self, out: W) -> Self
    where
        W: Write + Send + Clone + 'static,
    {
        self.progress = Box::new(out.clone());
        self.echo = Box::new(out);
        self
    }

    /// Resolve the toolchain, prepare the output directory and run every
    /// stage.
    ///
    /// `Err` means no stage ran. Stage failures are reported in the
    /// returned [`PipelineRun`].
    pub async fn run(self) -> KettleResult<PipelineRun> {
        let Bootstrap {
            options,
            platform,
            collaborators,
            progress,
            echo,
        } = self;

        let release = resolve_release(
            platform,
            &options.toolchain.version,
            &options.toolchain.base_url,
        )?;

        tokio::fs::create_dir_all(&options.output_dir)
            .await
            .map_err(|e| {
                KettleError::Internal(format!(
                    "Failed to create output directory {}: {}",
                    options.output_dir.display(),
                    e
                ))
            })?;

        tracing::info!(
            platform = %platform,
            project = %options.project_dir.display(),
            output = %options.output_dir.display(),
            "Starting bootstrap"
        );

        let ctx: BootstrapCtx = Arc::new(Mutex::new(BootstrapContext::new(
            options,
            release,
            collaborators,
            echo,
        )));
        let pipeline = PipelineBuilder::from_plan(execution_plan()).with_progress(progress);
        let run = PipelineExecutor::execute(pipeline, ctx).await;

        run.metrics.log_stages();
        Ok(run)
    }

    /// [`Bootstrap::run`], collapsed to the first error.
    pub async fn execute(self) -> KettleResult<PipelineMetrics> {
        self.run().await?.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::StageStatus;
    use crate::toolchain::{HostArch, HostOs, InstalledToolchain, ToolchainRelease};
    use crate::util::StageCommand;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex as StdMutex;
    use tempfile::TempDir;

    struct FakeToolchain {
        root: PathBuf,
    }

    #[async_trait]
    impl ToolchainSource for FakeToolchain {
        async fn provide(&self, release: &ToolchainRelease) -> KettleResult<InstalledToolchain> {
            Ok(InstalledToolchain {
                release: release.clone(),
                root: self.root.clone(),
                compiler: self.root.join("emcc"),
                env: vec![("EMSDK".to_string(), self.root.display().to_string())],
            })
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    /// Records commands and answers with scripted exit codes. Creates the
    /// `-o` output of successful commands.
    #[derive(Default)]
    struct RecordingRunner {
        commands: StdMutex<Vec<StageCommand>>,
        exit_codes: StdMutex<Vec<i32>>,
    }

    impl RecordingRunner {
        fn with_exit_codes(codes: &[i32]) -> Self {
            Self {
                commands: StdMutex::default(),
                exit_codes: StdMutex::new(codes.iter().rev().copied().collect()),
            }
        }

        fn commands(&self) -> Vec<StageCommand> {
            self.commands.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(&self, command: &StageCommand) -> KettleResult<i32> {
            self.commands.lock().unwrap().push(command.clone());
            let code = self.exit_codes.lock().unwrap().pop().unwrap_or(0);
            if code == 0
                && let Some(pos) = command.args.iter().position(|a| a == "-o")
            {
                std::fs::write(&command.args[pos + 1], "// artifact").unwrap();
            }
            Ok(code)
        }
    }

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<StdMutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn project(manifest: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir(&src).unwrap();
        std::fs::write(src.join("main.cpp"), "int main() {}").unwrap();
        std::fs::write(src.join("incbin.c"), "").unwrap();
        std::fs::write(src.join("icetea.h"), "").unwrap();
        std::fs::write(src.join("Configurable.os"), "class Configurable {}").unwrap();
        std::fs::write(src.join("scripts.rc"), manifest).unwrap();
        dir
    }

    fn bootstrap(dir: &Path, runner: Arc<RecordingRunner>, out: SharedBuf) -> Bootstrap {
        let mut options = KettleOptions::default();
        options.stage1.post_js = None;
        let options = options.resolve_paths(dir);
        Bootstrap::new(options)
            .unwrap()
            .with_platform(Platform::new(HostOs::Linux, HostArch::X86_64))
            .with_toolchain_source(Arc::new(FakeToolchain {
                root: dir.join("sdk"),
            }))
            .with_runner(runner)
            .with_output(out)
    }

    const MANIFEST: &str = "INCBIN(Configurable, \"Configurable.os\")\n";

    #[tokio::test]
    async fn test_full_bootstrap_runs_both_stages_in_order() {
        let dir = project(MANIFEST);
        let runner = Arc::new(RecordingRunner::default());
        let out = SharedBuf::default();

        let run = bootstrap(dir.path(), runner.clone(), out.clone())
            .run()
            .await
            .unwrap();

        assert!(run.is_success(), "{:?}", run.result);
        assert!(run.stages.iter().all(|s| s.status == StageStatus::Succeeded));

        let commands = runner.commands();
        assert_eq!(commands.len(), 2);

        let root = dir.path().join(".");
        let stage1 = &commands[0];
        assert_eq!(stage1.program, dir.path().join("sdk/emcc"));
        assert_eq!(
            stage1.args,
            [
                "-s".to_string(),
                "INVOKE_MAIN=0".to_string(),
                format!("-I{}", root.join("src").display()),
                "-Wno-switch".to_string(),
                root.join("src/incbin.c").display().to_string(),
                root.join("src/main.cpp").display().to_string(),
                root.join("out/scripts.c").display().to_string(),
                "-DICETEA_INCBIN_FORCE_EXTERNAL".to_string(),
                "-DOS_EMSCRIPTEN".to_string(),
                "-o".to_string(),
                root.join("out/icetea.js").display().to_string(),
            ]
        );
        assert!(stage1.env.iter().any(|(k, _)| k == "EMSDK"));

        let stage2 = &commands[1];
        assert_eq!(stage2.program, Path::new("node"));
        assert_eq!(
            stage2.args,
            [
                "--stack-size=2048".to_string(),
                root.join("out/icetea.js").display().to_string(),
                "--target=native".to_string(),
            ]
        );

        let container = std::fs::read_to_string(root.join("out/scripts.c")).unwrap();
        assert!(container.contains("gConfigurableData"));

        let text = out.text();
        let progress: Vec<_> = text.lines().filter(|l| l.starts_with("==> ")).collect();
        assert_eq!(progress.len(), 4);
        assert!(progress[0].starts_with("==> [1/4]"));
        assert!(progress[3].starts_with("==> [4/4]"));
        assert_eq!(text.lines().filter(|l| l.starts_with("$ ")).count(), 2);
    }

    #[tokio::test]
    async fn test_stage1_failure_propagates_exit_code() {
        let dir = project(MANIFEST);
        let runner = Arc::new(RecordingRunner::with_exit_codes(&[3]));

        let run = bootstrap(dir.path(), runner.clone(), SharedBuf::default())
            .run()
            .await
            .unwrap();

        let err = run.result.as_ref().unwrap_err();
        assert!(matches!(
            err,
            KettleError::BuildStage { stage, exit_code: 3 } if stage == "stage1_build"
        ));
        assert_eq!(err.exit_code(), 3);
        assert_eq!(runner.commands().len(), 1);
        assert_eq!(run.stages[2].status, StageStatus::Failed);
        assert_eq!(run.stages[2].exit_code, Some(3));
        assert_eq!(run.stages[3].status, StageStatus::Pending);
    }

    #[tokio::test]
    async fn test_stage2_failure_propagates_exit_code() {
        let dir = project(MANIFEST);
        let runner = Arc::new(RecordingRunner::with_exit_codes(&[0, 70]));

        let err = bootstrap(dir.path(), runner.clone(), SharedBuf::default())
            .execute()
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 70);
        assert_eq!(runner.commands().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_resource_aborts_before_build() {
        let dir = project(
            "INCBIN(Configurable, \"Configurable.os\")\nConfigurable Configurable.os\n",
        );
        let runner = Arc::new(RecordingRunner::default());

        let run = bootstrap(dir.path(), runner.clone(), SharedBuf::default())
            .run()
            .await
            .unwrap();

        assert!(matches!(run.result, Err(KettleError::Bundler(_))));
        assert_eq!(run.result.as_ref().unwrap_err().exit_code(), 1);
        assert!(runner.commands().is_empty());
        assert!(!dir.path().join("out/scripts.c").exists());
        assert_eq!(run.stages[1].status, StageStatus::Failed);
    }

    #[tokio::test]
    async fn test_unsupported_platform_fails_before_any_stage() {
        let dir = project(MANIFEST);
        let runner = Arc::new(RecordingRunner::default());
        let out = SharedBuf::default();

        let result = bootstrap(dir.path(), runner.clone(), out.clone())
            .with_platform(Platform::new(HostOs::Windows, HostArch::Aarch64))
            .run()
            .await;

        assert!(matches!(result, Err(KettleError::Resolution(_))));
        assert!(out.text().is_empty());
        assert!(runner.commands().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_options_rejected() {
        let mut options = KettleOptions::default();
        options.stage2.runner.clear();
        assert!(matches!(
            Bootstrap::new(options),
            Err(KettleError::Config(_))
        ));
    }
}
