//! Bootstrap configuration.
//!
//! Loaded from a JSON file; every field has a default so an empty object
//! (or no file at all) describes the standard project layout:
//!
//! ```text
//! src/*.cpp, src/*.c          compiler sources
//! src/scripts.rc              resource manifest
//! src/icetea-emscripten.js    post-js glue
//! out/                        container source, stage-1 artifact, logs
//! ```

use crate::resources::DEFAULT_CONTAINER_SYMBOL;
use crate::toolchain::DEFAULT_RELEASE_BASE_URL;
use kettle_shared::errors::{KettleError, KettleResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Call-stack allowance for the stage-1 artifact, in KiB.
///
/// The embedded script evaluator recurses deeply; anything below
/// [`StackAllowance::MIN_KIB`] is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct StackAllowance(u32);

impl StackAllowance {
    pub const MIN_KIB: u32 = 1024;
    pub const DEFAULT_KIB: u32 = 2048;

    pub fn new(kib: u32) -> KettleResult<Self> {
        if kib < Self::MIN_KIB {
            return Err(KettleError::Config(format!(
                "stack allowance of {} KiB is below the minimum of {} KiB",
                kib,
                Self::MIN_KIB
            )));
        }
        Ok(Self(kib))
    }

    pub fn kib(self) -> u32 {
        self.0
    }

    /// Runner flag applying the allowance.
    pub fn as_flag(self) -> String {
        format!("--stack-size={}", self.0)
    }
}

impl Default for StackAllowance {
    fn default() -> Self {
        Self(Self::DEFAULT_KIB)
    }
}

impl TryFrom<u32> for StackAllowance {
    type Error = KettleError;

    fn try_from(kib: u32) -> Result<Self, Self::Error> {
        Self::new(kib)
    }
}

impl From<StackAllowance> for u32 {
    fn from(stack: StackAllowance) -> Self {
        stack.0
    }
}

impl fmt::Display for StackAllowance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} KiB", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ToolchainOptions {
    pub version: String,
    pub base_url: String,
    /// Unpacked SDK. Falls back to `$EMSDK`.
    pub sdk_root: Option<PathBuf>,
}

impl Default for ToolchainOptions {
    fn default() -> Self {
        Self {
            version: "latest".to_string(),
            base_url: DEFAULT_RELEASE_BASE_URL.to_string(),
            sdk_root: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ResourceOptions {
    pub manifest: PathBuf,
    /// Generated C source, relative to the output directory.
    pub container: PathBuf,
    pub symbol: String,
}

impl Default for ResourceOptions {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from("src/scripts.rc"),
            container: PathBuf::from("scripts.c"),
            symbol: DEFAULT_CONTAINER_SYMBOL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Stage1Options {
    /// Scanned for `*.cpp` and `*.c` when `sources` is empty.
    pub source_dir: PathBuf,
    pub sources: Vec<PathBuf>,
    pub include_dirs: Vec<PathBuf>,
    pub defines: Vec<String>,
    pub post_js: Option<PathBuf>,
    pub extra_flags: Vec<String>,
    /// Artifact file name inside the output directory.
    pub artifact: String,
}

impl Default for Stage1Options {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("src"),
            sources: Vec::new(),
            include_dirs: vec![PathBuf::from("src")],
            defines: vec![
                "ICETEA_INCBIN_FORCE_EXTERNAL".to_string(),
                "OS_EMSCRIPTEN".to_string(),
            ],
            post_js: Some(PathBuf::from("src/icetea-emscripten.js")),
            extra_flags: Vec::new(),
            artifact: "icetea.js".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Stage2Options {
    pub runner: String,
    /// Arguments between the runner and the stack flag, e.g. `["--", "node"]`
    /// when the runner is `kettle-sandbox`.
    pub runner_args: Vec<String>,
    pub stack_kib: StackAllowance,
    pub args: Vec<String>,
    /// Defaults to the project directory.
    pub working_dir: Option<PathBuf>,
    /// Native artifact the self-build is expected to write.
    pub expected_output: Option<PathBuf>,
}

impl Default for Stage2Options {
    fn default() -> Self {
        Self {
            runner: "node".to_string(),
            runner_args: Vec::new(),
            stack_kib: StackAllowance::default(),
            args: vec!["--target=native".to_string()],
            working_dir: None,
            expected_output: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct KettleOptions {
    pub project_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Directory for `kettle.log`. No file log when unset.
    pub log_dir: Option<PathBuf>,
    pub toolchain: ToolchainOptions,
    pub resources: ResourceOptions,
    pub stage1: Stage1Options,
    pub stage2: Stage2Options,
}

impl Default for KettleOptions {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            output_dir: PathBuf::from("out"),
            log_dir: None,
            toolchain: ToolchainOptions::default(),
            resources: ResourceOptions::default(),
            stage1: Stage1Options::default(),
            stage2: Stage2Options::default(),
        }
    }
}

impl KettleOptions {
    /// Load options from a JSON file. Relative paths resolve against the
    /// file's directory.
    pub fn from_file(path: &Path) -> KettleResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            KettleError::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let options: Self = serde_json::from_str(&text).map_err(|e| {
            KettleError::Config(format!("Invalid config {}: {}", path.display(), e))
        })?;
        let base = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Ok(options.resolve_paths(base))
    }

    /// Resolve relative paths.
    ///
    /// `project_dir` resolves against `base`; the container path against the
    /// output directory; everything else against the project directory.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        self.project_dir = join(base, &self.project_dir);
        let project = self.project_dir.clone();

        self.output_dir = join(&project, &self.output_dir);
        self.log_dir = self.log_dir.map(|p| join(&project, &p));

        self.toolchain.sdk_root = self.toolchain.sdk_root.map(|p| join(&project, &p));

        self.resources.manifest = join(&project, &self.resources.manifest);
        self.resources.container = join(&self.output_dir, &self.resources.container);

        let stage1 = &mut self.stage1;
        stage1.source_dir = join(&project, &stage1.source_dir);
        for path in stage1.sources.iter_mut().chain(stage1.include_dirs.iter_mut()) {
            *path = join(&project, &*path);
        }
        stage1.post_js = stage1.post_js.take().map(|p| join(&project, &p));

        let stage2 = &mut self.stage2;
        stage2.working_dir = Some(
            stage2
                .working_dir
                .take()
                .map_or_else(|| project.clone(), |p| join(&project, &p)),
        );
        stage2.expected_output = stage2.expected_output.take().map(|p| join(&project, &p));

        self
    }

    pub fn validate(&self) -> KettleResult<()> {
        if self.toolchain.version.trim().is_empty() {
            return Err(KettleError::Config(
                "toolchain.version must not be empty".to_string(),
            ));
        }
        if !crate::resources::is_c_identifier(&self.resources.symbol) {
            return Err(KettleError::Config(format!(
                "resources.symbol '{}' is not a valid C identifier",
                self.resources.symbol
            )));
        }

        let artifact = Path::new(&self.stage1.artifact);
        if self.stage1.artifact.is_empty() || artifact.file_name() != Some(artifact.as_os_str()) {
            return Err(KettleError::Config(format!(
                "stage1.artifact '{}' must be a plain file name",
                self.stage1.artifact
            )));
        }

        let mut seen = HashSet::new();
        for define in &self.stage1.defines {
            if define.is_empty() {
                return Err(KettleError::Config("empty stage1 define".to_string()));
            }
            if !seen.insert(define.as_str()) {
                return Err(KettleError::Config(format!(
                    "duplicate stage1 define '{}'",
                    define
                )));
            }
        }

        if self.stage2.runner.trim().is_empty() {
            return Err(KettleError::Config(
                "stage2.runner must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Stage-1 output, `<output_dir>/<artifact>`.
    pub fn artifact_path(&self) -> PathBuf {
        self.output_dir.join(&self.stage1.artifact)
    }
}

fn join(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
