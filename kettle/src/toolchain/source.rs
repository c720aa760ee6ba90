//! Toolchain source providers.
//!
//! A source turns a resolved [`ToolchainRelease`] into an installed toolchain
//! the build stages can invoke. Downloading is not done here; the provided
//! implementation uses an SDK that is already unpacked on disk.

use super::platform::HostOs;
use super::release::ToolchainRelease;
use async_trait::async_trait;
use kettle_shared::errors::{KettleError, KettleResult};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable pointing at an unpacked SDK.
pub const SDK_ROOT_ENV: &str = "EMSDK";

/// A toolchain ready for stage commands.
#[derive(Debug, Clone)]
pub struct InstalledToolchain {
    pub release: ToolchainRelease,
    pub root: PathBuf,
    /// Compiler driver executable.
    pub compiler: PathBuf,
    /// Variables exported to every stage command.
    pub env: Vec<(String, String)>,
}

/// Provides an installed toolchain for a release.
#[async_trait]
pub trait ToolchainSource: Send + Sync {
    async fn provide(&self, release: &ToolchainRelease) -> KettleResult<InstalledToolchain>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// Toolchain already installed in a local directory.
#[derive(Debug, Clone, Default)]
pub struct LocalToolchain {
    root: Option<PathBuf>,
}

impl LocalToolchain {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    fn sdk_root(&self) -> KettleResult<PathBuf> {
        if let Some(root) = &self.root {
            return Ok(root.clone());
        }
        std::env::var_os(SDK_ROOT_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| {
                KettleError::Config(format!(
                    "no toolchain root configured and {} is not set",
                    SDK_ROOT_ENV
                ))
            })
    }
}

#[async_trait]
impl ToolchainSource for LocalToolchain {
    async fn provide(&self, release: &ToolchainRelease) -> KettleResult<InstalledToolchain> {
        let root = self.sdk_root()?;
        if !root.is_dir() {
            return Err(KettleError::NotFound(format!(
                "toolchain root {} (expected an unpacked archive from {})",
                root.display(),
                release.download_url
            )));
        }

        let compiler = locate_compiler(&root, release)?;
        let env = toolchain_env(&root, &compiler)?;

        tracing::info!(
            root = %root.display(),
            compiler = %compiler.display(),
            version = %release.version,
            "Using local toolchain"
        );

        Ok(InstalledToolchain {
            release: release.clone(),
            root,
            compiler,
            env,
        })
    }

    fn name(&self) -> &str {
        "local"
    }
}

fn compiler_file_name(os: HostOs) -> &'static str {
    match os {
        HostOs::Windows => "emcc.bat",
        _ => "emcc",
    }
}

/// Find the compiler driver inside an unpacked SDK.
fn locate_compiler(root: &Path, release: &ToolchainRelease) -> KettleResult<PathBuf> {
    let file = compiler_file_name(release.os);
    let candidates = [
        root.join(file),
        root.join("emscripten").join(&release.version).join(file),
        root.join("upstream").join("emscripten").join(file),
    ];

    candidates
        .iter()
        .find(|c| c.is_file())
        .cloned()
        .ok_or_else(|| {
            KettleError::NotFound(format!(
                "compiler '{}' not found under {}",
                file,
                root.display()
            ))
        })
}

fn toolchain_env(root: &Path, compiler: &Path) -> KettleResult<Vec<(String, String)>> {
    let mut dirs: Vec<PathBuf> = vec![root.to_path_buf()];
    if let Some(parent) = compiler.parent()
        && parent != root
    {
        dirs.push(parent.to_path_buf());
    }
    if let Some(existing) = std::env::var_os("PATH") {
        dirs.extend(std::env::split_paths(&existing));
    }

    let path: OsString = std::env::join_paths(dirs)
        .map_err(|e| KettleError::Config(format!("invalid toolchain PATH entry: {}", e)))?;

    Ok(vec![
        (SDK_ROOT_ENV.to_string(), root.to_string_lossy().into_owned()),
        ("PATH".to_string(), path.to_string_lossy().into_owned()),
    ])
}
