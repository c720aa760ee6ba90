//! Sandbox backends.
//!
//! A backend is the sandbox side of the bridge: its environment namespace,
//! its virtual filesystem and its working directory.
//!
//! - `MemorySandbox` - in-memory node tree with a host mount table
//! - `BindMountSandbox` - a host directory populated with native bind mounts

mod bind;
mod memory;

pub use bind::BindMountSandbox;
pub use memory::MemorySandbox;

use super::env::EnvironmentSnapshot;
use kettle_shared::errors::KettleResult;
use std::path::{Component, Path, PathBuf};

pub trait Sandbox {
    /// Replace the sandbox environment with `env`, all at once.
    fn install_environment(&mut self, env: &EnvironmentSnapshot) -> KettleResult<()>;

    fn exists(&self, path: &Path) -> bool;

    /// Create a single directory node. The parent must exist.
    fn mkdir(&mut self, path: &Path) -> KettleResult<()>;

    /// Expose `host_path` at `sandbox_path`, read/write.
    fn bind(&mut self, host_path: &Path, sandbox_path: &Path) -> KettleResult<()>;

    fn chdir(&mut self, path: &Path) -> KettleResult<()>;
}

/// Lexically normalize an absolute sandbox path. `..` above the root stays
/// at the root.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::from("/");
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::ParentDir => {
                out.pop();
            }
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }
    out
}

/// `path` relative to the sandbox root, for joining onto a host directory.
pub(crate) fn relative_to_root(path: &Path) -> PathBuf {
    normalize(path)
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect()
}
