//! Sandbox rooted at a host directory.
//!
//! Host directories are exposed with native bind mounts below `root`. The
//! environment and working directory are recorded for the program the
//! sandbox host runner starts.

use super::{Sandbox, normalize, relative_to_root};
use crate::fs::{BindMountConfig, BindMountHandle, create_bind_mount};
use crate::sandbox::env::EnvironmentSnapshot;
use kettle_shared::errors::{KettleError, KettleResult};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct BindMountSandbox {
    root: PathBuf,
    handles: Vec<BindMountHandle>,
    recursive: bool,
    cwd: PathBuf,
    env: EnvironmentSnapshot,
}

impl BindMountSandbox {
    pub fn new(root: impl Into<PathBuf>) -> KettleResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(KettleError::NotFound(format!(
                "sandbox root {} is not a directory",
                root.display()
            )));
        }
        Ok(Self {
            root,
            handles: Vec::new(),
            recursive: true,
            cwd: PathBuf::from("/"),
            env: EnvironmentSnapshot::default(),
        })
    }

    /// Bind host directories without the filesystems mounted below them.
    pub fn shallow(mut self) -> Self {
        self.recursive = false;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sandbox working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn environment(&self) -> &EnvironmentSnapshot {
        &self.env
    }

    /// Where a sandbox path lives on the host.
    pub fn host_path(&self, sandbox_path: &Path) -> PathBuf {
        let abs = if sandbox_path.is_absolute() {
            normalize(sandbox_path)
        } else {
            normalize(&self.cwd.join(sandbox_path))
        };
        self.root.join(relative_to_root(&abs))
    }

    pub fn mount_count(&self) -> usize {
        self.handles.len()
    }

    /// Unmount everything, newest first. Every mount is attempted; the
    /// first failure is returned.
    pub fn release(&mut self) -> KettleResult<()> {
        let mut first_err = None;
        while let Some(handle) = self.handles.pop() {
            let target = handle.target().to_path_buf();
            if let Err(e) = handle.unmount() {
                tracing::warn!(target = %target.display(), error = %e, "Failed to release sandbox mount");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

impl Sandbox for BindMountSandbox {
    fn install_environment(&mut self, env: &EnvironmentSnapshot) -> KettleResult<()> {
        self.env = env.clone();
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.host_path(path).exists()
    }

    fn mkdir(&mut self, path: &Path) -> KettleResult<()> {
        let target = self.host_path(path);
        std::fs::create_dir(&target).map_err(|e| {
            KettleError::Internal(format!(
                "failed to create sandbox directory {}: {}",
                target.display(),
                e
            ))
        })
    }

    fn bind(&mut self, host_path: &Path, sandbox_path: &Path) -> KettleResult<()> {
        let target = self.host_path(sandbox_path);
        if self.handles.iter().any(|h| h.target() == target) {
            return Err(KettleError::InvalidState(format!(
                "{} is already mounted",
                sandbox_path.display()
            )));
        }
        let config = BindMountConfig::new(host_path, &target).recursive(self.recursive);
        let handle = create_bind_mount(&config)?;
        self.handles.push(handle);
        Ok(())
    }

    fn chdir(&mut self, path: &Path) -> KettleResult<()> {
        let abs = if path.is_absolute() {
            normalize(path)
        } else {
            normalize(&self.cwd.join(path))
        };
        if !self.host_path(&abs).is_dir() {
            return Err(KettleError::NotFound(format!(
                "no such directory in sandbox: {}",
                abs.display()
            )));
        }
        self.cwd = abs;
        Ok(())
    }
}

impl Drop for BindMountSandbox {
    fn drop(&mut self) {
        let _ = self.release();
    }
}
