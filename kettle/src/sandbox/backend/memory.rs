//! In-memory sandbox.
//!
//! Directory nodes live in memory; mounted subtrees resolve to host paths
//! and are not inspected until used.

use super::{Sandbox, normalize};
use crate::sandbox::env::EnvironmentSnapshot;
use kettle_shared::errors::{KettleError, KettleResult};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct MemorySandbox {
    dirs: BTreeSet<PathBuf>,
    /// sandbox path -> host path
    mounts: BTreeMap<PathBuf, PathBuf>,
    cwd: PathBuf,
    env: EnvironmentSnapshot,
}

impl Default for MemorySandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySandbox {
    /// Empty sandbox containing only `/`.
    pub fn new() -> Self {
        Self {
            dirs: BTreeSet::from([PathBuf::from("/")]),
            mounts: BTreeMap::new(),
            cwd: PathBuf::from("/"),
            env: EnvironmentSnapshot::default(),
        }
    }

    /// Sandbox pre-populated with the usual runtime directories
    /// (`/tmp`, `/home/web_user`, `/dev`).
    pub fn with_default_layout() -> Self {
        let mut sandbox = Self::new();
        for dir in ["/tmp", "/home", "/home/web_user", "/dev"] {
            sandbox.dirs.insert(PathBuf::from(dir));
        }
        sandbox.cwd = PathBuf::from("/home/web_user");
        sandbox
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn environment(&self) -> &EnvironmentSnapshot {
        &self.env
    }

    pub fn mounts(&self) -> &BTreeMap<PathBuf, PathBuf> {
        &self.mounts
    }

    pub fn is_mount_point(&self, path: &Path) -> bool {
        self.mounts.contains_key(&self.absolute(path))
    }

    /// Host path backing `path`, if it lies inside a mount.
    pub fn resolve(&self, path: &Path) -> Option<PathBuf> {
        let path = self.absolute(path);
        let (mount, host) = self.covering_mount(&path)?;
        let rest = path.strip_prefix(mount).ok()?;
        Some(if rest.as_os_str().is_empty() {
            host.clone()
        } else {
            host.join(rest)
        })
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            normalize(path)
        } else {
            normalize(&self.cwd.join(path))
        }
    }

    /// Deepest mount containing `path`.
    fn covering_mount(&self, path: &Path) -> Option<(&PathBuf, &PathBuf)> {
        self.mounts
            .iter()
            .filter(|(mount, _)| path.starts_with(mount))
            .max_by_key(|(mount, _)| mount.components().count())
    }
}

impl Sandbox for MemorySandbox {
    fn install_environment(&mut self, env: &EnvironmentSnapshot) -> KettleResult<()> {
        self.env = env.clone();
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let path = self.absolute(path);
        self.dirs.contains(&path) || self.covering_mount(&path).is_some()
    }

    fn mkdir(&mut self, path: &Path) -> KettleResult<()> {
        let path = self.absolute(path);
        if self.covering_mount(&path).is_some() {
            return Err(KettleError::Unsupported(format!(
                "cannot create {} inside a mounted host directory",
                path.display()
            )));
        }
        if self.dirs.contains(&path) {
            return Err(KettleError::InvalidState(format!(
                "{} already exists",
                path.display()
            )));
        }
        let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
        if !self.dirs.contains(&parent) {
            return Err(KettleError::NotFound(format!(
                "parent of {} does not exist",
                path.display()
            )));
        }
        self.dirs.insert(path);
        Ok(())
    }

    fn bind(&mut self, host_path: &Path, sandbox_path: &Path) -> KettleResult<()> {
        let target = self.absolute(sandbox_path);
        if self.mounts.contains_key(&target) {
            return Err(KettleError::InvalidState(format!(
                "{} is already mounted",
                target.display()
            )));
        }
        if self.covering_mount(&target).is_some() {
            return Err(KettleError::Unsupported(format!(
                "nested mount at {}",
                target.display()
            )));
        }
        if !self.dirs.contains(&target) {
            return Err(KettleError::NotFound(format!(
                "mount target {} is not a directory",
                target.display()
            )));
        }
        self.mounts.insert(target, host_path.to_path_buf());
        Ok(())
    }

    fn chdir(&mut self, path: &Path) -> KettleResult<()> {
        let path = self.absolute(path);
        if !self.exists(&path) {
            return Err(KettleError::NotFound(format!(
                "no such directory in sandbox: {}",
                path.display()
            )));
        }
        self.cwd = path;
        Ok(())
    }
}
