//! Host root mount loop.
//!
//! [`mount_entry`] handles exactly one host root entry and always yields a
//! [`MountPoint`]. Failures are recorded in the outcome; nothing here aborts
//! the loop.

use super::backend::Sandbox;
use super::host::HostEntry;
use super::log::DebugLog;
use kettle_shared::errors::KettleResult;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Files, symlinks and special entries are never mounted.
    NotADirectory,
    /// mkdir or bind failed.
    Failed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotADirectory => write!(f, "not a directory"),
            SkipReason::Failed(reason) => write!(f, "{}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountOutcome {
    Mounted,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPoint {
    pub host_path: PathBuf,
    pub sandbox_path: PathBuf,
    pub outcome: MountOutcome,
}

impl MountPoint {
    pub fn is_mounted(&self) -> bool {
        self.outcome == MountOutcome::Mounted
    }
}

/// One record per host root entry, in mount order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountReport {
    points: Vec<MountPoint>,
}

impl MountReport {
    pub fn points(&self) -> &[MountPoint] {
        &self.points
    }

    pub fn mounted(&self) -> impl Iterator<Item = &MountPoint> {
        self.points.iter().filter(|p| p.is_mounted())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &MountPoint> {
        self.points.iter().filter(|p| !p.is_mounted())
    }

    pub fn find(&self, sandbox_path: &Path) -> Option<&MountPoint> {
        self.points.iter().find(|p| p.sandbox_path == sandbox_path)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromIterator<MountPoint> for MountReport {
    fn from_iter<I: IntoIterator<Item = MountPoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

/// Mount a single host root entry at `/<name>` inside the sandbox.
pub fn mount_entry<S: Sandbox + ?Sized>(
    sandbox: &mut S,
    entry: &HostEntry,
    log: &mut DebugLog,
) -> MountPoint {
    let sandbox_path = Path::new("/").join(&entry.name);

    if !entry.is_dir() {
        log.line(format_args!("skipping {} ({:?})", entry.path.display(), entry.kind));
        return MountPoint {
            host_path: entry.path.clone(),
            sandbox_path,
            outcome: MountOutcome::Skipped(SkipReason::NotADirectory),
        };
    }

    log.line(format_args!(
        "mounting {} at {}",
        entry.path.display(),
        sandbox_path.display()
    ));
    let outcome = match attach(sandbox, &entry.path, &sandbox_path) {
        Ok(()) => {
            log.line(format_args!("mounted {}", sandbox_path.display()));
            MountOutcome::Mounted
        }
        Err(e) => {
            log.line(format_args!(
                "failed to mount {}: {}",
                entry.path.display(),
                e
            ));
            MountOutcome::Skipped(SkipReason::Failed(e.to_string()))
        }
    };

    MountPoint {
        host_path: entry.path.clone(),
        sandbox_path,
        outcome,
    }
}

fn attach<S: Sandbox + ?Sized>(sandbox: &mut S, host: &Path, target: &Path) -> KettleResult<()> {
    if !sandbox.exists(target) {
        sandbox.mkdir(target)?;
    }
    sandbox.bind(host, target)
}

/// Run [`mount_entry`] over `entries` in the given order.
pub fn mount_all<S: Sandbox + ?Sized>(
    sandbox: &mut S,
    entries: &[HostEntry],
    log: &mut DebugLog,
) -> MountReport {
    entries
        .iter()
        .map(|entry| mount_entry(sandbox, entry, log))
        .collect()
}
