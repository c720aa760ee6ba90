//! Host filesystem view used by the bridge.

use kettle_shared::errors::{KettleError, KettleResult};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
    /// Not followed; a symlink to a directory is still a symlink.
    Symlink,
    Other,
}

/// One immediate entry of the host root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEntry {
    /// Raw file name; not required to be UTF-8.
    pub name: OsString,
    pub path: PathBuf,
    pub kind: EntryKind,
}

impl HostEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

pub trait HostFs {
    /// Immediate entries of the host root.
    fn list_root(&self) -> KettleResult<Vec<HostEntry>>;

    /// Working directory of the host process.
    fn current_dir(&self) -> KettleResult<PathBuf>;
}

/// The real host filesystem.
#[derive(Debug, Clone)]
pub struct OsHostFs {
    root: PathBuf,
}

impl OsHostFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for OsHostFs {
    fn default() -> Self {
        Self::new("/")
    }
}

impl HostFs for OsHostFs {
    fn list_root(&self) -> KettleResult<Vec<HostEntry>> {
        let dir = std::fs::read_dir(&self.root).map_err(|e| {
            KettleError::Internal(format!(
                "failed to list host root {}: {}",
                self.root.display(),
                e
            ))
        })?;

        let mut entries = Vec::new();
        for entry in dir {
            let entry = entry.map_err(|e| {
                KettleError::Internal(format!(
                    "failed to read entry of {}: {}",
                    self.root.display(),
                    e
                ))
            })?;
            // file_type() does not follow symlinks. An unreadable type still
            // yields a record so the entry is reported, not dropped.
            let kind = match entry.file_type() {
                Ok(ft) if ft.is_symlink() => EntryKind::Symlink,
                Ok(ft) if ft.is_dir() => EntryKind::Directory,
                Ok(ft) if ft.is_file() => EntryKind::File,
                _ => EntryKind::Other,
            };
            entries.push(HostEntry {
                name: entry.file_name(),
                path: entry.path(),
                kind,
            });
        }
        Ok(entries)
    }

    fn current_dir(&self) -> KettleResult<PathBuf> {
        std::env::current_dir().map_err(|e| {
            KettleError::Internal(format!("failed to read host working directory: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_root_classifies_entries() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("home")).unwrap();
        std::fs::write(dir.path().join("etc.conf"), b"x=1").unwrap();
        #[cfg(unix)]
        std::os::unix::fs::symlink(dir.path().join("home"), dir.path().join("link")).unwrap();

        let host = OsHostFs::new(dir.path());
        let mut entries = host.list_root().unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        let home = entries.iter().find(|e| e.name == "home").unwrap();
        assert!(home.is_dir());
        assert_eq!(home.path, dir.path().join("home"));
        let conf = entries.iter().find(|e| e.name == "etc.conf").unwrap();
        assert_eq!(conf.kind, EntryKind::File);
        #[cfg(unix)]
        {
            let link = entries.iter().find(|e| e.name == "link").unwrap();
            assert_eq!(link.kind, EntryKind::Symlink);
            assert_eq!(entries.len(), 3);
        }
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let host = OsHostFs::new(dir.path().join("missing"));
        assert!(host.list_root().is_err());
    }

    #[test]
    fn test_current_dir() {
        let host = OsHostFs::default();
        assert_eq!(host.current_dir().unwrap(), std::env::current_dir().unwrap());
        assert_eq!(host.root(), Path::new("/"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_name_kept_verbatim() {
        use std::os::unix::ffi::{OsStrExt, OsStringExt};

        let dir = TempDir::new().unwrap();
        let raw = std::ffi::OsStr::from_bytes(b"data\xff");
        // Some filesystems reject invalid UTF-8 names.
        if std::fs::create_dir(dir.path().join(raw)).is_err() {
            return;
        }

        let entries = OsHostFs::new(dir.path()).list_root().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name.clone().into_vec(), b"data\xff");
        assert_eq!(entries[0].path, dir.path().join(raw));
    }
}
