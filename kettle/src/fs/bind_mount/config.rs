//! Bind mount configuration.

use std::path::Path;

/// A host directory to expose at `target`.
#[derive(Debug, Clone, Copy)]
pub struct BindMountConfig<'a> {
    pub source: &'a Path,
    pub target: &'a Path,
    /// Also bind submounts below `source` (`MS_REC`).
    pub recursive: bool,
}

impl<'a> BindMountConfig<'a> {
    pub fn new(source: &'a Path, target: &'a Path) -> Self {
        Self {
            source,
            target,
            recursive: true,
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }
}
