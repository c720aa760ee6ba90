//! Bind mount handle with RAII cleanup.

use kettle_shared::errors::KettleResult;
use std::path::{Path, PathBuf};

/// Handle to a bind mount that unmounts on drop.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
#[derive(Debug)]
pub struct BindMountHandle {
    source: PathBuf,
    target: PathBuf,
    mounted: bool,
}

impl BindMountHandle {
    #[cfg_attr(not(target_os = "linux"), allow(dead_code))]
    pub(super) fn new(source: &Path, target: &Path) -> Self {
        Self {
            source: source.to_path_buf(),
            target: target.to_path_buf(),
            mounted: true,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Explicitly unmount. Called automatically on drop.
    pub fn unmount(mut self) -> KettleResult<()> {
        self.do_unmount()
    }

    fn do_unmount(&mut self) -> KettleResult<()> {
        if !self.mounted {
            return Ok(());
        }
        self.mounted = false;

        #[cfg(target_os = "linux")]
        {
            super::native::unmount(&self.source, &self.target)
        }
        #[cfg(not(target_os = "linux"))]
        {
            Ok(())
        }
    }
}

impl Drop for BindMountHandle {
    fn drop(&mut self) {
        if let Err(e) = self.do_unmount() {
            tracing::warn!(error = %e, "Failed to unmount bind mount on drop");
        }
    }
}
