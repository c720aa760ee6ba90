//! Bind mount implementation.
//!
//! Native mount(2) bind mounts on Linux. Other platforms report
//! `Unsupported`, which the sandbox bridge records as a skipped mount.

use kettle_shared::errors::{KettleError, KettleResult};

pub use config::BindMountConfig;
pub use handle::BindMountHandle;

mod config;
mod handle;

#[cfg(target_os = "linux")]
mod native;

/// Create a bind mount from `config.source` onto an existing `config.target`.
#[cfg(target_os = "linux")]
pub fn create_bind_mount(config: &BindMountConfig) -> KettleResult<BindMountHandle> {
    validate_config(config)?;
    native::create(config)?;
    Ok(BindMountHandle::new(config.source, config.target))
}

#[cfg(not(target_os = "linux"))]
pub fn create_bind_mount(config: &BindMountConfig) -> KettleResult<BindMountHandle> {
    validate_config(config)?;
    Err(KettleError::Unsupported(
        "Bind mounts are only supported on Linux".to_string(),
    ))
}

fn validate_config(config: &BindMountConfig) -> KettleResult<()> {
    if !config.source.is_dir() {
        return Err(KettleError::Mount {
            host_path: config.source.to_path_buf(),
            reason: "bind mount source is not a directory".to_string(),
        });
    }
    if !config.target.is_dir() {
        return Err(KettleError::Mount {
            host_path: config.source.to_path_buf(),
            reason: format!(
                "bind mount target {} is not a directory",
                config.target.display()
            ),
        });
    }
    Ok(())
}
