//! Native bind mount using mount(2) syscall.
//!
//! Requires CAP_SYS_ADMIN in the current mount namespace.

use kettle_shared::errors::{KettleError, KettleResult};
use nix::mount::{MntFlags, MsFlags, mount, umount2};
use std::path::Path;
use tracing::debug;

use super::BindMountConfig;

pub(super) fn create(config: &BindMountConfig) -> KettleResult<()> {
    let source = config.source;
    let target = config.target;

    bind(source, target, config.recursive)?;
    set_slave_propagation(source, target)?;

    debug!(
        source = %source.display(),
        target = %target.display(),
        recursive = config.recursive,
        "Native bind mount created"
    );
    Ok(())
}

pub(super) fn unmount(source: &Path, target: &Path) -> KettleResult<()> {
    umount2(target, MntFlags::MNT_DETACH).map_err(|e| mount_error(source, "unmount", target, e))?;
    debug!(target = %target.display(), "Native bind mount unmounted");
    Ok(())
}

fn mount_error(source: &Path, op: &str, target: &Path, e: nix::Error) -> KettleError {
    KettleError::Mount {
        host_path: source.to_path_buf(),
        reason: format!("{} at {} failed: {}", op, target.display(), e),
    }
}

fn bind(source: &Path, target: &Path, recursive: bool) -> KettleResult<()> {
    let mut flags = MsFlags::MS_BIND;
    if recursive {
        flags |= MsFlags::MS_REC;
    }
    mount(Some(source), target, None::<&str>, flags, None::<&str>)
        .map_err(|e| mount_error(source, "bind", target, e))
}

// Keep host mount events flowing in, but never leak sandbox unmounts back.
fn set_slave_propagation(source: &Path, target: &Path) -> KettleResult<()> {
    mount(
        None::<&str>,
        target,
        None::<&str>,
        MsFlags::MS_SLAVE | MsFlags::MS_REC,
        None::<&str>,
    )
    .map_err(|e| {
        let _ = umount2(target, MntFlags::MNT_DETACH);
        mount_error(source, "set slave propagation", target, e)
    })
}
