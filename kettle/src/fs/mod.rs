//! Filesystem utilities for host-side operations.

mod bind_mount;

pub use bind_mount::{BindMountConfig, BindMountHandle, create_bind_mount};
