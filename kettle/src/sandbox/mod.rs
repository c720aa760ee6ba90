//! Sandbox bridge.
//!
//! Everything a program needs to run inside a sandbox as if it ran on the
//! host:
//!
//! 1. The host environment is copied in wholesale ([`EnvironmentSnapshot`]).
//! 2. Each directory at the host root is bind-mounted at the same path
//!    ([`mount_entry`], one [`MountPoint`] per root entry).
//! 3. The sandbox working directory follows the host working directory.
//! 4. The [`EntryPoint`] runs with the original arguments, then its
//!    post-run hook.
//!
//! Mounting is best-effort per entry. Everything else is fatal.

mod backend;
mod bridge;
mod entry;
mod env;
mod host;
mod log;
mod mount;

pub use backend::{BindMountSandbox, MemorySandbox, Sandbox};
pub use bridge::{BridgeOptions, BridgeReport, SandboxBridge, VERBOSE_ENV};
pub use entry::{EntryPoint, FnEntry, ProcessEntry, SPAWN_FAILURE_EXIT_CODE};
pub use env::EnvironmentSnapshot;
pub use host::{EntryKind, HostEntry, HostFs, OsHostFs};
pub use log::{DebugLog, LOG_TAG};
pub use mount::{MountOutcome, MountPoint, MountReport, SkipReason, mount_all, mount_entry};
