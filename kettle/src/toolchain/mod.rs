//! Toolchain resolution and provisioning.
//!
//! - `platform` - host OS/architecture detection
//! - `release` - pure release descriptor resolution (download URL template)
//! - `source` - pluggable providers that yield an installed toolchain

mod platform;
mod release;
mod source;

pub use platform::{HostArch, HostOs, Platform};
pub use release::{DEFAULT_RELEASE_BASE_URL, ToolchainRelease, resolve_release};
pub use source::{InstalledToolchain, LocalToolchain, SDK_ROOT_ENV, ToolchainSource};
