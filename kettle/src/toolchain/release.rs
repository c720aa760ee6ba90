//! Toolchain release resolution.
//!
//! Pure computation: turns a platform and version into the download URL of
//! the portable SDK. Nothing is fetched here.

use super::platform::{HostArch, HostOs, Platform};
use kettle_shared::errors::{KettleError, KettleResult};
use serde::{Deserialize, Serialize};

/// Default location of portable SDK archives.
pub const DEFAULT_RELEASE_BASE_URL: &str =
    "https://s3.amazonaws.com/mozilla-games/emscripten/releases";

/// Resolved toolchain release. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainRelease {
    pub os: HostOs,
    pub arch: HostArch,
    pub version: String,
    pub download_url: String,
}

impl ToolchainRelease {
    pub fn platform(&self) -> Platform {
        Platform::new(self.os, self.arch)
    }
}

/// Resolve the release descriptor for `platform`.
///
/// Windows archives are versioned and carry the pointer width in their name.
/// Unix hosts share a single architecture-neutral archive.
pub fn resolve_release(
    platform: Platform,
    version: &str,
    base_url: &str,
) -> KettleResult<ToolchainRelease> {
    let version = version.trim();
    if version.is_empty() {
        return Err(KettleError::Resolution(
            "toolchain version must not be empty".to_string(),
        ));
    }

    let base = base_url.trim_end_matches('/');
    let archive = archive_name(platform, version)?;

    let release = ToolchainRelease {
        os: platform.os,
        arch: platform.arch,
        version: version.to_string(),
        download_url: format!("{}/{}", base, archive),
    };

    tracing::debug!(
        platform = %platform,
        version = %release.version,
        url = %release.download_url,
        "Resolved toolchain release"
    );

    Ok(release)
}

fn archive_name(platform: Platform, version: &str) -> KettleResult<String> {
    match (platform.os, platform.arch) {
        (HostOs::Windows, HostArch::X86_64) => Ok(format!("emsdk-{}-portable-64bit.zip", version)),
        (HostOs::Windows, HostArch::X86) => Ok(format!("emsdk-{}-portable-32bit.zip", version)),
        (HostOs::Linux, HostArch::X86 | HostArch::X86_64 | HostArch::Aarch64)
        | (HostOs::Macos, HostArch::X86_64 | HostArch::Aarch64) => {
            Ok("emsdk-portable.tar.gz".to_string())
        }
        _ => Err(KettleError::Resolution(format!(
            "no portable toolchain for {}",
            platform
        ))),
    }
}
