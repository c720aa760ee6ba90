//! Host platform description used to pick a toolchain release.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostOs {
    Linux,
    Macos,
    Windows,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostArch {
    X86,
    X86_64,
    Aarch64,
    Other,
}

impl HostOs {
    /// Map a `std::env::consts::OS` value.
    pub fn from_consts(os: &str) -> Self {
        match os {
            "linux" => HostOs::Linux,
            "macos" => HostOs::Macos,
            "windows" => HostOs::Windows,
            _ => HostOs::Other,
        }
    }
}

impl HostArch {
    /// Map a `std::env::consts::ARCH` value.
    pub fn from_consts(arch: &str) -> Self {
        match arch {
            "x86" => HostArch::X86,
            "x86_64" => HostArch::X86_64,
            "aarch64" => HostArch::Aarch64,
            _ => HostArch::Other,
        }
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HostOs::Linux => "linux",
            HostOs::Macos => "macos",
            HostOs::Windows => "windows",
            HostOs::Other => "other",
        };
        f.write_str(s)
    }
}

impl fmt::Display for HostArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HostArch::X86 => "x86",
            HostArch::X86_64 => "x86_64",
            HostArch::Aarch64 => "aarch64",
            HostArch::Other => "other",
        };
        f.write_str(s)
    }
}

/// Operating system and CPU architecture pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    pub os: HostOs,
    pub arch: HostArch,
}

impl Platform {
    pub fn new(os: HostOs, arch: HostArch) -> Self {
        Self { os, arch }
    }

    /// Platform of the running process.
    pub fn host() -> Self {
        Self {
            os: HostOs::from_consts(std::env::consts::OS),
            arch: HostArch::from_consts(std::env::consts::ARCH),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_consts() {
        assert_eq!(HostOs::from_consts("linux"), HostOs::Linux);
        assert_eq!(HostOs::from_consts("freebsd"), HostOs::Other);
        assert_eq!(HostArch::from_consts("x86_64"), HostArch::X86_64);
        assert_eq!(HostArch::from_consts("riscv64"), HostArch::Other);
    }

    #[test]
    fn test_host_matches_consts() {
        let host = Platform::host();
        assert_eq!(host.os, HostOs::from_consts(std::env::consts::OS));
        assert_eq!(host.arch, HostArch::from_consts(std::env::consts::ARCH));
    }

    #[test]
    fn test_display() {
        let p = Platform::new(HostOs::Windows, HostArch::X86_64);
        assert_eq!(p.to_string(), "windows-x86_64");
    }
}
