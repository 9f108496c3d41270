//! Host platform detection
//!
//! Resolves the host OS family and pointer width into a `PlatformProfile`.
//! Only 64-bit hosts are supported: the native libraries ship no 32-bit
//! artifacts.

use serde::Serialize;
use std::env;
use std::fmt;
use thiserror::Error;

/// Pointer width every supported host must have
pub const REQUIRED_POINTER_WIDTH: u32 = 64;

/// Errors raised while resolving the host profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("only 64-bit hosts are supported (detected {bits}-bit)")]
    UnsupportedArchitecture { bits: u32 },
}

/// Operating system families the build distinguishes
///
/// Every dispatch site matches this enum exhaustively, so adding a family
/// fails to compile until each site decides what to do with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlatformFamily {
    Windows,
    MacOs,
    Linux,
    OtherPosix,
}

impl PlatformFamily {
    /// Map a Rust OS identifier (`std::env::consts::OS`) to a family.
    ///
    /// Cygwin counts as Windows; anything that is not Windows, macOS or
    /// Linux is treated as some other POSIX system.
    #[must_use]
    pub fn from_os(os: &str) -> Self {
        match os {
            "windows" | "cygwin" => Self::Windows,
            "macos" => Self::MacOs,
            "linux" => Self::Linux,
            _ => Self::OtherPosix,
        }
    }

    /// Whether native builds run through POSIX shell scripts
    #[must_use]
    pub const fn is_posix(self) -> bool {
        match self {
            Self::Windows => false,
            Self::MacOs | Self::Linux | Self::OtherPosix => true,
        }
    }

    /// Stable lowercase name used on the command line and in JSON output
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::MacOs => "macos",
            Self::Linux => "linux",
            Self::OtherPosix => "other-posix",
        }
    }
}

impl fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable description of the build host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlatformProfile {
    /// OS family
    pub family: PlatformFamily,
    /// Pointer width of the running process, in bits
    pub pointer_width_bits: u32,
}

impl PlatformProfile {
    /// Resolve the profile of the running host.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedArchitecture` on hosts that are not 64-bit.
    pub fn resolve() -> Result<Self, PlatformError> {
        Self::resolve_from(env::consts::OS, usize::BITS)
    }

    /// Resolve a profile from an explicit OS identifier and pointer width.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedArchitecture` when `pointer_width_bits` is not 64.
    pub fn resolve_from(os: &str, pointer_width_bits: u32) -> Result<Self, PlatformError> {
        if pointer_width_bits != REQUIRED_POINTER_WIDTH {
            return Err(PlatformError::UnsupportedArchitecture {
                bits: pointer_width_bits,
            });
        }

        Ok(Self {
            family: PlatformFamily::from_os(os),
            pointer_width_bits,
        })
    }

    /// A 64-bit profile for the given family, used for simulated hosts
    #[must_use]
    pub const fn simulated(family: PlatformFamily) -> Self {
        Self {
            family,
            pointer_width_bits: REQUIRED_POINTER_WIDTH,
        }
    }
}

impl fmt::Display for PlatformProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}-bit)", self.family, self.pointer_width_bits)
    }
}
