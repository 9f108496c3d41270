//! Build stage, result and error types
//!
//! Every pipeline stage reports a `BuildResult`. Fatal conditions are
//! `BuildError`s; the coordinator stops at the first one.

use super::link_spec::LinkSpec;
use crate::platform::{PlatformError, PlatformFamily, PlatformProfile};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Host platform and architecture detection
    Platform,
    /// Build of one native library project
    NativeLibrary(String),
    /// Include/library path and flag resolution
    LinkSpec,
    /// Translation, compilation and linking of the extension module
    ExtensionCompile,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Platform => f.write_str("platform"),
            Self::NativeLibrary(name) => write!(f, "native library `{name}`"),
            Self::LinkSpec => f.write_str("link spec"),
            Self::ExtensionCompile => f.write_str("extension compile"),
        }
    }
}

/// Result of one pipeline stage
#[derive(Debug, Clone)]
pub struct BuildResult {
    /// Stage that produced this result
    pub stage: Stage,

    /// Whether the stage succeeded
    pub success: bool,

    /// Stage duration
    pub duration: Duration,

    /// Error message if failed
    pub error: Option<String>,

    /// Captured process output (stdout + stderr)
    pub output: String,
}

impl BuildResult {
    /// Create a successful stage result
    #[must_use]
    pub const fn success(stage: Stage, duration: Duration, output: String) -> Self {
        Self {
            stage,
            success: true,
            duration,
            error: None,
            output,
        }
    }

    /// Create a failed stage result
    #[must_use]
    pub const fn failure(stage: Stage, duration: Duration, error: String, output: String) -> Self {
        Self {
            stage,
            success: false,
            duration,
            error: Some(error),
            output,
        }
    }
}

/// Everything a completed build produced
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Host profile the build ran against
    pub profile: PlatformProfile,
    /// Link spec handed to the extension compiler
    pub link_spec: LinkSpec,
    /// One result per stage, in execution order
    pub results: Vec<BuildResult>,
}

impl BuildReport {
    /// Total wall time across all stages
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.results.iter().map(|r| r.duration).sum()
    }

    /// Names of the native libraries that were built, in build order
    #[must_use]
    pub fn native_libraries(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter_map(|r| match &r.stage {
                Stage::NativeLibrary(name) => Some(name.as_str()),
                Stage::Platform | Stage::LinkSpec | Stage::ExtensionCompile => None,
            })
            .collect()
    }
}

/// Fatal build errors
///
/// None of these are retried: native toolchain and link failures are
/// deterministic configuration problems.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("only 64-bit hosts are supported (detected {bits}-bit)")]
    UnsupportedArchitecture { bits: u32 },

    #[error("no link policy for platform family `{family}`")]
    UnsupportedPlatform { family: PlatformFamily },

    #[error("native library `{project}` failed to build: {reason}")]
    NativeLibraryBuildFailure {
        project: String,
        reason: String,
        output: String,
    },

    #[error("could not locate the numpy include directory: {reason}")]
    NumpyIncludeNotFound { reason: String },

    #[error("extension `{module}` failed to compile: {reason}")]
    ExtensionCompileFailure {
        module: String,
        reason: String,
        output: String,
    },
}

impl BuildError {
    /// Captured tool output attached to the error, if any
    #[must_use]
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::NativeLibraryBuildFailure { output, .. }
            | Self::ExtensionCompileFailure { output, .. } => {
                (!output.trim().is_empty()).then_some(output.as_str())
            }
            Self::UnsupportedArchitecture { .. }
            | Self::UnsupportedPlatform { .. }
            | Self::NumpyIncludeNotFound { .. } => None,
        }
    }

    /// Stage the error belongs to
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Self::UnsupportedArchitecture { .. } => Stage::Platform,
            Self::NativeLibraryBuildFailure { project, .. } => Stage::NativeLibrary(project.clone()),
            Self::UnsupportedPlatform { .. } | Self::NumpyIncludeNotFound { .. } => Stage::LinkSpec,
            Self::ExtensionCompileFailure { .. } => Stage::ExtensionCompile,
        }
    }
}

impl From<PlatformError> for BuildError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::UnsupportedArchitecture { bits } => Self::UnsupportedArchitecture { bits },
        }
    }
}
