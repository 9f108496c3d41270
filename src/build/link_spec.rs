//! Link spec resolution
//!
//! Maps a platform profile to the include directories, library directories,
//! libraries and extra flags the extension needs. The per-platform values
//! come from a static policy table that encodes real toolchain and ABI
//! constraints:
//!
//! - Windows links import libraries and must drop the default static C
//!   runtime (`LIBCMT`), which collides with the statically linked Fortran
//!   runtime.
//! - POSIX hosts link the static archives directly and must name the Fortran
//!   runtime, math, quad-precision, zlib and C++ runtime libraries, because
//!   linkers do not pull those in transitively from static archives.

use super::context::BuildContext;
use super::runner::{CommandRunner, CommandSpec};
use super::types::BuildError;
use crate::paths;
use crate::platform::{PlatformFamily, PlatformProfile};
use serde::Serialize;
use std::path::PathBuf;

/// Linker flag that keeps the default static C runtime out of Windows links
pub const DISABLE_DEFAULT_CRT: &str = "/NODEFAULTLIB:LIBCMT";

/// Python snippet printing the numpy C header directory
pub const NUMPY_INCLUDE_PROBE: &str = "import numpy; print(numpy.get_include())";

/// Everything the compiler and linker need for the extension
///
/// Order matters in every list: directory order is search precedence and
/// library order is link order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkSpec {
    pub include_dirs: Vec<PathBuf>,
    pub library_dirs: Vec<PathBuf>,
    pub libraries: Vec<String>,
    pub extra_compile_args: Vec<String>,
    pub extra_link_args: Vec<String>,
}

/// One row of the policy table
#[derive(Debug)]
struct LinkPolicy {
    include_dirs: &'static [&'static str],
    library_dirs: &'static [&'static str],
    libraries: &'static [&'static str],
    extra_compile_args: &'static [&'static str],
    extra_link_args: &'static [&'static str],
}

static WINDOWS_POLICY: LinkPolicy = LinkPolicy {
    include_dirs: &[paths::DSS_HEADERS, paths::GRID_HEADERS, paths::ZLIB_DIR],
    library_dirs: &[paths::DSS_WIN64_LIB, paths::GRID_BUILD, paths::ZLIB_DIR],
    libraries: &["heclib_c", "heclib_f", "zlibstatic", "grid"],
    extra_compile_args: &[],
    extra_link_args: &[DISABLE_DEFAULT_CRT],
};

// `:name` asks the GNU linker for that exact archive file
static POSIX_POLICY: LinkPolicy = LinkPolicy {
    include_dirs: &[paths::DSS_HEADERS, paths::GRID_HEADERS],
    library_dirs: &[paths::DSS_LINUX64_LIB, paths::GRID_BUILD],
    libraries: &[
        ":heclib.a",
        ":grid.a",
        "gfortran",
        "pthread",
        "m",
        "quadmath",
        "z",
        "stdc++",
    ],
    extra_compile_args: &[],
    extra_link_args: &[],
};

fn policy_for(family: PlatformFamily) -> Option<&'static LinkPolicy> {
    match family {
        PlatformFamily::Windows => Some(&WINDOWS_POLICY),
        PlatformFamily::Linux | PlatformFamily::MacOs => Some(&POSIX_POLICY),
        PlatformFamily::OtherPosix => None,
    }
}

fn owned_paths(items: &[&str]) -> Vec<PathBuf> {
    items.iter().map(PathBuf::from).collect()
}

fn owned_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

/// Resolves link specs from the policy table
#[derive(Debug, Clone)]
pub struct LinkSpecResolver {
    /// numpy C header directory, appended to every include list
    numpy_include: PathBuf,
}

impl LinkSpecResolver {
    #[must_use]
    pub fn new(numpy_include: impl Into<PathBuf>) -> Self {
        Self {
            numpy_include: numpy_include.into(),
        }
    }

    /// Resolve the link spec for a platform.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedPlatform` for families without a policy row.
    /// There is no fallback policy.
    pub fn resolve(&self, profile: &PlatformProfile) -> Result<LinkSpec, BuildError> {
        let policy = policy_for(profile.family).ok_or(BuildError::UnsupportedPlatform {
            family: profile.family,
        })?;

        let mut include_dirs = owned_paths(policy.include_dirs);
        include_dirs.push(self.numpy_include.clone());

        Ok(LinkSpec {
            include_dirs,
            library_dirs: owned_paths(policy.library_dirs),
            libraries: owned_strings(policy.libraries),
            extra_compile_args: owned_strings(policy.extra_compile_args),
            extra_link_args: owned_strings(policy.extra_link_args),
        })
    }
}

/// Ask the Python interpreter where numpy keeps its C headers.
///
/// # Errors
///
/// Returns `NumpyIncludeNotFound` if the interpreter cannot be started,
/// numpy is not importable, or nothing is printed.
pub fn discover_numpy_include(
    runner: &dyn CommandRunner,
    python: &str,
    ctx: &BuildContext,
) -> Result<PathBuf, BuildError> {
    let command = CommandSpec::new(python).arg("-c").arg(NUMPY_INCLUDE_PROBE);

    let output = runner
        .run(&command, &ctx.root_dir)
        .map_err(|e| BuildError::NumpyIncludeNotFound {
            reason: e.to_string(),
        })?;

    let last_line = output
        .output
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty());

    if !output.success() {
        return Err(BuildError::NumpyIncludeNotFound {
            reason: format!(
                "`{python}` exited with {}{}",
                output.describe_exit(),
                last_line.map(|l| format!(": {l}")).unwrap_or_default()
            ),
        });
    }

    last_line
        .map(PathBuf::from)
        .ok_or_else(|| BuildError::NumpyIncludeNotFound {
            reason: format!("`{python}` printed no include directory"),
        })
}
