//! Filesystem layout shared by the native builds and the link spec.
//!
//! Native build scripts drop their artifacts at fixed locations below the
//! build root and the link spec points the linker at those same locations.
//! Both sides read the paths from here.

use crate::env_vars;
use std::path::{Path, PathBuf};

/// Extension source, relative to the build root
pub const EXTENSION_SOURCE: &str = "core_heclib.pyx";

/// Directory holding the native library projects
pub const EXTERNAL_DIR: &str = "external";

/// DSS (heclib) public headers
pub const DSS_HEADERS: &str = "external/dss/headers";
/// Prebuilt DSS import libraries for 64-bit Windows
pub const DSS_WIN64_LIB: &str = "external/dss/win64";
/// Prebuilt DSS static archive for 64-bit POSIX hosts
pub const DSS_LINUX64_LIB: &str = "external/dss/linux64";

/// Grid library project root
pub const GRID_ROOT: &str = "external/gridv6";
/// Grid library public headers
pub const GRID_HEADERS: &str = "external/gridv6/headers";
/// Grid library build output
pub const GRID_BUILD: &str = "external/gridv6/build";
/// Grid library Windows build script
pub const GRID_WINDOWS_SCRIPT: &str = "external/gridv6/build.bat";
/// Grid library POSIX build script
pub const GRID_POSIX_SCRIPT: &str = "external/gridv6/build.sh";

/// zlib headers and static library (Windows only)
pub const ZLIB_DIR: &str = "external/zlib";

/// Default extension build output, relative to the build root
pub const DEFAULT_TARGET_DIR: &str = "build";

/// Check whether `dir` looks like a build root.
#[must_use]
pub fn is_build_root(dir: &Path) -> bool {
    dir.join(EXTENSION_SOURCE).is_file() && dir.join(EXTERNAL_DIR).is_dir()
}

/// Walk up from `start` to the nearest build root.
#[must_use]
pub fn find_build_root_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| is_build_root(dir))
        .map(Path::to_path_buf)
}

/// Find the build root for the current invocation.
/// Priority: `HECBUILD_ROOT` env var -> nearest ancestor build root -> current directory.
#[must_use]
pub fn find_build_root() -> PathBuf {
    if let Some(root) = env_vars::build_root() {
        return PathBuf::from(root);
    }

    std::env::current_dir()
        .ok()
        .and_then(|cwd| find_build_root_from(&cwd))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn make_root(dir: &Path) {
        fs::create_dir_all(dir.join(EXTERNAL_DIR)).unwrap();
        fs::write(dir.join(EXTENSION_SOURCE), "# cython\n").unwrap();
    }

    #[test]
    fn finds_root_from_nested_dir() {
        let temp = TempDir::new().unwrap();
        make_root(temp.path());
        let nested = temp.path().join(GRID_ROOT).join("src");
        fs::create_dir_all(&nested).unwrap();

        let found = find_build_root_from(&nested).unwrap();
        assert_eq!(found, temp.path());
    }

    #[test]
    fn missing_source_is_not_a_root() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(EXTERNAL_DIR)).unwrap();

        assert!(!is_build_root(temp.path()));
    }

    #[test]
    fn grid_paths_share_project_root() {
        for path in [GRID_HEADERS, GRID_BUILD, GRID_WINDOWS_SCRIPT, GRID_POSIX_SCRIPT] {
            assert!(path.starts_with(GRID_ROOT), "{path} outside {GRID_ROOT}");
        }
    }
}
