//! Per-build directory context
//!
//! Stages never rely on the process working directory. The build root and
//! target directory travel with every call instead.

use crate::paths;
use std::path::{Path, PathBuf};

/// Directories one build invocation works in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    /// Directory holding the extension source and `external/`
    pub root_dir: PathBuf,
    /// Directory receiving extension build output
    pub target_dir: PathBuf,
}

impl BuildContext {
    /// Context with the default target directory (`<root>/build`)
    ///
    /// A relative root is made absolute against the current directory, since
    /// every stage runs its tools from inside the root.
    #[must_use]
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        let root_dir = root_dir.into();
        let root_dir = std::path::absolute(&root_dir).unwrap_or(root_dir);
        let target_dir = root_dir.join(paths::DEFAULT_TARGET_DIR);
        Self {
            root_dir,
            target_dir,
        }
    }

    /// Override the target directory. Relative paths are taken from the root.
    #[must_use]
    pub fn with_target_dir(mut self, target_dir: impl AsRef<Path>) -> Self {
        self.target_dir = self.resolve(target_dir);
        self
    }

    /// Resolve a path against the build root (absolute paths pass through)
    #[must_use]
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_dir.join(path)
        }
    }

    /// Scratch directory for intermediate compiler output
    #[must_use]
    pub fn temp_dir(&self) -> PathBuf {
        self.target_dir.join("temp")
    }

    /// Directory receiving the linked extension module
    #[must_use]
    pub fn lib_dir(&self) -> PathBuf {
        self.target_dir.join("lib")
    }
}
