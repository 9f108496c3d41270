//! Shared test helpers and utilities

use hecbuild::{
    BuildContext, BuildError, CommandRunner, CommandSpec, CompileRequest, ExtensionCompiler,
    NativeLibraryProject, ProcessOutput, RunError,
};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Path of the hecbuild binary cargo built for this test run
///
/// Follows `--release`, `CARGO_TARGET_DIR` and cross targets.
#[allow(dead_code)]
pub(crate) fn get_hecbuild_binary() -> String {
    env!("CARGO_BIN_EXE_hecbuild").to_string()
}

/// Create a temporary build root with the extension source, the prebuilt
/// library directories and one POSIX build script per named project
///
/// Each project lives at `external/<name>` with its script at
/// `external/<name>/build.sh`.
#[allow(dead_code)]
pub(crate) fn create_build_root(projects: &[&str]) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    fs::write(root.join("core_heclib.pyx"), "# cython: language_level=3\n")
        .expect("Failed to write extension source");
    for dir in [
        "external/dss/headers",
        "external/dss/linux64",
        "external/gridv6/headers",
    ] {
        fs::create_dir_all(root.join(dir)).expect("Failed to create layout dir");
    }

    for name in projects {
        let project_dir = root.join("external").join(name);
        fs::create_dir_all(&project_dir).expect("Failed to create project dir");
        fs::write(project_dir.join("build.sh"), format!("make {name}\n"))
            .expect("Failed to write build script");
        fs::write(project_dir.join("build.bat"), format!("nmake {name}\r\n"))
            .expect("Failed to write build script");
    }
    temp_dir
}

/// A native project rooted at `external/<name>`
#[allow(dead_code)]
pub(crate) fn mock_project(name: &str) -> NativeLibraryProject {
    let root_dir = Path::new("external").join(name);
    NativeLibraryProject {
        name: name.to_string(),
        windows_build_command: root_dir.join("build.bat"),
        posix_build_command: root_dir.join("build.sh"),
        posix_working_dir: root_dir.clone(),
        output_dir: root_dir.join("build"),
        root_dir,
    }
}

/// Records every command and answers with queued exit codes
/// (exit 0 once the queue is empty)
#[allow(dead_code)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedRunner {
    calls: RefCell<Vec<(CommandSpec, PathBuf)>>,
    exit_codes: RefCell<VecDeque<i32>>,
}

#[allow(dead_code)]
impl ScriptedRunner {
    pub(crate) fn with_exit_codes(codes: impl IntoIterator<Item = i32>) -> Self {
        Self {
            calls: RefCell::default(),
            exit_codes: RefCell::new(codes.into_iter().collect()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<(CommandSpec, PathBuf)> {
        self.calls.borrow().clone()
    }

    /// Working directories of every recorded command, in order
    pub(crate) fn working_dirs(&self) -> Vec<PathBuf> {
        self.calls.borrow().iter().map(|(_, dir)| dir.clone()).collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, command: &CommandSpec, working_dir: &Path) -> Result<ProcessOutput, RunError> {
        self.calls
            .borrow_mut()
            .push((command.clone(), working_dir.to_path_buf()));

        let code = self.exit_codes.borrow_mut().pop_front().unwrap_or(0);
        Ok(ProcessOutput {
            exit_code: Some(code),
            output: format!("{} exited {code}", command.program),
        })
    }
}

/// Succeeds without running anything and remembers what it was asked to build
#[allow(dead_code)]
#[derive(Debug, Default)]
pub(crate) struct EchoCompiler {
    requests: RefCell<Vec<CompileRequest>>,
}

#[allow(dead_code)]
impl EchoCompiler {
    pub(crate) fn requests(&self) -> Vec<CompileRequest> {
        self.requests.borrow().clone()
    }
}

impl ExtensionCompiler for EchoCompiler {
    fn compile(
        &self,
        _runner: &dyn CommandRunner,
        _ctx: &BuildContext,
        request: &CompileRequest,
    ) -> Result<String, BuildError> {
        self.requests.borrow_mut().push(request.clone());
        Ok(format!("compiled {}", request.module.name))
    }
}
