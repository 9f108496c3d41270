//! Shared test utilities for hecbuild tests
//!
//! Fake command runners and on-disk build root fixtures used by the unit
//! tests of the build pipeline.

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::paths;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// Create a temporary build root with the grid project and its scripts
    pub(crate) fn create_build_root() -> TempDir {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path();

        fs::write(root.join(paths::EXTENSION_SOURCE), "# cython: language_level=3\n")
            .expect("Failed to write extension source");
        for dir in [
            paths::DSS_HEADERS,
            paths::GRID_HEADERS,
            paths::DSS_LINUX64_LIB,
            paths::DSS_WIN64_LIB,
            paths::ZLIB_DIR,
        ] {
            fs::create_dir_all(root.join(dir)).expect("Failed to create layout dir");
        }

        write_script(root, paths::GRID_POSIX_SCRIPT, "set -e\nmkdir -p build\nmake -C src\n");
        write_script(root, paths::GRID_WINDOWS_SCRIPT, "@echo off\r\nnmake /f Makefile.win\r\n");
        temp_dir
    }

    fn write_script(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create script dir");
        }
        fs::write(path, contents).expect("Failed to write build script");
    }
}

#[cfg(test)]
pub(crate) mod runners {
    use crate::build::runner::{CommandRunner, CommandSpec, ProcessOutput, RunError};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    /// Scripted outcome for one fake invocation
    #[derive(Debug, Clone)]
    pub(crate) enum Reply {
        Exit(i32, &'static str),
        TimedOut,
    }

    /// Records every command and answers from a queue (success once empty)
    #[derive(Debug, Default)]
    pub(crate) struct RecordingRunner {
        calls: RefCell<Vec<(CommandSpec, PathBuf)>>,
        replies: RefCell<VecDeque<Reply>>,
    }

    impl RecordingRunner {
        pub(crate) fn with_replies(replies: impl IntoIterator<Item = Reply>) -> Self {
            Self {
                calls: RefCell::default(),
                replies: RefCell::new(replies.into_iter().collect()),
            }
        }

        pub(crate) fn calls(&self) -> Vec<(CommandSpec, PathBuf)> {
            self.calls.borrow().clone()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, command: &CommandSpec, working_dir: &Path) -> Result<ProcessOutput, RunError> {
            self.calls
                .borrow_mut()
                .push((command.clone(), working_dir.to_path_buf()));

            match self.replies.borrow_mut().pop_front() {
                Some(Reply::Exit(code, output)) => Ok(ProcessOutput {
                    exit_code: Some(code),
                    output: output.to_string(),
                }),
                Some(Reply::TimedOut) => Err(RunError::TimedOut {
                    program: command.program.clone(),
                    timeout: Duration::from_secs(1),
                }),
                None => Ok(ProcessOutput {
                    exit_code: Some(0),
                    output: String::new(),
                }),
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod compilers {
    use crate::build::context::BuildContext;
    use crate::build::extension::{CompileRequest, ExtensionCompiler};
    use crate::build::runner::CommandRunner;
    use crate::build::types::BuildError;
    use std::cell::RefCell;

    /// Keeps the request it was handed and echoes it back as output
    #[derive(Debug, Default)]
    pub(crate) struct EchoCompiler {
        received: RefCell<Option<CompileRequest>>,
        fail: bool,
    }

    impl EchoCompiler {
        pub(crate) fn failing() -> Self {
            Self {
                received: RefCell::default(),
                fail: true,
            }
        }

        pub(crate) fn received(&self) -> Option<CompileRequest> {
            self.received.borrow().clone()
        }
    }

    impl ExtensionCompiler for EchoCompiler {
        fn compile(
            &self,
            _runner: &dyn CommandRunner,
            _ctx: &BuildContext,
            request: &CompileRequest,
        ) -> Result<String, BuildError> {
            self.received.replace(Some(request.clone()));
            if self.fail {
                return Err(BuildError::ExtensionCompileFailure {
                    module: request.module.name.clone(),
                    reason: "linker exited with status 1".to_string(),
                    output: String::new(),
                });
            }
            Ok(format!("{:?}", request.link_spec))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::runner::{CommandRunner, CommandSpec};
    use crate::paths;
    use std::path::Path;

    #[test]
    fn build_root_fixture_is_a_root() {
        let root = fixtures::create_build_root();
        assert!(paths::is_build_root(root.path()));
        assert!(root.path().join(paths::GRID_POSIX_SCRIPT).is_file());
    }

    #[test]
    fn recording_runner_replays_then_succeeds() {
        let runner = runners::RecordingRunner::with_replies([runners::Reply::Exit(2, "boom")]);
        let command = CommandSpec::new("make");

        let first = runner.run(&command, Path::new("a")).unwrap();
        let second = runner.run(&command, Path::new("b")).unwrap();

        assert_eq!(first.exit_code, Some(2));
        assert_eq!(first.output, "boom");
        assert!(second.success());
        assert_eq!(runner.calls().len(), 2);
    }
}
