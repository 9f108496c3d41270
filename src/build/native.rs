//! Native library building
//!
//! Runs the platform-specific build procedure of a native library project
//! so its static (or import) libraries exist before the extension links:
//! ```bash
//! # Windows
//! cd external/gridv6 && cmd /C build.bat
//! # POSIX
//! cd external/gridv6 && sh -c "$(cat build.sh)"
//! ```
//! Artifact locations are not reported back. They are fixed by the layout
//! in [`crate::paths`] and the link spec points at the same directories.

use super::context::BuildContext;
use super::runner::{CommandRunner, CommandSpec};
use super::types::{BuildResult, Stage};
use crate::paths;
use crate::platform::{PlatformFamily, PlatformProfile};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

/// A native library that must be built before the extension links
///
/// All paths are relative to the build root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeLibraryProject {
    /// Short project name used in logs and errors
    pub name: String,
    /// Project root (working directory of the Windows build)
    pub root_dir: PathBuf,
    /// Batch file run on Windows
    pub windows_build_command: PathBuf,
    /// Shell script run on POSIX hosts
    pub posix_build_command: PathBuf,
    /// Working directory of the POSIX build
    pub posix_working_dir: PathBuf,
    /// Where the build leaves its libraries (a link spec library dir)
    pub output_dir: PathBuf,
}

impl NativeLibraryProject {
    /// The grid processing library (`grid.lib` / `grid.a`)
    #[must_use]
    pub fn grid() -> Self {
        Self {
            name: "gridv6".to_string(),
            root_dir: PathBuf::from(paths::GRID_ROOT),
            windows_build_command: PathBuf::from(paths::GRID_WINDOWS_SCRIPT),
            posix_build_command: PathBuf::from(paths::GRID_POSIX_SCRIPT),
            posix_working_dir: PathBuf::from(paths::GRID_ROOT),
            output_dir: PathBuf::from(paths::GRID_BUILD),
        }
    }

    /// Projects built on every invocation, in build order
    ///
    /// The DSS libraries ship prebuilt for each platform and need no step.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![Self::grid()]
    }

    /// Build script used on the given platform family
    #[must_use]
    pub fn script_for(&self, family: PlatformFamily) -> &PathBuf {
        match family {
            PlatformFamily::Windows => &self.windows_build_command,
            PlatformFamily::MacOs | PlatformFamily::Linux | PlatformFamily::OtherPosix => {
                &self.posix_build_command
            }
        }
    }
}

/// Runs native library builds through a `CommandRunner`
#[derive(Debug)]
pub struct NativeLibraryBuilder<'a> {
    /// Process capability
    runner: &'a dyn CommandRunner,
    /// Toolchain variables (`CC`, `FC`, ...) passed to build scripts
    toolchain_env: Vec<(String, String)>,
}

impl<'a> NativeLibraryBuilder<'a> {
    /// Create a builder forwarding no extra environment.
    #[must_use]
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self {
            runner,
            toolchain_env: Vec::new(),
        }
    }

    /// Forward toolchain variables to every build script
    #[must_use]
    pub fn with_toolchain_env(mut self, vars: Vec<(String, String)>) -> Self {
        self.toolchain_env = vars;
        self
    }

    /// Build one native library project.
    ///
    /// Always rebuilds; artifacts from a previous run are not inspected.
    ///
    /// # Returns
    /// `BuildResult` with build status, duration and captured output
    #[must_use]
    pub fn build(
        &self,
        ctx: &BuildContext,
        project: &NativeLibraryProject,
        profile: &PlatformProfile,
    ) -> BuildResult {
        let start_time = Instant::now();
        let stage = Stage::NativeLibrary(project.name.clone());

        let prepared = match profile.family {
            PlatformFamily::Windows => Ok(self.windows_invocation(ctx, project)),
            PlatformFamily::MacOs | PlatformFamily::Linux | PlatformFamily::OtherPosix => {
                self.posix_invocation(ctx, project)
            }
        };

        let (command, working_dir) = match prepared {
            Ok(invocation) => invocation,
            Err(error) => {
                return BuildResult::failure(stage, start_time.elapsed(), error, String::new());
            }
        };

        crate::debug!(
            "building {} with {} in {}",
            project.name,
            project.script_for(profile.family).display(),
            working_dir.display()
        );

        match self.runner.run(&command, &working_dir) {
            Ok(output) if output.success() => {
                BuildResult::success(stage, start_time.elapsed(), output.output)
            }
            Ok(output) => BuildResult::failure(
                stage,
                start_time.elapsed(),
                format!(
                    "{} failed with {}",
                    project.script_for(profile.family).display(),
                    output.describe_exit()
                ),
                output.output,
            ),
            Err(error) => {
                BuildResult::failure(stage, start_time.elapsed(), error.to_string(), String::new())
            }
        }
    }

    /// Batch file run through `cmd /C` from the project root
    fn windows_invocation(
        &self,
        ctx: &BuildContext,
        project: &NativeLibraryProject,
    ) -> (CommandSpec, PathBuf) {
        let script = ctx.resolve(&project.windows_build_command);
        let command = CommandSpec::new("cmd")
            .arg("/C")
            .arg(script.to_string_lossy())
            .envs(self.toolchain_env.iter().cloned());

        (command, ctx.resolve(&project.root_dir))
    }

    /// Script contents run through `sh -c` from the POSIX working directory,
    /// so relative paths inside the script resolve against the project subtree
    fn posix_invocation(
        &self,
        ctx: &BuildContext,
        project: &NativeLibraryProject,
    ) -> Result<(CommandSpec, PathBuf), String> {
        let script_path = ctx.resolve(&project.posix_build_command);
        let script = fs::read_to_string(&script_path).map_err(|e| {
            format!(
                "failed to read build script {}: {e}",
                script_path.display()
            )
        })?;

        let command = CommandSpec::new("sh")
            .arg("-c")
            .arg(script)
            .envs(self.toolchain_env.iter().cloned());

        Ok((command, ctx.resolve(&project.posix_working_dir)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::create_build_root;
    use crate::test_utils::runners::{RecordingRunner, Reply};

    fn linux() -> PlatformProfile {
        PlatformProfile::simulated(PlatformFamily::Linux)
    }

    #[test]
    fn posix_runs_script_contents_in_working_dir() {
        let root = create_build_root();
        let ctx = BuildContext::new(root.path());
        let runner = RecordingRunner::default();
        let builder = NativeLibraryBuilder::new(&runner);

        let result = builder.build(&ctx, &NativeLibraryProject::grid(), &linux());

        assert!(result.success);
        assert_eq!(result.stage, Stage::NativeLibrary("gridv6".to_string()));
        let calls = runner.calls();
        let (command, working_dir) = calls.first().unwrap();
        assert_eq!(command.program, "sh");
        assert_eq!(command.args.first().map(String::as_str), Some("-c"));
        assert!(command.args.get(1).unwrap().contains("make -C src"));
        assert_eq!(working_dir, &root.path().join(paths::GRID_ROOT));
    }

    #[test]
    fn windows_runs_batch_file_from_project_root() {
        let root = create_build_root();
        let ctx = BuildContext::new(root.path());
        let runner = RecordingRunner::default();
        let builder = NativeLibraryBuilder::new(&runner);
        let profile = PlatformProfile::simulated(PlatformFamily::Windows);

        let result = builder.build(&ctx, &NativeLibraryProject::grid(), &profile);

        assert!(result.success);
        let calls = runner.calls();
        let (command, working_dir) = calls.first().unwrap();
        assert_eq!(command.program, "cmd");
        assert_eq!(command.args.first().map(String::as_str), Some("/C"));
        assert!(command.args.get(1).unwrap().ends_with("build.bat"));
        assert_eq!(working_dir, &root.path().join(paths::GRID_ROOT));
    }

    #[test]
    fn macos_uses_posix_script() {
        let root = create_build_root();
        let ctx = BuildContext::new(root.path());
        let runner = RecordingRunner::default();
        let builder = NativeLibraryBuilder::new(&runner);
        let profile = PlatformProfile::simulated(PlatformFamily::MacOs);

        let result = builder.build(&ctx, &NativeLibraryProject::grid(), &profile);

        assert!(result.success);
        assert_eq!(runner.calls().first().unwrap().0.program, "sh");
    }

    #[test]
    fn nonzero_exit_is_failure_with_output() {
        let root = create_build_root();
        let ctx = BuildContext::new(root.path());
        let runner = RecordingRunner::with_replies([Reply::Exit(2, "gfortran: not found")]);
        let builder = NativeLibraryBuilder::new(&runner);

        let result = builder.build(&ctx, &NativeLibraryProject::grid(), &linux());

        assert!(!result.success);
        assert!(result.error.unwrap().contains("exit code 2"));
        assert_eq!(result.output, "gfortran: not found");
    }

    #[test]
    fn timeout_is_failure() {
        let root = create_build_root();
        let ctx = BuildContext::new(root.path());
        let runner = RecordingRunner::with_replies([Reply::TimedOut]);
        let builder = NativeLibraryBuilder::new(&runner);

        let result = builder.build(&ctx, &NativeLibraryProject::grid(), &linux());

        assert!(!result.success);
        assert!(result.error.unwrap().contains("did not finish"));
    }

    #[test]
    fn missing_posix_script_fails_without_running() {
        let root = tempfile::TempDir::new().unwrap();
        let ctx = BuildContext::new(root.path());
        let runner = RecordingRunner::default();
        let builder = NativeLibraryBuilder::new(&runner);

        let result = builder.build(&ctx, &NativeLibraryProject::grid(), &linux());

        assert!(!result.success);
        assert!(result.error.unwrap().contains("failed to read build script"));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn forwards_toolchain_environment() {
        let root = create_build_root();
        let ctx = BuildContext::new(root.path());
        let runner = RecordingRunner::default();
        let builder = NativeLibraryBuilder::new(&runner)
            .with_toolchain_env(vec![("FC".to_string(), "gfortran-13".to_string())]);

        let result = builder.build(&ctx, &NativeLibraryProject::grid(), &linux());

        assert!(result.success);
        let calls = runner.calls();
        let (command, _) = calls.first().unwrap();
        assert_eq!(
            command.env,
            vec![("FC".to_string(), "gfortran-13".to_string())]
        );
    }

    #[test]
    fn defaults_build_grid_only() {
        let names: Vec<_> = NativeLibraryProject::defaults()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["gridv6"]);
    }

    #[test]
    fn grid_output_is_a_link_library_dir() {
        let grid = NativeLibraryProject::grid();
        assert_eq!(grid.output_dir, PathBuf::from(paths::GRID_BUILD));
        assert!(grid.output_dir.starts_with(&grid.root_dir));
    }
}
