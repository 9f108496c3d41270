//! hecbuild internal library code

pub mod build;
pub mod config;
pub mod debug;
pub mod env_vars;
pub mod paths;
pub mod platform;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export common types for convenience
pub use build::{
    BuildContext, BuildCoordinator, BuildError, BuildReport, BuildResult, CommandRunner,
    CommandSpec, CompileRequest, ExtensionCompiler, ExtensionModule, HostSource, LinkSpec,
    LinkSpecResolver, NativeLibraryBuilder, NativeLibraryProject, NumpyInclude, ProcessOutput,
    ProcessRunner, RunError, SetuptoolsCompiler, Stage,
};
pub use config::{BuildSettings, Config, SettingsOverrides};
pub use debug::{Verbosity, init_output, is_debug_enabled};
pub use paths::{find_build_root, find_build_root_from};
pub use platform::{PlatformError, PlatformFamily, PlatformProfile};
