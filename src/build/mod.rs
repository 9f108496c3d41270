//! Extension build pipeline
//!
//! Builds the native libraries the heclib extension links against, resolves
//! the platform's link spec and compiles the extension module.
//!
//! Stages, leaf-first:
//! - platform profile (`crate::platform`)
//! - native library builds (`native`)
//! - link spec resolution (`link_spec`)
//! - extension compilation (`extension`)
//!
//! `coordinator` runs them in order and stops at the first failure.

pub mod context;
pub mod coordinator;
pub mod extension;
pub mod link_spec;
pub mod native;
pub mod runner;
pub mod types;

pub use context::BuildContext;
pub use coordinator::{BuildCoordinator, HostSource, NumpyInclude};
pub use extension::{
    CompileRequest, CompilerDirectives, ExtensionCompiler, ExtensionModule, HECLIB_DIRECTIVES,
    SetuptoolsCompiler,
};
pub use link_spec::{LinkSpec, LinkSpecResolver, discover_numpy_include};
pub use native::{NativeLibraryBuilder, NativeLibraryProject};
pub use runner::{CommandRunner, CommandSpec, ProcessOutput, ProcessRunner, RunError};
pub use types::{BuildError, BuildReport, BuildResult, Stage};
