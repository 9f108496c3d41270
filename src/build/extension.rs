//! Extension module compilation
//!
//! The last pipeline stage hands the resolved link spec to a compiler that
//! translates, compiles and links the extension. The default compiler drives
//! setuptools `build_ext` through `Cython.Build.cythonize`:
//! ```bash
//! python -c "<driver>" '{"module": ..., "link_spec": ..., "directives": ...}'
//! ```

use super::context::BuildContext;
use super::link_spec::LinkSpec;
use super::runner::{CommandRunner, CommandSpec};
use super::types::BuildError;
use crate::paths;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Embedded setuptools driver; reads the JSON request from `sys.argv[1]`
const SETUPTOOLS_DRIVER: &str = include_str!("setuptools_driver.py");

/// The extension module being built
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionModule {
    /// Dotted import name of the compiled module
    pub name: String,
    /// Distribution name handed to setuptools
    pub distribution: String,
    /// Sources, relative to the build root
    pub sources: Vec<PathBuf>,
}

impl ExtensionModule {
    /// The heclib binding module
    #[must_use]
    pub fn core_heclib() -> Self {
        Self {
            name: "pydsstools._lib.x64.core_heclib".to_string(),
            distribution: "heclib-c".to_string(),
            sources: vec![PathBuf::from(paths::EXTENSION_SOURCE)],
        }
    }
}

/// Source translation directives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompilerDirectives {
    /// Embed Python signatures in docstrings
    #[serde(rename = "embedsignature")]
    pub embed_signature: bool,
    pub language_level: &'static str,
    /// Python type C strings convert to
    pub c_string_type: &'static str,
    pub c_string_encoding: &'static str,
}

/// Directives the heclib bindings are written against
pub const HECLIB_DIRECTIVES: CompilerDirectives = CompilerDirectives {
    embed_signature: true,
    language_level: "3",
    c_string_type: "str",
    c_string_encoding: "ascii",
};

/// Everything the compiler receives for one build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileRequest {
    pub module: ExtensionModule,
    pub link_spec: LinkSpec,
    pub directives: CompilerDirectives,
    /// Where the linked module is placed
    pub build_lib: PathBuf,
    /// Where intermediate objects are placed
    pub build_temp: PathBuf,
}

impl CompileRequest {
    /// Request for `module` with output under the context's target directory
    #[must_use]
    pub fn new(
        ctx: &BuildContext,
        module: ExtensionModule,
        link_spec: LinkSpec,
        directives: CompilerDirectives,
    ) -> Self {
        Self {
            module,
            link_spec,
            directives,
            build_lib: ctx.lib_dir(),
            build_temp: ctx.temp_dir(),
        }
    }
}

/// Translates, compiles and links an extension module
///
/// Implementations are opaque to the pipeline: they receive a finished
/// request and report success with the tool output or an
/// `ExtensionCompileFailure`.
pub trait ExtensionCompiler: fmt::Debug {
    /// Compile the extension described by `request`.
    ///
    /// # Errors
    ///
    /// Returns `ExtensionCompileFailure` if the toolchain fails.
    fn compile(
        &self,
        runner: &dyn CommandRunner,
        ctx: &BuildContext,
        request: &CompileRequest,
    ) -> Result<String, BuildError>;
}

/// Compiles through setuptools and Cython in a Python interpreter
#[derive(Debug, Clone)]
pub struct SetuptoolsCompiler {
    /// Python interpreter with setuptools, Cython and numpy installed
    python: String,
}

impl SetuptoolsCompiler {
    #[must_use]
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }

    /// The interpreter invocation for `request`
    ///
    /// # Errors
    ///
    /// Returns `ExtensionCompileFailure` if the request cannot be serialized.
    pub fn command(&self, request: &CompileRequest) -> Result<CommandSpec, BuildError> {
        let payload =
            serde_json::to_string(request).map_err(|e| BuildError::ExtensionCompileFailure {
                module: request.module.name.clone(),
                reason: format!("failed to encode build request: {e}"),
                output: String::new(),
            })?;

        Ok(CommandSpec::new(&self.python)
            .arg("-c")
            .arg(SETUPTOOLS_DRIVER)
            .arg(payload))
    }
}

impl ExtensionCompiler for SetuptoolsCompiler {
    fn compile(
        &self,
        runner: &dyn CommandRunner,
        ctx: &BuildContext,
        request: &CompileRequest,
    ) -> Result<String, BuildError> {
        let command = self.command(request)?;
        let module = request.module.name.clone();

        let output =
            runner
                .run(&command, &ctx.root_dir)
                .map_err(|e| BuildError::ExtensionCompileFailure {
                    module: module.clone(),
                    reason: e.to_string(),
                    output: String::new(),
                })?;

        if output.success() {
            Ok(output.output)
        } else {
            Err(BuildError::ExtensionCompileFailure {
                module,
                reason: format!("setuptools build_ext failed with {}", output.describe_exit()),
                output: output.output,
            })
        }
    }
}
