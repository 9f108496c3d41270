//! Build pipeline orchestration
//!
//! Runs the stages strictly in order, each gated on the previous one:
//! 1. resolve the host platform profile
//! 2. build every native library project (fixed order)
//! 3. resolve the link spec
//! 4. compile and link the extension module
//!
//! The first failure ends the run; nothing is retried.

use super::context::BuildContext;
use super::extension::{
    CompileRequest, CompilerDirectives, ExtensionCompiler, ExtensionModule, HECLIB_DIRECTIVES,
};
use super::link_spec::{LinkSpecResolver, discover_numpy_include};
use super::native::{NativeLibraryBuilder, NativeLibraryProject};
use super::runner::CommandRunner;
use super::types::{BuildError, BuildReport, BuildResult, Stage};
use crate::platform::{PlatformError, PlatformProfile};
use std::path::PathBuf;
use std::time::Instant;

/// Where the host profile comes from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HostSource {
    /// Detect the running host
    #[default]
    Detect,
    /// Pretend to run on another host
    Simulated { os: String, pointer_width_bits: u32 },
}

impl HostSource {
    /// Resolve the profile this source describes.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedArchitecture` for non-64-bit hosts.
    pub fn resolve(&self) -> Result<PlatformProfile, PlatformError> {
        match self {
            Self::Detect => PlatformProfile::resolve(),
            Self::Simulated {
                os,
                pointer_width_bits,
            } => PlatformProfile::resolve_from(os, *pointer_width_bits),
        }
    }
}

/// Where the numpy include directory comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumpyInclude {
    /// Use this directory as is
    Explicit(PathBuf),
    /// Ask this Python interpreter at build time
    Discover { python: String },
}

/// Runs the whole build for one build root
#[derive(Debug)]
pub struct BuildCoordinator<'a> {
    ctx: BuildContext,
    runner: &'a dyn CommandRunner,
    compiler: &'a dyn ExtensionCompiler,
    numpy: NumpyInclude,
    host: HostSource,
    projects: Vec<NativeLibraryProject>,
    module: ExtensionModule,
    directives: CompilerDirectives,
    toolchain_env: Vec<(String, String)>,
}

impl<'a> BuildCoordinator<'a> {
    /// Create a coordinator for the heclib extension with the default
    /// native projects, detecting the host.
    #[must_use]
    pub fn new(
        ctx: BuildContext,
        runner: &'a dyn CommandRunner,
        compiler: &'a dyn ExtensionCompiler,
        numpy: NumpyInclude,
    ) -> Self {
        Self {
            ctx,
            runner,
            compiler,
            numpy,
            host: HostSource::Detect,
            projects: NativeLibraryProject::defaults(),
            module: ExtensionModule::core_heclib(),
            directives: HECLIB_DIRECTIVES,
            toolchain_env: Vec::new(),
        }
    }

    /// Replace the native projects (built in the given order)
    #[must_use]
    pub fn with_projects(mut self, projects: Vec<NativeLibraryProject>) -> Self {
        self.projects = projects;
        self
    }

    #[must_use]
    pub fn with_host(mut self, host: HostSource) -> Self {
        self.host = host;
        self
    }

    /// Toolchain variables forwarded to native build scripts
    #[must_use]
    pub fn with_toolchain_env(mut self, vars: Vec<(String, String)>) -> Self {
        self.toolchain_env = vars;
        self
    }

    /// The build context stages run against
    #[must_use]
    pub const fn context(&self) -> &BuildContext {
        &self.ctx
    }

    /// Run every stage in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing stage.
    pub fn run(&self) -> Result<BuildReport, BuildError> {
        let mut results = Vec::new();

        // Stage 1: platform
        let start_time = Instant::now();
        let profile = self.host.resolve()?;
        crate::status!("Host platform: {profile}");
        results.push(BuildResult::success(
            Stage::Platform,
            start_time.elapsed(),
            String::new(),
        ));

        // Stage 2: native libraries, in declaration order
        let builder =
            NativeLibraryBuilder::new(self.runner).with_toolchain_env(self.toolchain_env.clone());
        for project in &self.projects {
            crate::status!(
                "Building native library: {} ({})",
                project.name,
                project.script_for(profile.family).display()
            );

            let result = builder.build(&self.ctx, project, &profile);
            if !result.success {
                return Err(BuildError::NativeLibraryBuildFailure {
                    project: project.name.clone(),
                    reason: result.error.unwrap_or_default(),
                    output: result.output,
                });
            }

            crate::status!(
                "  Built {} in {:.1}s",
                project.name,
                result.duration.as_secs_f64()
            );
            results.push(result);
        }

        // Stage 3: link spec
        let start_time = Instant::now();
        let numpy_include = match &self.numpy {
            NumpyInclude::Explicit(dir) => dir.clone(),
            NumpyInclude::Discover { python } => {
                discover_numpy_include(self.runner, python, &self.ctx)?
            }
        };
        crate::debug!("numpy include directory: {}", numpy_include.display());

        let link_spec = LinkSpecResolver::new(numpy_include).resolve(&profile)?;
        crate::debug!("resolved link spec: {link_spec:?}");
        results.push(BuildResult::success(
            Stage::LinkSpec,
            start_time.elapsed(),
            String::new(),
        ));

        // Stage 4: extension
        crate::status!("Compiling extension: {}", self.module.name);
        let start_time = Instant::now();
        let request = CompileRequest::new(
            &self.ctx,
            self.module.clone(),
            link_spec.clone(),
            self.directives,
        );
        let output = self.compiler.compile(self.runner, &self.ctx, &request)?;
        results.push(BuildResult::success(
            Stage::ExtensionCompile,
            start_time.elapsed(),
            output,
        ));

        Ok(BuildReport {
            profile,
            link_spec,
            results,
        })
    }
}
