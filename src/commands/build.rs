//! Build command
//!
//! Builds the native libraries, resolves the link spec and compiles the
//! heclib extension module.

use anyhow::{Context, Result};
use hecbuild::{
    BuildCoordinator, BuildError, BuildReport, BuildSettings, ProcessRunner, SetuptoolsCompiler,
};

/// Run the full build pipeline for the configured build root.
pub(crate) fn run(settings: &BuildSettings) -> Result<()> {
    let ctx = settings.context();
    hecbuild::debug!("build root: {}", ctx.root_dir.display());
    hecbuild::debug!("target dir: {}", ctx.target_dir.display());

    if !hecbuild::paths::is_build_root(&ctx.root_dir) {
        anyhow::bail!(
            "{} is not a build root (expected {} and {}/)",
            ctx.root_dir.display(),
            hecbuild::paths::EXTENSION_SOURCE,
            hecbuild::paths::EXTERNAL_DIR
        );
    }

    let mut runner =
        ProcessRunner::new(settings.timeout).context("Failed to start the process runtime")?;
    if hecbuild::debug::is_quiet() {
        runner = runner.with_progress(false);
    }
    let compiler = SetuptoolsCompiler::new(settings.python.clone());

    let coordinator = BuildCoordinator::new(ctx, &runner, &compiler, settings.numpy_source())
        .with_toolchain_env(hecbuild::env_vars::toolchain_overrides());

    match coordinator.run() {
        Ok(report) => {
            print_summary(&report);
            Ok(())
        }
        Err(err) => Err(report_failure(err)),
    }
}

fn print_summary(report: &BuildReport) {
    let natives = report.native_libraries();
    hecbuild::status!();
    hecbuild::status!(
        "Built {} for {} in {:.1}s",
        hecbuild::ExtensionModule::core_heclib().name,
        report.profile,
        report.total_duration().as_secs_f64()
    );
    if !natives.is_empty() {
        hecbuild::status!("  native libraries: {}", natives.join(", "));
    }
    hecbuild::verbose!("  libraries: {}", report.link_spec.libraries.join(" "));
}

/// Show the captured tool output, then wrap the error with its stage.
fn report_failure(err: BuildError) -> anyhow::Error {
    if let Some(output) = err.output() {
        eprintln!("--- output ---");
        eprintln!("{}", output.trim_end());
        eprintln!("--------------");
    }
    let stage = err.stage();
    anyhow::Error::new(err).context(format!("Build failed during {stage}"))
}
