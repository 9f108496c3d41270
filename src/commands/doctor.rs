//! Doctor command - Diagnose common build problems
//!
//! This command checks for common issues before a build:
//! - Unsupported host platform or architecture
//! - Missing build root, build scripts or prebuilt libraries
//! - Python without numpy or Cython
//! - Missing Fortran runtime on POSIX hosts

use anyhow::{Context, Result};
use hecbuild::build::discover_numpy_include;
use hecbuild::{
    BuildContext, BuildSettings, CommandRunner, CommandSpec, LinkSpecResolver,
    NativeLibraryProject, PlatformFamily, PlatformProfile, ProcessRunner, paths,
};
use std::fs;

/// Run the doctor command to diagnose common problems.
pub(crate) fn run(settings: &BuildSettings) -> Result<()> {
    diagnose(settings, hecbuild::debug::is_quiet())
}

#[allow(clippy::cognitive_complexity)]
fn diagnose(settings: &BuildSettings, quiet: bool) -> Result<()> {
    let ctx = settings.context();
    let runner = ProcessRunner::new(settings.timeout)
        .context("Failed to start the process runtime")?
        .with_progress(false);

    if !quiet {
        println!("Checking build environment for common problems...");
        println!();
    }

    let mut has_errors = false;
    let mut has_warnings = false;

    let profile = match PlatformProfile::resolve() {
        Ok(profile) => {
            if LinkSpecResolver::new("").resolve(&profile).is_ok() {
                if !quiet {
                    println!("Host platform supported ({profile})");
                }
            } else {
                eprintln!("Host platform {profile} has no link policy");
                has_errors = true;
            }
            Some(profile)
        }
        Err(e) => {
            eprintln!("Unsupported host: {e}");
            has_errors = true;
            None
        }
    };

    if paths::is_build_root(&ctx.root_dir) {
        if !quiet {
            println!("Build root found ({})", ctx.root_dir.display());
        }
    } else {
        eprintln!(
            "{} is not a build root (expected {} and {}/)",
            ctx.root_dir.display(),
            paths::EXTENSION_SOURCE,
            paths::EXTERNAL_DIR
        );
        eprintln!("  Pass --root or set HECBUILD_ROOT");
        has_errors = true;
    }

    let family = profile.map_or(PlatformFamily::Linux, |p| p.family);
    for project in NativeLibraryProject::defaults() {
        let script = ctx.resolve(project.script_for(family));
        if script.is_file() {
            if !quiet {
                println!("{} build script found", project.name);
            }
        } else {
            eprintln!("{} build script not found: {}", project.name, script.display());
            has_errors = true;
        }

        if !quiet {
            let build_dir = ctx.resolve(&project.output_dir);
            let artifacts: Vec<String> = fs::read_dir(&build_dir)
                .map(|entries| {
                    entries
                        .flatten()
                        .map(|entry| entry.file_name().to_string_lossy().to_string())
                        .collect()
                })
                .unwrap_or_default();
            if artifacts.is_empty() {
                println!("{} has not been built yet", project.name);
            } else {
                println!("{} artifacts on disk: {}", project.name, artifacts.join(", "));
            }
        }
    }

    for dir in required_dirs(family) {
        if ctx.resolve(dir).is_dir() {
            if !quiet {
                println!("{dir} found");
            }
        } else {
            eprintln!("{dir} not found under {}", ctx.root_dir.display());
            has_errors = true;
        }
    }

    has_warnings |= !check_numpy(settings, &runner, &ctx, quiet);

    let cython_version = ["-c", "import Cython; print(Cython.__version__)"];
    match tool_version(&runner, &ctx, &settings.python, &cython_version) {
        Ok(version) => {
            if !quiet {
                println!("Cython {version} available");
            }
        }
        Err(e) => {
            eprintln!("Warning: Cython is not importable: {e}");
            has_warnings = true;
        }
    }

    if family.is_posix() {
        match tool_version(&runner, &ctx, "gfortran", &["--version"]) {
            Ok(_) => {
                if !quiet {
                    println!("gfortran available");
                }
            }
            Err(e) => {
                eprintln!(
                    "Warning: gfortran unavailable, the Fortran runtime is needed to link: {e}"
                );
                has_warnings = true;
            }
        }
    }

    println!();
    if has_errors {
        anyhow::bail!("Issues found with the build environment");
    } else if has_warnings {
        println!("Build environment has warnings");
        Ok(())
    } else {
        println!("No issues found with the build environment");
        Ok(())
    }
}

/// Returns false if numpy headers cannot be located
fn check_numpy(
    settings: &BuildSettings,
    runner: &dyn CommandRunner,
    ctx: &BuildContext,
    quiet: bool,
) -> bool {
    if let Some(dir) = &settings.numpy_include {
        if dir.is_dir() {
            if !quiet {
                println!("numpy include directory found ({})", dir.display());
            }
            return true;
        }
        eprintln!(
            "Warning: numpy include directory not found: {}",
            dir.display()
        );
        return false;
    }

    match discover_numpy_include(runner, &settings.python, ctx) {
        Ok(dir) => {
            if !quiet {
                println!("numpy headers found ({})", dir.display());
            }
            true
        }
        Err(e) => {
            eprintln!("Warning: {e}");
            eprintln!("  Install numpy or set NUMPY_INCLUDE");
            false
        }
    }
}

/// Directories the link step needs that ship with the build root
fn required_dirs(family: PlatformFamily) -> Vec<&'static str> {
    match family {
        PlatformFamily::Windows => vec![
            paths::DSS_HEADERS,
            paths::GRID_HEADERS,
            paths::DSS_WIN64_LIB,
            paths::ZLIB_DIR,
        ],
        PlatformFamily::MacOs | PlatformFamily::Linux | PlatformFamily::OtherPosix => {
            vec![paths::DSS_HEADERS, paths::GRID_HEADERS, paths::DSS_LINUX64_LIB]
        }
    }
}

/// Last non-empty output line of a successful command
fn tool_version(
    runner: &dyn CommandRunner,
    ctx: &BuildContext,
    program: &str,
    args: &[&str],
) -> Result<String, String> {
    let command = CommandSpec::new(program).args(args.iter().copied());
    let output = runner
        .run(&command, &ctx.root_dir)
        .map_err(|e| e.to_string())?;
    if !output.success() {
        return Err(format!("`{command}` exited with {}", output.describe_exit()));
    }
    Ok(output
        .output
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string())
}
