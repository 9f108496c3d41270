//! hecbuild command-line interface
//!
//! Builds the heclib extension module and the native libraries it links

use clap::{Args, Parser, Subcommand};
use hecbuild::{BuildSettings, Config, SettingsOverrides, Verbosity};
use std::process;

/// Display an error with optional backtrace information
fn display_error(err: &anyhow::Error, backtrace_enabled: bool) {
    eprintln!("error: {err}");

    // Show error chain
    let mut source = err.source();
    while let Some(err) = source {
        eprintln!("caused by: {err}");
        source = err.source();
    }

    // Show backtrace if enabled
    if backtrace_enabled {
        let backtrace = err.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            eprintln!("\nBacktrace:");
            eprintln!("{backtrace}");
        }
    }
}

#[derive(Parser)]
#[command(name = "hecbuild")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build the heclib extension module and its native libraries", long_about = None)]
pub(crate) struct Cli {
    /// Print debug information
    #[arg(long, global = true)]
    debug: bool,

    /// Show a backtrace on errors (requires `RUST_BACKTRACE=1`)
    #[arg(long, global = true)]
    backtrace: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that works on a build root
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct BuildArgs {
    /// Build root holding core_heclib.pyx and external/ (default: nearest ancestor)
    #[arg(long)]
    root: Option<String>,

    /// Directory for extension build output (default: <root>/build)
    #[arg(long)]
    target_dir: Option<String>,

    /// Python interpreter with setuptools, Cython and numpy
    #[arg(long)]
    python: Option<String>,

    /// numpy include directory (skips asking the interpreter)
    #[arg(long)]
    numpy_include: Option<String>,

    /// Kill any external process running longer than this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Echo external commands and their output
    #[arg(long, short)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, short, conflicts_with = "verbose")]
    quiet: bool,

    /// Use this config file instead of the default locations
    #[arg(long)]
    config: Option<String>,

    /// Do not load any config file
    #[arg(long)]
    norc: bool,
}

impl BuildArgs {
    /// Merge flags, environment and config file into build settings
    pub(crate) fn settings(&self) -> anyhow::Result<BuildSettings> {
        let config = Config::load_with_options(self.config.as_deref(), self.norc)?;
        let overrides = SettingsOverrides {
            root: self.root.clone(),
            target_dir: self.target_dir.clone(),
            python: self.python.clone(),
            numpy_include: self.numpy_include.clone(),
            timeout_secs: self.timeout,
            verbose: self.verbose,
        };
        Ok(BuildSettings::resolve(&overrides, &config))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build native libraries, then compile and link the extension
    Build {
        #[command(flatten)]
        args: BuildArgs,
    },

    /// Print the resolved include dirs, library dirs, libraries and flags
    Spec {
        /// Resolve for another platform family instead of the host
        #[arg(long, value_enum)]
        platform: Option<commands::spec::PlatformArg>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        args: BuildArgs,
    },

    /// Check the build root layout and toolchain for common problems
    Doctor {
        #[command(flatten)]
        args: BuildArgs,
    },

    /// Show version, platform and relevant environment variables
    Env,

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Verbosity for a build-root command; a config `verbose = true` counts
/// like `--verbose` and `--quiet` still wins
fn verbosity_for(args: &BuildArgs, settings: &BuildSettings) -> Verbosity {
    Verbosity::from_flags(settings.verbose, args.quiet)
}

/// Load settings, then initialize console output from them
fn prepare(args: &BuildArgs, debug: bool) -> anyhow::Result<BuildSettings> {
    let settings = args.settings()?;
    hecbuild::init_output(verbosity_for(args, &settings), debug);
    Ok(settings)
}

fn main() {
    let cli = Cli::parse();

    let debug = cli.debug || hecbuild::env_vars::debug();

    let result = match cli.command {
        Commands::Build { args } => prepare(&args, debug).and_then(|s| commands::build::run(&s)),
        Commands::Spec {
            platform,
            json,
            args,
        } => prepare(&args, debug).and_then(|s| commands::spec::run(&s, platform, json)),
        Commands::Doctor { args } => prepare(&args, debug).and_then(|s| commands::doctor::run(&s)),
        Commands::Env => {
            hecbuild::init_output(Verbosity::Normal, debug);
            commands::env::run();
            Ok(())
        }
        Commands::Completion { shell } => {
            hecbuild::init_output(Verbosity::Normal, debug);
            commands::completion::run(shell)
        }
    };

    if let Err(e) = result {
        display_error(&e, cli.backtrace);
        process::exit(1);
    }
}


mod commands;
