//! Console output and debug logging
//!
//! Stage status goes to stdout and failures to stderr. Verbose mode also
//! echoes every external command with its captured output. Debug lines are
//! tagged `[DEBUG]` and cost nothing when debug mode is off.

use std::sync::OnceLock;

static VERBOSITY: OnceLock<Verbosity> = OnceLock::new();
static DEBUG_ENABLED: OnceLock<bool> = OnceLock::new();

/// How much the build prints while it runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Errors only
    Quiet,
    /// One line per stage
    #[default]
    Normal,
    /// Stage lines plus external commands and their output
    Verbose,
}

impl Verbosity {
    /// Pick a verbosity from the `--quiet` / `--verbose` flag pair.
    #[must_use]
    pub const fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }
}

/// Initialize output settings from command-line flags. Only the first call wins.
pub fn init_output(verbosity: Verbosity, debug: bool) {
    let _ = VERBOSITY.set(verbosity);
    let _ = DEBUG_ENABLED.set(debug);
}

/// Current verbosity (`Normal` until initialized)
pub fn verbosity() -> Verbosity {
    VERBOSITY.get().copied().unwrap_or_default()
}

/// Check if stage status lines should be suppressed
pub fn is_quiet() -> bool {
    verbosity() == Verbosity::Quiet
}

/// Check if external commands should be echoed
pub fn is_verbose() -> bool {
    verbosity() >= Verbosity::Verbose
}

/// Check if debug mode is enabled
pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.get().copied().unwrap_or(false)
}

/// Print a stage status line unless running quietly
///
/// Usage: `status!("Building native library: {}", name)`
#[macro_export]
macro_rules! status {
    ($($arg:tt)*) => {
        if !$crate::debug::is_quiet() {
            println!($($arg)*);
        }
    };
}

/// Print a line only in verbose mode
#[macro_export]
macro_rules! verbose {
    ($($arg:tt)*) => {
        if $crate::debug::is_verbose() {
            println!($($arg)*);
        }
    };
}

/// Macro for convenient debug logging
///
/// Usage: `debug!("message with {}", variable)`
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        if $crate::debug::is_debug_enabled() {
            eprintln!("[DEBUG] {}", format_args!($($arg)*));
        }
    };
}
