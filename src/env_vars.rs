//! hecbuild and toolchain environment variable handling.

use std::env;

/// Compiler and linker variables forwarded to native build scripts.
pub const FORWARDED_TOOLCHAIN_VARS: [&str; 7] =
    ["CC", "CXX", "FC", "CFLAGS", "CXXFLAGS", "FFLAGS", "LDFLAGS"];

// Boolean values accept "1", "true", "yes" (case-insensitive)
fn is_truthy(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    value == "1" || value == "true" || value == "yes"
}

fn is_enabled(var: &str) -> bool {
    env::var(var).ok().is_some_and(|s| is_truthy(&s))
}

fn non_empty(var: &str) -> Option<String> {
    env::var(var).ok().filter(|s| !s.trim().is_empty())
}

fn parse_seconds(value: &str) -> Option<u64> {
    value.trim().parse().ok().filter(|secs| *secs > 0)
}

// Paths - HECBUILD_ROOT, HECBUILD_TARGET_DIR

/// Get the build root (directory holding `core_heclib.pyx` and `external/`).
pub fn build_root() -> Option<String> {
    non_empty("HECBUILD_ROOT")
}

/// Get the target directory for extension build output.
pub fn target_dir() -> Option<String> {
    non_empty("HECBUILD_TARGET_DIR")
}

// Python toolchain - HECBUILD_PYTHON, PYTHON, NUMPY_INCLUDE

/// Get the Python interpreter (checks `HECBUILD_PYTHON` then `PYTHON`).
pub fn python() -> Option<String> {
    non_empty("HECBUILD_PYTHON").or_else(|| non_empty("PYTHON"))
}

/// Get an explicit numpy include directory, bypassing interpreter discovery.
pub fn numpy_include() -> Option<String> {
    non_empty("NUMPY_INCLUDE")
}

// Process control - HECBUILD_TIMEOUT

/// Get the external process timeout in seconds (None if unset, zero or invalid).
pub fn timeout_secs() -> Option<u64> {
    env::var("HECBUILD_TIMEOUT")
        .ok()
        .and_then(|s| parse_seconds(&s))
}

// Diagnostics and config files

/// Check if debug logging is enabled.
pub fn debug() -> bool {
    is_enabled("HECBUILD_DEBUG")
}

/// Get a custom config file path.
pub fn config_file() -> Option<String> {
    non_empty("HECBUILD_CONFIG")
}

/// Check if config files should be ignored.
pub fn no_config() -> bool {
    is_enabled("HECBUILD_NO_CONFIG")
}

/// Collect the toolchain variables that are set, in forwarding order.
pub fn toolchain_overrides() -> Vec<(String, String)> {
    FORWARDED_TOOLCHAIN_VARS
        .iter()
        .filter_map(|var| env::var(var).ok().map(|value| ((*var).to_string(), value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_values() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy(" yes "));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("no"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn seconds_parsing() {
        assert_eq!(parse_seconds("600"), Some(600));
        assert_eq!(parse_seconds(" 30 "), Some(30));
        assert_eq!(parse_seconds("0"), None);
        assert_eq!(parse_seconds("ten"), None);
        assert_eq!(parse_seconds("-5"), None);
    }

    #[test]
    fn forwarded_vars_cover_fortran() {
        assert!(FORWARDED_TOOLCHAIN_VARS.contains(&"FC"));
        assert!(FORWARDED_TOOLCHAIN_VARS.contains(&"FFLAGS"));
    }
}
