//! Env Command
//!
//! Displays environment information useful for debugging build issues:
//! hecbuild and Python versions, the host platform and the environment
//! variables that influence a build.

use hecbuild::config::default_python;
use hecbuild::{PlatformProfile, env_vars};
use std::env;
use std::process::Command;

/// hecbuild's own variables, shown before the forwarded toolchain variables
const HECBUILD_VARS: [&str; 10] = [
    "HECBUILD_ROOT",
    "HECBUILD_TARGET_DIR",
    "HECBUILD_PYTHON",
    "PYTHON",
    "NUMPY_INCLUDE",
    "HECBUILD_TIMEOUT",
    "HECBUILD_DEBUG",
    "HECBUILD_CONFIG",
    "HECBUILD_NO_CONFIG",
    "PATH",
];

/// Display environment information
pub(crate) fn run() {
    println!("## Environment");
    println!();

    println!("hecbuild   {}", env!("CARGO_PKG_VERSION"));

    let python = env_vars::python().unwrap_or_else(|| default_python().to_string());
    // Python 2 printed its version to stderr
    match Command::new(&python).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            let version = if stdout.trim().is_empty() { stderr } else { stdout };
            println!("Python     {} ({python})", version.trim());
        }
        _ => println!("Python     not found ({python})"),
    }
    println!();

    println!("## Platform");
    println!();
    println!("OS         {}", env::consts::OS);
    println!("Arch       {}", env::consts::ARCH);
    println!("Family     {}", env::consts::FAMILY);
    match PlatformProfile::resolve() {
        Ok(profile) => println!("Profile    {profile}"),
        Err(e) => println!("Profile    unsupported ({e})"),
    }
    println!();

    println!("## Environment Variables");
    println!();

    for var in HECBUILD_VARS
        .iter()
        .chain(env_vars::FORWARDED_TOOLCHAIN_VARS.iter())
    {
        if let Ok(value) = env::var(var) {
            println!("{var:<20} {value}");
        }
    }
}
