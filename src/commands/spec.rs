//! Spec command
//!
//! Prints the link spec the extension would be compiled with, for the host
//! or for a simulated platform family.

use anyhow::{Context, Result};
use clap::ValueEnum;
use hecbuild::build::discover_numpy_include;
use hecbuild::{
    BuildSettings, LinkSpec, LinkSpecResolver, PlatformFamily, PlatformProfile, ProcessRunner,
};
use std::fmt::Write as _;
use std::path::PathBuf;

/// Platform families selectable with `--platform`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum PlatformArg {
    Windows,
    Macos,
    Linux,
    OtherPosix,
}

impl From<PlatformArg> for PlatformFamily {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Windows => Self::Windows,
            PlatformArg::Macos => Self::MacOs,
            PlatformArg::Linux => Self::Linux,
            PlatformArg::OtherPosix => Self::OtherPosix,
        }
    }
}

/// Resolve and print the link spec.
pub(crate) fn run(settings: &BuildSettings, platform: Option<PlatformArg>, json: bool) -> Result<()> {
    let profile = match platform {
        Some(arg) => PlatformProfile::simulated(arg.into()),
        None => PlatformProfile::resolve()?,
    };
    hecbuild::debug!("resolving link spec for {profile}");

    let numpy_include: PathBuf = if let Some(dir) = &settings.numpy_include {
        dir.clone()
    } else {
        let runner =
            ProcessRunner::new(settings.timeout).context("Failed to start the process runtime")?;
        discover_numpy_include(&runner, &settings.python, &settings.context())?
    };

    let spec = LinkSpecResolver::new(numpy_include).resolve(&profile)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&spec)?);
    } else {
        print!("{}", render_text(&profile, &spec));
    }
    Ok(())
}

fn render_text(profile: &PlatformProfile, spec: &LinkSpec) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Platform: {profile}");

    let sections: [(&str, Vec<String>); 5] = [
        (
            "Include directories",
            spec.include_dirs.iter().map(|p| p.display().to_string()).collect(),
        ),
        (
            "Library directories",
            spec.library_dirs.iter().map(|p| p.display().to_string()).collect(),
        ),
        ("Libraries", spec.libraries.clone()),
        ("Extra compile args", spec.extra_compile_args.clone()),
        ("Extra link args", spec.extra_link_args.clone()),
    ];

    for (title, items) in sections {
        let _ = writeln!(out);
        let _ = writeln!(out, "{title}:");
        if items.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        for item in items {
            let _ = writeln!(out, "  {item}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_for(family: PlatformFamily) -> (PlatformProfile, LinkSpec) {
        let profile = PlatformProfile::simulated(family);
        let spec = LinkSpecResolver::new("/numpy/include")
            .resolve(&profile)
            .unwrap();
        (profile, spec)
    }

    #[test]
    fn renders_windows_sections() {
        let (profile, spec) = spec_for(PlatformFamily::Windows);
        let text = render_text(&profile, &spec);

        assert!(text.starts_with("Platform: windows (64-bit)\n"));
        assert!(text.contains("Libraries:\n  heclib_c\n  heclib_f\n  zlibstatic\n  grid\n"));
        assert!(text.contains("Extra link args:\n  /NODEFAULTLIB:LIBCMT\n"));
        assert!(text.contains("Extra compile args:\n  (none)\n"));
    }

    #[test]
    fn renders_numpy_include_last() {
        let (profile, spec) = spec_for(PlatformFamily::Linux);
        let text = render_text(&profile, &spec);

        let includes = text
            .split("Include directories:\n")
            .nth(1)
            .and_then(|rest| rest.split("\n\n").next())
            .unwrap();
        assert!(includes.trim_end().ends_with("/numpy/include"));
    }

    #[test]
    fn platform_arg_maps_to_family() {
        assert_eq!(PlatformFamily::from(PlatformArg::Macos), PlatformFamily::MacOs);
        assert_eq!(
            PlatformFamily::from(PlatformArg::OtherPosix),
            PlatformFamily::OtherPosix
        );
    }
}
