//! Configuration file management
//!
//! Reads hecbuild's TOML configuration from project and user locations and
//! merges it with environment variables and command-line flags.

use crate::build::{BuildContext, NumpyInclude};
use crate::env_vars;
use crate::paths;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Project-local config file name
pub const LOCAL_CONFIG_FILE: &str = ".hecbuild.toml";

/// Configuration loaded from TOML files
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Build root (directory holding `core_heclib.pyx` and `external/`)
    #[serde(default)]
    pub root: Option<String>,

    /// Extension build output directory
    #[serde(default)]
    pub target_dir: Option<String>,

    /// Python interpreter used for numpy discovery and compilation
    #[serde(default)]
    pub python: Option<String>,

    /// Explicit numpy include directory
    #[serde(default)]
    pub numpy_include: Option<String>,

    /// Upper bound on each external process, in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Echo external commands and their output
    #[serde(default)]
    pub verbose: Option<bool>,
}

impl Config {
    /// Load configuration from TOML files.
    /// Priority: `HECBUILD_CONFIG` -> ./.hecbuild.toml -> ~/.config/hecbuild/config.toml
    ///
    /// # Errors
    ///
    /// Returns an error if config file parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_with_options(None, false)
    }

    /// Load configuration with custom options.
    ///
    /// # Arguments
    /// * `custom_path` - Optional custom path to config file (overrides defaults)
    /// * `skip_rc` - If true, skip loading config files (return default config)
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read or parsed.
    pub fn load_with_options(custom_path: Option<&str>, skip_rc: bool) -> Result<Self> {
        if skip_rc || env_vars::no_config() {
            return Ok(Self::default());
        }

        if let Some(path) = custom_path
            .map(ToString::to_string)
            .or_else(env_vars::config_file)
        {
            return Self::load_from(&path);
        }

        let local = Path::new(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Self::load_from(local);
        }

        if let Some(config_dir) = Self::user_config_dir() {
            let config_path = config_dir.join("config.toml");
            if config_path.is_file() {
                return Self::load_from(&config_path);
            }
        }

        Ok(Self::default())
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid TOML or mistyped keys.
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid hecbuild configuration")
    }

    fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("In config file {}", path.display()))
    }

    fn user_config_dir() -> Option<PathBuf> {
        // Check XDG_CONFIG_HOME first
        if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg_config).join("hecbuild"));
        }

        // Fall back to ~/.config/hecbuild
        dirs::home_dir().map(|home| home.join(".config").join("hecbuild"))
    }
}

/// Values given on the command line (highest priority)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsOverrides {
    pub root: Option<String>,
    pub target_dir: Option<String>,
    pub python: Option<String>,
    pub numpy_include: Option<String>,
    pub timeout_secs: Option<u64>,
    pub verbose: bool,
}

/// Values read from the environment
#[derive(Debug, Clone, Default)]
struct EnvSettings {
    root: Option<String>,
    target_dir: Option<String>,
    python: Option<String>,
    numpy_include: Option<String>,
    timeout_secs: Option<u64>,
}

impl EnvSettings {
    fn from_env() -> Self {
        Self {
            root: env_vars::build_root(),
            target_dir: env_vars::target_dir(),
            python: env_vars::python(),
            numpy_include: env_vars::numpy_include(),
            timeout_secs: env_vars::timeout_secs(),
        }
    }
}

/// Fully merged settings for one build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    pub root: PathBuf,
    /// `None` means `<root>/build`
    pub target_dir: Option<PathBuf>,
    pub python: String,
    /// `None` means ask `python` at build time
    pub numpy_include: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub verbose: bool,
}

/// Interpreter used when nothing else is configured
#[must_use]
pub fn default_python() -> &'static str {
    if cfg!(windows) { "python" } else { "python3" }
}

impl BuildSettings {
    /// Merge settings with priority CLI > environment > config file > default.
    #[must_use]
    pub fn resolve(cli: &SettingsOverrides, config: &Config) -> Self {
        Self::merge(cli, &EnvSettings::from_env(), config)
    }

    fn merge(cli: &SettingsOverrides, env: &EnvSettings, config: &Config) -> Self {
        let root = cli
            .root
            .clone()
            .or_else(|| env.root.clone())
            .or_else(|| config.root.clone())
            .map_or_else(paths::find_build_root, PathBuf::from);

        let target_dir = cli
            .target_dir
            .clone()
            .or_else(|| env.target_dir.clone())
            .or_else(|| config.target_dir.clone())
            .map(PathBuf::from);

        let python = cli
            .python
            .clone()
            .or_else(|| env.python.clone())
            .or_else(|| config.python.clone())
            .unwrap_or_else(|| default_python().to_string());

        let numpy_include = cli
            .numpy_include
            .clone()
            .or_else(|| env.numpy_include.clone())
            .or_else(|| config.numpy_include.clone())
            .map(PathBuf::from);

        let timeout = cli
            .timeout_secs
            .or(env.timeout_secs)
            .or(config.timeout_secs)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Self {
            root,
            target_dir,
            python,
            numpy_include,
            timeout,
            verbose: cli.verbose || config.verbose.unwrap_or(false),
        }
    }

    /// Build context for these settings
    #[must_use]
    pub fn context(&self) -> BuildContext {
        let ctx = BuildContext::new(&self.root);
        match &self.target_dir {
            Some(dir) => ctx.with_target_dir(dir),
            None => ctx,
        }
    }

    /// How the link spec finds the numpy headers
    #[must_use]
    pub fn numpy_source(&self) -> NumpyInclude {
        self.numpy_include.clone().map_or_else(
            || NumpyInclude::Discover {
                python: self.python.clone(),
            },
            NumpyInclude::Explicit,
        )
    }
}
