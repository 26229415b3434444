//! Configuration file support for shimreg.
//!
//! shimreg supports two configuration file locations:
//! - Global: `~/.shimreg/config.toml` - User-wide defaults
//! - Project: `.shimreg/config.toml` - Directory-specific overrides
//!
//! Project config takes precedence over global config. Command-line flags
//! take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::platform::{HostPlatform, ReleaseChannel};

/// shimreg configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Shim table settings
    pub registry: RegistryConfig,

    /// Default runtime environment
    pub environment: EnvironmentConfig,

    /// Saved opt-ins
    pub opt_in: OptInConfig,
}

/// Which shim table to load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Path to a TOML or JSON table (None = built-in table)
    pub table: Option<PathBuf>,
}

/// Environment used when no flag says otherwise.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Host platform (desktop, android)
    pub platform: Option<String>,

    /// Release channel (nightly, beta, release, esr, ...)
    pub channel: Option<String>,
}

/// Shims the user has opted into.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OptInConfig {
    pub shims: Vec<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.registry.table.is_some() {
            self.registry.table = other.registry.table;
        }

        if other.environment.platform.is_some() {
            self.environment.platform = other.environment.platform;
        }
        if other.environment.channel.is_some() {
            self.environment.channel = other.environment.channel;
        }

        // Lists are replaced, not merged
        if !other.opt_in.shims.is_empty() {
            self.opt_in.shims = other.opt_in.shims;
        }
    }

    /// Parse platform from config string.
    pub fn platform(&self) -> Option<HostPlatform> {
        parse_setting("environment.platform", self.environment.platform.as_deref())
    }

    /// Parse release channel from config string.
    pub fn channel(&self) -> Option<ReleaseChannel> {
        parse_setting("environment.channel", self.environment.channel.as_deref())
    }
}

fn parse_setting<T>(key: &str, value: Option<&str>) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let value = value?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!("ignoring config `{}`: {}", key, e);
            None
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.shimreg/config.toml)
/// 2. Global config (~/.shimreg/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        config.merge(Config::load_or_default(global_path));
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global shimreg config directory (~/.shimreg).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".shimreg"))
}

/// Get the global config path (~/.shimreg/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.shimreg/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".shimreg").join("config.toml")
}
