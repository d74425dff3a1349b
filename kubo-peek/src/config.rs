// ABOUTME: Configuration file loading, validation, and hierarchical merging for kubo-peek
// ABOUTME: Supports TOML config files in XDG locations and the working directory, resolved into runtime settings

use crate::constants::{config_files, dispatch::DEFAULT_QUEUE_CAPACITY, logging};
use anyhow::{anyhow, Context, Result};
use kubo_sdk::constants::urls::DEFAULT_API_URL;
use log::LevelFilter;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub queue_capacity: Option<usize>,
    #[serde(default, deserialize_with = "validate_log_level")]
    pub abandon_log_level: Option<String>,
}

/// Fully resolved runtime settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_url: Url,
    pub queue_capacity: usize,
    pub abandon_log_level: LevelFilter,
}

impl Config {
    /// Load configuration from the standard locations
    pub fn load() -> Result<Self> {
        Self::load_from_paths(&Self::get_config_paths())
    }

    /// Load the standard locations, then an explicitly requested file on top
    pub fn load_with(explicit: Option<&Path>) -> Result<Self> {
        let config = Self::load()?;
        match explicit {
            Some(path) => Ok(config.merge(Self::load_from_file(path)?)),
            None => Ok(config),
        }
    }

    /// Load configuration from file paths in order of precedence, lowest first.
    /// Missing files are skipped; files that exist must parse.
    pub fn load_from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut config = Config::default();

        for path in paths {
            let path = path.as_ref();
            if !path.is_file() {
                continue;
            }
            log::debug!("Loading config from {}", path.display());
            config = config.merge(Self::load_from_file(path)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a single file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse TOML config file: {}",
                path.as_ref().display()
            )
        })?;

        config.validate().with_context(|| {
            format!("Invalid config file: {}", path.as_ref().display())
        })?;
        Ok(config)
    }

    /// Standard config file paths in order of precedence (lowest first)
    pub fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. User config directory fallback
        if let Some(home_dir) = dirs::home_dir() {
            paths.push(
                home_dir
                    .join(".config")
                    .join(config_files::APP_DIR)
                    .join(config_files::FILE_NAME),
            );
        }

        // 2. XDG config home
        if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME") {
            let path = PathBuf::from(config_home)
                .join(config_files::APP_DIR)
                .join(config_files::FILE_NAME);
            if !paths.contains(&path) {
                paths.push(path);
            }
        }

        // 3. Project-specific config (highest precedence)
        if let Ok(current_dir) = std::env::current_dir() {
            paths.push(current_dir.join(config_files::PROJECT_FILE));
        }

        paths
    }

    /// Merge this config with another, giving precedence to the other config
    pub fn merge(self, other: Config) -> Config {
        Config {
            api_url: other.api_url.or(self.api_url),
            queue_capacity: other.queue_capacity.or(self.queue_capacity),
            abandon_log_level: other.abandon_log_level.or(self.abandon_log_level),
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(ref api_url) = self.api_url {
            parse_api_url(api_url)?;
        }

        if self.queue_capacity == Some(0) {
            return Err(anyhow!("queue_capacity must be at least 1"));
        }

        Ok(())
    }

    /// Fill unset values with defaults
    pub fn resolve(&self) -> Result<Settings> {
        self.validate()?;

        let api_url = parse_api_url(self.api_url.as_deref().unwrap_or(DEFAULT_API_URL))?;

        let abandon_log_level = match self.abandon_log_level {
            Some(ref level) => LevelFilter::from_str(level)
                .map_err(|_| anyhow!("Invalid abandon_log_level '{}'", level))?,
            None => logging::DEFAULT_ABANDON_LEVEL,
        };

        Ok(Settings {
            api_url,
            queue_capacity: self.queue_capacity.unwrap_or(DEFAULT_QUEUE_CAPACITY),
            abandon_log_level,
        })
    }
}

fn parse_api_url(api_url: &str) -> Result<Url> {
    let url = Url::parse(api_url).with_context(|| format!("Invalid api_url '{}'", api_url))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(anyhow!(
            "Invalid api_url '{}': scheme must be http or https, not {}",
            api_url,
            scheme
        )),
    }
}

// Custom deserializer for log level validation
fn validate_log_level<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value: Option<String> = Option::deserialize(deserializer)?;

    if let Some(ref level) = value {
        if LevelFilter::from_str(level).is_err() {
            return Err(D::Error::custom(format!(
                "Invalid log level '{}'. Must be one of: off, error, warn, info, debug, trace",
                level
            )));
        }
    }

    Ok(value)
}
