//! Configuration file management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Per-request timeout when nothing else is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Complete configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bindings: BindingsSettings,
}

/// Location of the filter bindings service, as read from the file or the
/// command line. Every key is optional until [`BindingsSettings::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BindingsSettings {
    /// Base URL, followed directly by the gateway version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Path between the version and the filter name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters_uri: Option<String>,
    /// Path after the filter name leading to its bindings document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bindings_location: Option<String>,
    /// Path after the filter name preceding the schema's own location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Settings with every key present
#[derive(Debug, Clone, PartialEq)]
pub struct BindingsConfig {
    pub endpoint: String,
    pub filters_uri: String,
    pub bindings_location: String,
    pub schema_location: String,
    pub timeout: Duration,
}

impl BindingsSettings {
    /// Keys set here win; unset keys are taken from `fallback`.
    pub fn or(self, fallback: BindingsSettings) -> Self {
        Self {
            endpoint: self.endpoint.or(fallback.endpoint),
            filters_uri: self.filters_uri.or(fallback.filters_uri),
            bindings_location: self.bindings_location.or(fallback.bindings_location),
            schema_location: self.schema_location.or(fallback.schema_location),
            timeout_secs: self.timeout_secs.or(fallback.timeout_secs),
        }
    }

    pub fn resolve(self) -> Result<BindingsConfig> {
        Ok(BindingsConfig {
            endpoint: self.endpoint.context(
                "Bindings endpoint not configured (set REPOSE_BINDINGS_ENDPOINT or bindings.endpoint)",
            )?,
            filters_uri: self.filters_uri.context(
                "Filters URI not configured (set REPOSE_FILTERS_URI or bindings.filters-uri)",
            )?,
            bindings_location: self.bindings_location.context(
                "Bindings location not configured (set REPOSE_BINDINGS_LOCATION or bindings.bindings-location)",
            )?,
            schema_location: self.schema_location.context(
                "Schema location not configured (set REPOSE_SCHEMA_LOCATION or bindings.schema-location)",
            )?,
            timeout: Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        })
    }
}

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let config_dir = directories::ProjectDirs::from("org", "openrepose", "repose-forms")
        .context("Could not determine config directory")?
        .config_dir()
        .to_path_buf();

    Ok(config_dir)
}

/// Get the config file path
pub fn config_file_path() -> Result<PathBuf> {
    let mut path = config_dir()?;
    path.push("config.toml");
    Ok(path)
}

/// Load the configuration.
///
/// An explicit `path` must exist. Without one the default location is used,
/// and a missing default file yields an empty configuration.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default_path = config_file_path()?;
            if !default_path.exists() {
                return Ok(Config::default());
            }
            default_path
        }
    };

    let contents = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

    tracing::debug!(path = ?config_path, "loaded config");
    Ok(config)
}
