//! Configuration loading from TOML files

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use esferry_client::ConnectOptions;
use esferry_transfer::ImportOptions;
use serde::Deserialize;

/// Global configuration for esferry
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub connection: ConnectionConfig,
    pub transfer: TransferConfig,
    pub import: ImportConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ConnectionConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Scroll page size for export
    pub page_size: usize,
    /// Default transfer file (export output, import input)
    pub output: PathBuf,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            page_size: 500,
            output: PathBuf::from("out.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Document type written on import
    pub doc_type: String,
    /// Linear backoff unit in seconds
    pub backoff_secs: u64,
    /// Consecutive failures at one position before giving up
    pub max_consecutive_failures: u32,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            doc_type: "_doc".to_string(),
            backoff_secs: 5,
            max_consecutive_failures: 10,
        }
    }
}

/// Deserialize a string that may contain environment variable reference like ${VAR}
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| expand_env_var(&s)))
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./esferry.toml (current directory)
    /// 2. ~/.config/esferry/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("esferry.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "esferry") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Merge CLI connection flags over config values.
    ///
    /// The endpoint URL is the one setting without a usable default; a run
    /// without it fails here, before anything touches the network.
    pub fn connection(
        &self,
        url: Option<String>,
        username: Option<String>,
        password: Option<String>,
        trace_requests: bool,
    ) -> Result<ConnectOptions> {
        let url = url.or_else(|| self.connection.url.clone()).context(
            "endpoint URL is required (pass --url or set [connection] url in esferry.toml)",
        )?;
        Ok(ConnectOptions {
            url,
            username: username.or_else(|| self.connection.username.clone()),
            password: password.or_else(|| self.connection.password.clone()),
            trace_requests,
        })
    }

    /// Retry tuning for the import pipeline.
    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            backoff_unit: std::time::Duration::from_secs(self.import.backoff_secs),
            max_consecutive_failures: self.import.max_consecutive_failures,
        }
    }
}
