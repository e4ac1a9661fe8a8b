//! Runtime configuration loaded from a JSON file.
//!
//! # Responsibility
//! - Locate the config file (explicit path or `QUIRE_CONFIG`).
//! - Validate relay endpoints and translate tunables into `SyncOptions`.
//!
//! # Invariants
//! - At least one valid relay endpoint is configured.
//! - Relay endpoints are normalized and deduplicated in first-seen order.

use crate::relay::registry::{is_valid_endpoint, normalize_endpoint};
use crate::service::ingest_service::SyncOptions;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the config file path.
pub const CONFIG_ENV_VAR: &str = "QUIRE_CONFIG";

const DEFAULT_DB_FILE_NAME: &str = "quire.sqlite3";

#[derive(Debug)]
pub enum ConfigError {
    MissingEnvVar(&'static str),
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
    NoRelays,
    InvalidRelay(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnvVar(name) => write!(f, "{name} env var not set"),
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::NoRelays => write!(f, "config must list at least one relay"),
            Self::InvalidRelay(value) => write!(f, "invalid relay endpoint in config: `{value}`"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

fn default_article_fetch_limit() -> u32 {
    SyncOptions::default().article_fetch_limit
}

fn default_store_article_limit() -> u32 {
    SyncOptions::default().store_article_limit
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    pub relays: Vec<String>,
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    #[serde(default)]
    pub log_level: Option<String>,
    /// Absolute directory for rolling log files; logging stays off when unset.
    #[serde(default)]
    pub log_dir: Option<String>,
    #[serde(default)]
    pub sync_deadline_ms: Option<u64>,
    #[serde(default = "default_article_fetch_limit")]
    pub article_fetch_limit: u32,
    #[serde(default = "default_store_article_limit")]
    pub store_article_limit: u32,
}

impl AppConfig {
    /// Parses and validates config JSON.
    pub fn from_json(path: &Path, raw: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.relays = normalize_relays(&config.relays)?;
        Ok(config)
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            deadline: self.sync_deadline_ms.map(Duration::from_millis),
            article_fetch_limit: self.article_fetch_limit,
            store_article_limit: self.store_article_limit,
        }
    }

    /// Configured database path, defaulting to a file in the working directory.
    pub fn db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE_NAME))
    }
}

/// Loads config from an explicit path.
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    AppConfig::from_json(path, &raw)
}

/// Loads config from the path in `QUIRE_CONFIG`.
pub fn load_config_from_env() -> Result<AppConfig, ConfigError> {
    let path = std::env::var_os(CONFIG_ENV_VAR).ok_or(ConfigError::MissingEnvVar(CONFIG_ENV_VAR))?;
    load_config(PathBuf::from(path))
}

fn normalize_relays(relays: &[String]) -> Result<Vec<String>, ConfigError> {
    let mut normalized: Vec<String> = Vec::with_capacity(relays.len());
    for relay in relays {
        let endpoint = normalize_endpoint(relay);
        if !is_valid_endpoint(&endpoint) {
            return Err(ConfigError::InvalidRelay(relay.clone()));
        }
        if !normalized.contains(&endpoint) {
            normalized.push(endpoint);
        }
    }
    if normalized.is_empty() {
        return Err(ConfigError::NoRelays);
    }
    Ok(normalized)
}
