use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

pub const DEFAULT_PAGE_SIZE: usize = 12;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_STORAGE_BUCKET: &str = "artworks";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

fn default_storage_bucket() -> String {
    DEFAULT_STORAGE_BUCKET.to_string()
}

/// YAML config file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigYaml {
    /// Base URL of the hosted backend (REST and storage live under it)
    pub backend_url: String,
    /// Public (anonymous) API key sent with every request
    pub anon_key: String,
    /// Records per gallery page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Upper bound for a single page fetch
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Object storage bucket holding artwork images
    #[serde(default = "default_storage_bucket")]
    pub storage_bucket: String,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub backend_url: String,
    pub anon_key: String,
    pub page_size: usize,
    pub fetch_timeout: Duration,
    pub storage_bucket: String,
}

impl Config {
    /// Load from `.env` / environment in dev mode, otherwise from config.yaml.
    pub fn load() -> Result<Self, ConfigError> {
        let dev_mode = std::env::var("KALA_DEV_MODE").is_ok() || dotenvy::dotenv().is_ok();
        if dev_mode {
            info!("Dev mode activated - loading from environment");
            Self::from_env_with(|key| std::env::var(key).ok())
        } else {
            let path = Self::config_path()?;
            info!("Loading config from {}", path.display());
            Self::from_config_file(&path)
        }
    }

    /// Default location of config.yaml (`<config_dir>/kala/config.yaml`).
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("kala").join("config.yaml"))
            .ok_or_else(|| ConfigError::Config("could not determine config directory".into()))
    }

    /// Build from `KALA_*` variables resolved through `lookup`.
    pub fn from_env_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend_url = get("KALA_BACKEND_URL")
            .ok_or_else(|| ConfigError::Config("KALA_BACKEND_URL is not set".into()))?;
        let anon_key = get("KALA_ANON_KEY")
            .ok_or_else(|| ConfigError::Config("KALA_ANON_KEY is not set".into()))?;
        let page_size = match get("KALA_PAGE_SIZE") {
            Some(v) => parse_number("KALA_PAGE_SIZE", &v)?,
            None => DEFAULT_PAGE_SIZE,
        };
        let fetch_timeout_secs = match get("KALA_FETCH_TIMEOUT_SECS") {
            Some(v) => parse_number("KALA_FETCH_TIMEOUT_SECS", &v)?,
            None => DEFAULT_FETCH_TIMEOUT_SECS,
        };
        let storage_bucket =
            get("KALA_STORAGE_BUCKET").unwrap_or_else(|| DEFAULT_STORAGE_BUCKET.to_string());

        Self::from_yaml(ConfigYaml {
            backend_url,
            anon_key,
            page_size,
            fetch_timeout_secs,
            storage_bucket,
        })
    }

    pub fn from_config_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let yaml: ConfigYaml = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Serialization(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(yaml)
    }

    fn from_yaml(yaml: ConfigYaml) -> Result<Self, ConfigError> {
        if yaml.page_size == 0 {
            return Err(ConfigError::Config("page_size must be at least 1".into()));
        }
        if yaml.fetch_timeout_secs == 0 {
            return Err(ConfigError::Config(
                "fetch_timeout_secs must be at least 1".into(),
            ));
        }

        Ok(Self {
            backend_url: yaml.backend_url.trim_end_matches('/').to_string(),
            anon_key: yaml.anon_key,
            page_size: yaml.page_size,
            fetch_timeout: Duration::from_secs(yaml.fetch_timeout_secs),
            storage_bucket: yaml.storage_bucket,
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = ConfigYaml {
            backend_url: self.backend_url.clone(),
            anon_key: self.anon_key.clone(),
            page_size: self.page_size,
            fetch_timeout_secs: self.fetch_timeout.as_secs(),
            storage_bucket: self.storage_bucket.clone(),
        };
        let content =
            serde_yaml::to_string(&yaml).map_err(|e| ConfigError::Serialization(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Config(format!("{key} is not a valid number: {value}")))
}
