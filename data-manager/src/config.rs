//! Data manager configuration loading and parsing

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_PATH: &str = "data-manager.toml";

/// Root configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct DataManagerConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the site's `.ts` data modules
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backup_dir: default_backup_dir(),
        }
    }
}

impl DataManagerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Apply `DATA_MANAGER_*` overrides through `lookup`
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(port) = lookup("DATA_MANAGER_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid DATA_MANAGER_PORT value: {port}"))?;
        }
        if let Some(dir) = lookup("DATA_MANAGER_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("DATA_MANAGER_BACKUP_DIR") {
            self.storage.backup_dir = PathBuf::from(dir);
        }
        Ok(())
    }
}

// Default value functions
fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 3002 }
fn default_data_dir() -> PathBuf { PathBuf::from("../../src/data") }
fn default_backup_dir() -> PathBuf { PathBuf::from("backups") }

/// Load configuration from `DATA_MANAGER_CONFIG` or ./data-manager.toml
pub fn load_config() -> Result<DataManagerConfig> {
    let config_path = std::env::var("DATA_MANAGER_CONFIG")
        .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let mut config = load_from(Path::new(&config_path))?;
    config.apply_overrides(|key| std::env::var(key).ok())?;
    Ok(config)
}

fn load_from(path: &Path) -> Result<DataManagerConfig> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: DataManagerConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        Ok(config)
    } else {
        tracing::warn!("Config file not found at {}, using defaults", path.display());
        Ok(DataManagerConfig::default())
    }
}
