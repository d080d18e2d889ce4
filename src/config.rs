use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub appdir: Option<String>,
    #[serde(default)]
    pub dbdir: Option<String>,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub catalog: CatalogConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenConfig {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default)]
    pub tlscert: Option<String>,
    #[serde(default)]
    pub tlskey: Option<String>,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: None,
            port: default_port(),
            tlscert: None,
            tlskey: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub sqlite: Option<SqliteConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SqliteConfig {
    pub filename: String,
}

/// Upstream movie catalog. `api_key` has no default on purpose; the server
/// refuses to start without one.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    pub api_key: String,
    #[serde(default = "default_catalog_url")]
    pub base_url: String,
    #[serde(default = "default_catalog_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_minutes: i64,
}

fn default_port() -> String {
    "3000".to_string()
}

fn default_catalog_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_catalog_timeout() -> u64 {
    10
}

fn default_token_ttl() -> i64 {
    15
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_string(), e))?;

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_string(), e))?;

        Ok(config)
    }

    pub fn get_database_path(&self) -> Option<String> {
        if let Some(ref sqlite) = self.database.sqlite {
            return Some(sqlite.filename.clone());
        }

        if let Some(ref dbdir) = self.dbdir {
            let path = PathBuf::from(dbdir).join("cinerec.db");
            return Some(path.to_string_lossy().to_string());
        }

        None
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(String, std::io::Error),
    #[error("Failed to parse config file {0}: {1}")]
    ParseError(String, serde_yaml::Error),
}
