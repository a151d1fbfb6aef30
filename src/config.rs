//! Application configuration
//!
//! Loaded from a TOML file (by default `~/.config/products-ms/config.toml`),
//! then overridden by the `PORT`, `DATABASE_URL` and `NATS_SERVERS`
//! environment variables. Every section is optional; anything left out takes
//! its default.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 3001
//! shutdown_timeout = 30
//!
//! [database]
//! url = "sqlite://./products.db?mode=rwc"
//!
//! [logging]
//! level = "info"
//! json = false
//!
//! [rpc]
//! not_found_status = 400
//!
//! [bus]
//! servers = ["nats://localhost:4222"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infrastructure::DatabaseConfig;
use crate::interfaces::rpc::RpcErrorPolicy;

const APP_DIR: &str = "products-ms";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    Missing(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Default location of the config file.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE)
}

// ── Sections ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for cleanup after a shutdown signal
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            shutdown_timeout: 30,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// A deployed service needs a known port. Port 0 (OS-assigned) is only
    /// useful when the caller reads the bound port back, as tests do.
    pub fn require_fixed_port(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("server.port must be non-zero".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        let defaults = DatabaseConfig::default();
        Self {
            url: defaults.url,
            max_connections: defaults.max_connections,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `products_ms=debug,sqlx=warn`
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Status reported when a product lookup misses
    pub not_found_status: u16,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            not_found_status: RpcErrorPolicy::default().not_found_status,
        }
    }
}

/// Message broker connection. No servers means the bus stays in-process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub servers: Vec<String>,
}

// ── AppConfig ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub logging: LoggingConfig,
    pub rpc: RpcConfig,
    pub bus: BusConfig,
}

impl AppConfig {
    /// Read and parse a config file. Environment overrides are not applied.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::Missing(path.to_path_buf())
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `PORT`, `DATABASE_URL` and `NATS_SERVERS` from the process
    /// environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").filter(|v| !v.trim().is_empty()) {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv {
                    key: "PORT",
                    value: port.clone(),
                })?;
        }
        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()) {
            self.database.url = url;
        }
        if let Some(servers) = lookup("NATS_SERVERS").filter(|v| !v.trim().is_empty()) {
            self.bus.servers = servers
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Invalid("database.url must not be empty".into()));
        }
        if !(400..=599).contains(&self.rpc.not_found_status) {
            return Err(ConfigError::Invalid(format!(
                "rpc.not_found_status must be an error status (400-599), got {}",
                self.rpc.not_found_status
            )));
        }
        if self.bus.servers.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::Invalid("bus.servers must not contain empty entries".into()));
        }
        Ok(())
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
        }
    }

    pub fn rpc_policy(&self) -> RpcErrorPolicy {
        RpcErrorPolicy {
            not_found_status: self.rpc.not_found_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.address(), "0.0.0.0:3001");
        assert_eq!(cfg.server.shutdown_timeout, 30);
        assert_eq!(cfg.database.url, "sqlite://./products.db?mode=rwc");
        assert_eq!(cfg.logging.level, "info");
        assert!(!cfg.logging.json);
        assert_eq!(cfg.rpc.not_found_status, 400);
        assert!(cfg.bus.servers.is_empty());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
            [server]
            port = 4000

            [rpc]
            not_found_status = 404
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 4000);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.rpc_policy().not_found_status, 404);
        assert_eq!(cfg.logging, LoggingConfig::default());
    }

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(AppConfig::from_toml("").unwrap(), AppConfig::default());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let err = AppConfig::from_toml("[server\nport = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_reported_as_missing() {
        let path = std::env::temp_dir().join("products-ms-does-not-exist.toml");
        let err = AppConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(p) if p == path));
    }

    #[test]
    fn load_reads_a_file() {
        let path = std::env::temp_dir().join(format!("products-ms-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[logging]\nlevel = \"debug\"\njson = true\n").unwrap();
        let cfg = AppConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(cfg.logging.level, "debug");
        assert!(cfg.logging.json);
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = AppConfig::from_toml("[server]\nport = 4000").unwrap();
        cfg.apply_overrides(env(&[("PORT", "5000"), ("DATABASE_URL", "sqlite::memory:")]))
            .unwrap();
        assert_eq!(cfg.server.port, 5000);
        assert_eq!(cfg.database_config().url, "sqlite::memory:");
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut cfg = AppConfig::default();
        cfg.apply_overrides(env(&[("PORT", ""), ("DATABASE_URL", " ")]))
            .unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn non_numeric_port_is_rejected() {
        let mut cfg = AppConfig::default();
        let err = cfg.apply_overrides(env(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { key: "PORT", .. }));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = AppConfig::default();
        cfg.database.url = String::new();
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.rpc.not_found_status = 200;
        assert!(cfg.validate().is_err());

        cfg.rpc.not_found_status = 404;
        assert!(cfg.validate().is_ok());

        let mut cfg = AppConfig::default();
        cfg.bus.servers = vec!["nats://a:4222".into(), " ".into()];
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn os_assigned_port_is_valid_but_not_fixed() {
        let mut cfg = AppConfig::default();
        cfg.server.port = 0;
        assert!(cfg.validate().is_ok());

        let err = cfg.server.require_fixed_port().unwrap_err();
        assert_eq!(err.to_string(), "Invalid configuration: server.port must be non-zero");
        assert!(AppConfig::default().server.require_fixed_port().is_ok());
    }

    #[test]
    fn bus_servers_from_file_and_env() {
        let mut cfg = AppConfig::from_toml(
            r#"
            [bus]
            servers = ["nats://file:4222"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.bus.servers, vec!["nats://file:4222"]);

        cfg.apply_overrides(env(&[("NATS_SERVERS", "nats://a:4222, nats://b:4222,")]))
            .unwrap();
        assert_eq!(cfg.bus.servers, vec!["nats://a:4222", "nats://b:4222"]);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn default_path_ends_in_app_dir() {
        let path = default_config_path();
        assert!(path.ends_with("products-ms/config.toml"));
    }
}
