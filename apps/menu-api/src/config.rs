//! # Server Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     MENU_PORT=8080                                                     │
//! │     MENU_ORDER_NUMBERING=daily                                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path> or MENU_CONFIG                                     │
//! │     ~/.config/menu/menu.toml (Linux)                                   │
//! │     ~/Library/Application Support/com.menu.menu/menu.toml (macOS)      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [server]
//! bind_addr = "0.0.0.0"
//! port = 5000
//!
//! [database]
//! path = "menu.db"
//! max_connections = 5
//!
//! [orders]
//! numbering = "global"  # global | daily
//!
//! [notify]
//! channel_capacity = 256
//! ping_interval_secs = 30
//!
//! [logging]
//! filter = "info,menu_api=debug"
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use menu_core::order::NumberingMode;
use menu_db::DbConfig;
use menu_notify::HubConfig;

/// Log filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "info,menu_api=debug,menu_db=debug,sqlx=warn";

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

impl ConfigError {
    fn invalid(key: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Bind address (default: 0.0.0.0 for all interfaces).
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Created on first start.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("menu.db")
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderSettings {
    /// How order numbers are counted. `global` never resets the counter,
    /// `daily` restarts it with each new date prefix.
    #[serde(default)]
    pub numbering: NumberingMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifySettings {
    /// Events buffered per subscriber before a slow console starts skipping.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,
}

fn default_channel_capacity() -> usize {
    256
}

fn default_ping_interval() -> u64 {
    30
}

impl Default for NotifySettings {
    fn default() -> Self {
        NotifySettings {
            channel_capacity: default_channel_capacity(),
            ping_interval_secs: default_ping_interval(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive. `RUST_LOG` wins over it.
    #[serde(default)]
    pub filter: Option<String>,
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub orders: OrderSettings,

    #[serde(default)]
    pub notify: NotifySettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (menu.toml); a missing file is not an error
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = match config_path.or_else(Self::default_config_path) {
            Some(path) if path.exists() => {
                info!(?path, "Loading config from file");
                Self::from_file(path)?
            }
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: PathBuf) -> ConfigResult<Self> {
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.bind_addr.parse::<IpAddr>().is_err() {
            return Err(ConfigError::invalid(
                "server.bind_addr",
                format!("'{}' is not an IP address", self.server.bind_addr),
            ));
        }

        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::invalid("database.path", "must not be empty"));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::invalid(
                "database.max_connections",
                "must be greater than 0",
            ));
        }

        if self.notify.channel_capacity == 0 {
            return Err(ConfigError::invalid(
                "notify.channel_capacity",
                "must be greater than 0",
            ));
        }

        if self.notify.ping_interval_secs == 0 {
            return Err(ConfigError::invalid(
                "notify.ping_interval_secs",
                "must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Applies `MENU_*` overrides read through `lookup`.
    ///
    /// Unparsable values are logged and ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = lookup("MENU_BIND_ADDR") {
            self.server.bind_addr = addr;
        }

        if let Some(port) = lookup("MENU_PORT") {
            match port.parse::<u16>() {
                Ok(p) => {
                    debug!(port = p, "Overriding port from environment");
                    self.server.port = p;
                }
                Err(_) => warn!(value = %port, "Ignoring invalid MENU_PORT"),
            }
        }

        if let Some(path) = lookup("MENU_DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup("MENU_DB_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(m) => self.database.max_connections = m,
                Err(_) => warn!(value = %max, "Ignoring invalid MENU_DB_MAX_CONNECTIONS"),
            }
        }

        if let Some(mode) = lookup("MENU_ORDER_NUMBERING") {
            match mode.parse::<NumberingMode>() {
                Ok(m) => {
                    debug!(numbering = ?m, "Overriding order numbering from environment");
                    self.orders.numbering = m;
                }
                Err(_) => warn!(value = %mode, "Ignoring unknown MENU_ORDER_NUMBERING"),
            }
        }

        if let Some(capacity) = lookup("MENU_NOTIFY_CAPACITY") {
            match capacity.parse::<usize>() {
                Ok(c) => self.notify.channel_capacity = c,
                Err(_) => warn!(value = %capacity, "Ignoring invalid MENU_NOTIFY_CAPACITY"),
            }
        }

        if let Some(filter) = lookup("MENU_LOG") {
            self.logging.filter = Some(filter);
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "menu", "menu")
            .map(|dirs| dirs.config_dir().join("menu.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn socket_addr(&self) -> ConfigResult<SocketAddr> {
        let ip: IpAddr = self
            .server
            .bind_addr
            .parse()
            .map_err(|_| ConfigError::invalid("server.bind_addr", "not an IP address"))?;
        Ok(SocketAddr::new(ip, self.server.port))
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path).max_connections(self.database.max_connections)
    }

    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            ping_interval: Duration::from_secs(self.notify.ping_interval_secs),
        }
    }

    pub fn log_filter(&self) -> &str {
        self.logging.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

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
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.orders.numbering, NumberingMode::Global);
        assert_eq!(config.notify.channel_capacity, 256);
        assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            port = 8080

            [orders]
            numbering = "daily"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind_addr, "0.0.0.0");
        assert_eq!(config.orders.numbering, NumberingMode::Daily);
        assert_eq!(config.notify.ping_interval_secs, 30);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config: AppConfig = toml::from_str("[server]\nport = 8080\n").unwrap();
        config.apply_overrides(env(&[
            ("MENU_PORT", "9090"),
            ("MENU_ORDER_NUMBERING", "DAILY"),
            ("MENU_DATABASE_PATH", "/tmp/menu.db"),
            ("MENU_LOG", "warn"),
        ]));

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.orders.numbering, NumberingMode::Daily);
        assert_eq!(config.database.path, PathBuf::from("/tmp/menu.db"));
        assert_eq!(config.log_filter(), "warn");
    }

    #[test]
    fn test_invalid_env_values_ignored() {
        let mut config = AppConfig::default();
        config.apply_overrides(env(&[
            ("MENU_PORT", "not-a-port"),
            ("MENU_ORDER_NUMBERING", "weekly"),
        ]));

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.orders.numbering, NumberingMode::Global);
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut config = AppConfig::default();
        config.notify.channel_capacity = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "notify.channel_capacity"
        ));
    }

    #[test]
    fn test_validate_rejects_bad_bind_addr() {
        let mut config = AppConfig::default();
        config.server.bind_addr = "localhost:5000".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_socket_addr_and_hub_config() {
        let mut config = AppConfig::default();
        config.server.bind_addr = "127.0.0.1".to_string();
        config.notify.ping_interval_secs = 15;

        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:5000");
        assert_eq!(config.hub_config().ping_interval, Duration::from_secs(15));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load(Some(PathBuf::from("/nonexistent/menu.toml"))).unwrap();
        assert_eq!(config.database.path.file_name().unwrap(), "menu.db");
    }
}
