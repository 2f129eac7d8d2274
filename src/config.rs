//! Configuration System
//!
//! Loads console settings from a TOML file and applies `AUTOPOST_*`
//! environment overrides on top.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::controller::{DashboardConfig, DEFAULT_CONFIRM_TIMEOUT_SECS};
use crate::realtime::{
    socket_url, TransportConfig, DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_BASE_DELAY_MS,
    DEFAULT_RECONNECT_MAX_DELAY_MS, DEFAULT_SOCKET_PATH,
};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub realtime: RealtimeConfig,

    #[serde(default)]
    pub dashboard: DashboardSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Auto-posting server connection
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Base URL serving both the REST API and the Socket.IO endpoint
    #[serde(default = "default_server_url")]
    pub url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_server_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Socket.IO transport
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    #[serde(default = "default_socket_path")]
    pub path: String,

    #[serde(default = "default_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    #[serde(default = "default_reconnect_base_delay")]
    pub reconnect_base_delay_ms: u64,

    #[serde(default = "default_reconnect_max_delay")]
    pub reconnect_max_delay_ms: u64,
}

fn default_socket_path() -> String {
    DEFAULT_SOCKET_PATH.to_string()
}

fn default_reconnect_attempts() -> u32 {
    DEFAULT_MAX_RECONNECT_ATTEMPTS
}

fn default_reconnect_base_delay() -> u64 {
    DEFAULT_RECONNECT_BASE_DELAY_MS
}

fn default_reconnect_max_delay() -> u64 {
    DEFAULT_RECONNECT_MAX_DELAY_MS
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            path: default_socket_path(),
            max_reconnect_attempts: default_reconnect_attempts(),
            reconnect_base_delay_ms: default_reconnect_base_delay(),
            reconnect_max_delay_ms: default_reconnect_max_delay(),
        }
    }
}

/// Dashboard behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardSettings {
    /// Seconds an optimistic action may wait for the server before reverting
    #[serde(default = "default_confirm_timeout")]
    pub confirm_timeout_secs: u64,
}

fn default_confirm_timeout() -> u64 {
    DEFAULT_CONFIRM_TIMEOUT_SECS.unsigned_abs()
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            confirm_timeout_secs: default_confirm_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("autopost").join("config.toml")),
            Some(PathBuf::from("/etc/autopost/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `AUTOPOST_*` overrides read through `lookup`.
    /// Unparsable numbers are ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("AUTOPOST_SERVER_URL") {
            self.server.url = url;
        }
        if let Some(secs) = lookup("AUTOPOST_REQUEST_TIMEOUT") {
            match secs.parse() {
                Ok(secs) => self.server.request_timeout_secs = secs,
                Err(_) => tracing::warn!(value = %secs, "Ignoring invalid AUTOPOST_REQUEST_TIMEOUT"),
            }
        }
        if let Some(secs) = lookup("AUTOPOST_CONFIRM_TIMEOUT") {
            match secs.parse() {
                Ok(secs) => self.dashboard.confirm_timeout_secs = secs,
                Err(_) => tracing::warn!(value = %secs, "Ignoring invalid AUTOPOST_CONFIRM_TIMEOUT"),
            }
        }
        if let Some(level) = lookup("AUTOPOST_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("AUTOPOST_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Transport settings for the configured server
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            url: socket_url(&self.server.url, &self.realtime.path),
            max_reconnect_attempts: self.realtime.max_reconnect_attempts,
            reconnect_base_delay: Duration::from_millis(self.realtime.reconnect_base_delay_ms),
            reconnect_max_delay: Duration::from_millis(self.realtime.reconnect_max_delay_ms),
        }
    }

    pub fn dashboard(&self) -> DashboardConfig {
        DashboardConfig {
            confirmation_timeout: chrono::Duration::seconds(
                self.dashboard.confirm_timeout_secs.min(u64::from(u32::MAX)) as i64,
            ),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Autopost Console Configuration
#
# Environment variables override these settings:
# - AUTOPOST_SERVER_URL
# - AUTOPOST_REQUEST_TIMEOUT
# - AUTOPOST_CONFIRM_TIMEOUT
# - AUTOPOST_LOG_LEVEL
# - AUTOPOST_LOG_FORMAT

[server]
# Auto-posting server (REST API and Socket.IO endpoint)
url = "http://localhost:5000"

# Request timeout in seconds
request_timeout_secs = 30

[realtime]
# Socket.IO endpoint path
path = "/socket.io/"

# Consecutive failed connection attempts before giving up
max_reconnect_attempts = 5

# Reconnect backoff: first delay and upper bound (ms)
reconnect_base_delay_ms = 1000
reconnect_max_delay_ms = 30000

[dashboard]
# Seconds to wait for the server to confirm start/stop/post actions
confirm_timeout_secs = 30

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/autopost/console.log"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.url, "http://localhost:5000");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.realtime.max_reconnect_attempts, 5);
        assert_eq!(
            config.dashboard().confirmation_timeout,
            chrono::Duration::seconds(30)
        );
    }

    #[test]
    fn test_generated_config_parses_to_defaults() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.server.url, default_server_url());
        assert_eq!(config.realtime.path, "/socket.io/");
        assert_eq!(config.realtime.reconnect_max_delay_ms, 30_000);
        assert_eq!(config.logging.format, "pretty");
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nurl = \"https://poster.example\"\n\n[dashboard]\nconfirm_timeout_secs = 5"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.url, "https://poster.example");
        assert_eq!(config.server.request_timeout_secs, 30);
        assert_eq!(config.dashboard.confirm_timeout_secs, 5);
        assert_eq!(
            config.transport().url,
            "wss://poster.example/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(Config::load(&missing), Err(ConfigError::Io { .. })));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[server\nurl = 1").unwrap();
        assert!(matches!(Config::load(&bad), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("AUTOPOST_SERVER_URL", "http://10.0.0.2:5000"),
            ("AUTOPOST_REQUEST_TIMEOUT", "5"),
            ("AUTOPOST_CONFIRM_TIMEOUT", "soon"),
            ("AUTOPOST_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.url, "http://10.0.0.2:5000");
        assert_eq!(config.server.request_timeout_secs, 5);
        assert_eq!(config.dashboard.confirm_timeout_secs, 30);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_transport_settings() {
        let transport = Config::default().transport();
        assert_eq!(
            transport.url,
            "ws://localhost:5000/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(transport.reconnect_base_delay, Duration::from_secs(1));
        assert_eq!(transport.reconnect_max_delay, Duration::from_secs(30));
    }
}
