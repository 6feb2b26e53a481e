//! Configuration module for Confab.

use serde::Deserialize;
use std::path::Path;

use crate::{ConfabError, Result};

/// RPC server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum number of concurrent connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Idle timeout in seconds.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    /// Maximum length of a single request line in bytes.
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4040
}

fn default_max_connections() -> usize {
    64
}

fn default_idle_timeout() -> u64 {
    300
}

fn default_max_line_bytes() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_connections: default_max_connections(),
            idle_timeout_secs: default_idle_timeout(),
            max_line_bytes: default_max_line_bytes(),
        }
    }
}

/// Directory configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    /// Rooms created at startup, in order.
    #[serde(default)]
    pub default_rooms: Vec<String>,
    /// Maximum length of room names and usernames, in characters.
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
    /// Maximum length of a message body, in characters.
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
}

fn default_max_name_length() -> usize {
    64
}

fn default_max_message_length() -> usize {
    4096
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            default_rooms: Vec::new(),
            max_name_length: default_max_name_length(),
            max_message_length: default_max_message_length(),
        }
    }
}

/// Web API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Enable the HTTP API.
    #[serde(default)]
    pub enabled: bool,
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// Allowed CORS origins (empty = allow any).
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_web_port() -> u16 {
    8080
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_host(),
            port: default_web_port(),
            cors_origins: Vec::new(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file (empty = console only).
    #[serde(default)]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: String::new(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// RPC server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Directory configuration.
    #[serde(default)]
    pub directory: DirectoryConfig,
    /// Web API configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfabError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| ConfabError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables (empty values are ignored):
    /// - `CONFAB_HOST`: RPC listener host
    /// - `CONFAB_PORT`: RPC listener port
    /// - `CONFAB_LOG_LEVEL`: log level
    pub fn apply_env_overrides(&mut self) {
        if let Some(host) = env_non_empty("CONFAB_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_non_empty("CONFAB_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %port, "ignoring invalid CONFAB_PORT"),
            }
        }
        if let Some(level) = env_non_empty("CONFAB_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.server.max_connections == 0 {
            return Err(ConfabError::Validation(
                "server.max_connections must be at least 1".to_string(),
            ));
        }
        if self.server.idle_timeout_secs == 0 {
            return Err(ConfabError::Validation(
                "server.idle_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.server.max_line_bytes == 0 {
            return Err(ConfabError::Validation(
                "server.max_line_bytes must be at least 1".to_string(),
            ));
        }
        if self.directory.max_name_length == 0 {
            return Err(ConfabError::Validation(
                "directory.max_name_length must be at least 1".to_string(),
            ));
        }

        let mut seen = Vec::new();
        for name in &self.directory.default_rooms {
            if name.trim().is_empty() {
                return Err(ConfabError::Validation(
                    "directory.default_rooms contains a blank name".to_string(),
                ));
            }
            if name.chars().any(char::is_control) {
                return Err(ConfabError::Validation(format!(
                    "default room {name:?} contains a control character"
                )));
            }
            if name.chars().count() > self.directory.max_name_length {
                return Err(ConfabError::Validation(format!(
                    "default room {name} exceeds directory.max_name_length"
                )));
            }
            if seen.contains(&name) {
                return Err(ConfabError::Validation(format!(
                    "default room {name} is listed twice"
                )));
            }
            seen.push(name);
        }
        Ok(())
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
