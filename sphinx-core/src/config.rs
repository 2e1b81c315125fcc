//! Application configuration management.
//!
//! Holds the relay credentials, socket transport options, shared network
//! client timeouts and logging preferences. Configuration is persisted as
//! TOML on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::constants;
use crate::error::{SphinxError, SphinxResult};
use crate::platform::Platform;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Relay url and authorization token.
    #[serde(default)]
    pub relay: RelayConfig,

    /// Realtime socket transport options.
    #[serde(default)]
    pub socket: SocketConfig,

    /// Shared HTTP client settings.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Persisted relay credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Relay base url (e.g., "https://relay.example.com:3001").
    #[serde(default)]
    pub url: String,

    /// Authorization token issued by the relay.
    #[serde(default)]
    pub authorization_token: String,
}

/// Options handed to the socket transport when an instance is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketConfig {
    /// Let the transport reconnect on its own after a dropped connection.
    #[serde(default = "default_true")]
    pub reconnection: bool,

    /// Connect timeout in milliseconds. Independent of the HTTP client,
    /// which runs without timeouts for the streaming connection.
    #[serde(default = "default_socket_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Allow upgrading from polling to websocket.
    #[serde(default = "default_true")]
    pub upgrade: bool,

    /// Skip polling on later connections if a previous upgrade succeeded.
    #[serde(default)]
    pub remember_upgrade: bool,
}

/// Shared HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Request timeout in milliseconds for REST calls.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// TCP connect timeout in milliseconds for REST calls.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Accept self-signed certificates from the relay.
    #[serde(default)]
    pub accept_self_signed_certs: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for log files. If empty, uses the default location.
    #[serde(default)]
    pub directory: String,

    /// Write JSON lines to the log file instead of plain text.
    #[serde(default)]
    pub json_output: bool,
}

// Default value functions for serde

fn default_true() -> bool {
    true
}

fn default_socket_connect_timeout() -> u64 {
    constants::SOCKET_CONNECT_TIMEOUT_MS
}

fn default_request_timeout() -> u64 {
    constants::DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_connect_timeout() -> u64 {
    constants::DEFAULT_CONNECT_TIMEOUT_MS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            reconnection: true,
            connect_timeout_ms: default_socket_connect_timeout(),
            upgrade: true,
            remember_upgrade: false,
        }
    }
}

impl SocketConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout(),
            connect_timeout_ms: default_connect_timeout(),
            accept_self_signed_certs: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
            json_output: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default config file path.
    pub fn load_default() -> SphinxResult<Self> {
        let path = Self::default_config_path()?;
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> SphinxResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the default config file path.
    pub fn save_default(&self) -> SphinxResult<()> {
        let path = Self::default_config_path()?;
        self.save_to_file(&path)
    }

    /// Save configuration to a specific file path.
    pub fn save_to_file(&self, path: &Path) -> SphinxResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| SphinxError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn default_config_path() -> SphinxResult<PathBuf> {
        Ok(Platform::data_dir()?.join("config.toml"))
    }

    /// Get the effective log directory, using the configured path or the default.
    pub fn effective_log_dir(&self) -> SphinxResult<PathBuf> {
        if self.logging.directory.is_empty() {
            Ok(Platform::data_dir()?.join("logs"))
        } else {
            Ok(PathBuf::from(&self.logging.directory))
        }
    }

    /// Whether both relay credentials are present.
    pub fn is_relay_configured(&self) -> bool {
        !self.relay.url.trim().is_empty() && !self.relay.authorization_token.is_empty()
    }
}

/// Thread-safe configuration holder for shared access.
#[derive(Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<AppConfig>>,
    /// Where `save` writes to. `None` means the default config path.
    path: Option<PathBuf>,
}

impl ConfigHandle {
    pub fn new(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
            path: None,
        }
    }

    /// Create a handle that persists to `path` instead of the default location.
    pub fn with_path(config: AppConfig, path: PathBuf) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
            path: Some(path),
        }
    }

    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, AppConfig> {
        self.inner.read().await
    }

    pub async fn write(&self) -> tokio::sync::RwLockWriteGuard<'_, AppConfig> {
        self.inner.write().await
    }

    /// Save the current configuration to disk.
    pub async fn save(&self) -> SphinxResult<()> {
        let config = self.inner.read().await;
        match &self.path {
            Some(path) => config.save_to_file(path),
            None => config.save_default(),
        }
    }
}
