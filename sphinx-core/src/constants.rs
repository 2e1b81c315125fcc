//! Application-wide constants.

/// Application name, used for the data directory and log file names.
pub const APP_NAME: &str = "SphinxRelay";

/// Application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Timeout for establishing the realtime socket connection.
pub const SOCKET_CONNECT_TIMEOUT_MS: u64 = 20_000;

/// Default timeout for REST requests made by the shared network client.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Default TCP connect timeout for the shared network client.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 15_000;

/// Capacity of the connection error broadcast channel.
pub const CONNECTION_ERROR_CHANNEL_CAPACITY: usize = 16;

/// Log file name prefix for the rolling file appender.
pub const LOG_FILE_NAME: &str = "sphinx-relay.log";
