//! Global error types for the Sphinx relay client.
//!
//! Every failure the realtime layer can surface is folded into a single
//! `SphinxError` enum, with conversions from the underlying library errors.

use thiserror::Error;

/// Convenience type alias for Results using SphinxError.
pub type SphinxResult<T> = Result<T, SphinxError>;

/// Unified error type for the relay client crates.
#[derive(Error, Debug)]
pub enum SphinxError {
    // -- Configuration errors --
    /// Failed to load or parse application configuration.
    #[error("configuration error: {0}")]
    Config(String),

    // -- Credential errors --
    /// The relay url or authorization token could not be retrieved.
    #[error("was unable to retrieve the {0} from storage")]
    MissingCredentials(String),

    /// A relay url failed validation.
    #[error("invalid relay url: {0}")]
    InvalidRelayUrl(String),

    // -- Socket errors --
    /// The transport instance could not be created.
    #[error("failed to create socket-io instance: {0}")]
    SocketBuild(String),

    /// An inbound payload could not be decoded into a typed message.
    #[error("classification error: {0}")]
    Classification(String),

    /// A message listener failed while handling a message.
    #[error("listener error: {0}")]
    Listener(String),

    // -- Network errors --
    /// HTTP client construction or request failed.
    #[error("http error: {0}")]
    Http(String),

    // -- File/IO errors --
    /// File system operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    // -- Generic --
    /// An unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Wrapping anyhow errors for interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SphinxError {
    /// Whether this error prevents a connection attempt from proceeding.
    pub fn is_connect_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingCredentials(_) | Self::InvalidRelayUrl(_) | Self::SocketBuild(_)
        )
    }
}

impl From<serde_json::Error> for SphinxError {
    fn from(e: serde_json::Error) -> Self {
        SphinxError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for SphinxError {
    fn from(e: toml::de::Error) -> Self {
        SphinxError::Config(e.to_string())
    }
}
