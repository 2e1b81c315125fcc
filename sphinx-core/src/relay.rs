//! Relay connection value types.
//!
//! `RelayUrl` and `AuthorizationToken` are thin validated wrappers so the
//! socket layer never passes bare strings around.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{SphinxError, SphinxResult};

lazy_static! {
    // Tor v3 hidden service: 56 base32 chars followed by `.onion`.
    static ref ONION_ADDRESS: Regex = Regex::new(r"^([a-z2-7]{56})\.onion.*").unwrap();
}

/// Base url of a Sphinx relay.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelayUrl(String);

impl RelayUrl {
    /// Create a relay url. Empty values are rejected.
    pub fn new(value: impl Into<String>) -> SphinxResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(SphinxError::InvalidRelayUrl("relay url cannot be empty".into()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the url points at a Tor hidden service.
    pub fn is_onion_address(&self) -> bool {
        let host = self
            .0
            .strip_prefix("http://")
            .or_else(|| self.0.strip_prefix("https://"))
            .unwrap_or(&self.0);
        ONION_ADDRESS.is_match(host)
    }

    /// Whether the url carries an explicit http or https scheme.
    pub fn has_scheme(&self) -> bool {
        self.0.starts_with("http://") || self.0.starts_with("https://")
    }

    /// Apply the default scheme when none is present.
    ///
    /// Onion addresses default to `http`, everything else to `https`.
    /// Urls that already carry a scheme are returned unmodified.
    pub fn with_default_scheme(self) -> Self {
        if self.has_scheme() {
            return self;
        }
        let scheme = if self.is_onion_address() { "http" } else { "https" };
        Self(format!("{scheme}://{}", self.0))
    }
}

impl TryFrom<String> for RelayUrl {
    type Error = SphinxError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RelayUrl> for String {
    fn from(url: RelayUrl) -> Self {
        url.0
    }
}

impl fmt::Display for RelayUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Token sent with every relay request in the [`AuthorizationToken::HEADER`] header.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AuthorizationToken(String);

impl AuthorizationToken {
    /// Header name the relay reads the token from.
    pub const HEADER: &'static str = "X-User-Token";

    pub fn new(value: impl Into<String>) -> SphinxResult<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(SphinxError::MissingCredentials("authorization token".into()));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AuthorizationToken {
    type Error = SphinxError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AuthorizationToken> for String {
    fn from(token: AuthorizationToken) -> Self {
        token.0
    }
}

// Never print the token itself.
impl fmt::Debug for AuthorizationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthorizationToken(<{} chars>)", self.0.len())
    }
}

/// The token and url pair a socket instance is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayCredentials {
    pub token: AuthorizationToken,
    pub url: RelayUrl,
}

impl RelayCredentials {
    pub fn new(token: AuthorizationToken, url: RelayUrl) -> Self {
        Self { token, url }
    }
}
