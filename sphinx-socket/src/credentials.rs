//! Storage of the relay url and authorization token.

use async_trait::async_trait;
use tracing::{debug, warn};

use sphinx_core::config::ConfigHandle;
use sphinx_core::error::{SphinxError, SphinxResult};
use sphinx_core::relay::{AuthorizationToken, RelayCredentials, RelayUrl};

/// Source of the credentials a socket instance is built from.
#[async_trait]
pub trait RelayDataHandler: Send + Sync {
    async fn persist_relay_url(&self, url: &RelayUrl) -> SphinxResult<()>;

    async fn retrieve_relay_url(&self) -> Option<RelayUrl>;

    async fn persist_authorization_token(&self, token: &AuthorizationToken) -> SphinxResult<()>;

    async fn retrieve_authorization_token(&self) -> Option<AuthorizationToken>;

    /// Both credentials, or which one is missing.
    async fn retrieve_relay_url_and_token(&self) -> SphinxResult<RelayCredentials> {
        let url = self
            .retrieve_relay_url()
            .await
            .ok_or_else(|| SphinxError::MissingCredentials("relay url".into()))?;
        let token = self
            .retrieve_authorization_token()
            .await
            .ok_or_else(|| SphinxError::MissingCredentials("authorization token".into()))?;
        Ok(RelayCredentials::new(token, url))
    }

    /// Add the default scheme to a url entered without one.
    fn format_relay_url(&self, url: RelayUrl) -> RelayUrl {
        url.with_default_scheme()
    }
}

/// [`RelayDataHandler`] backed by the application config file.
#[derive(Clone)]
pub struct ConfigRelayDataHandler {
    config: ConfigHandle,
}

impl ConfigRelayDataHandler {
    pub fn new(config: ConfigHandle) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RelayDataHandler for ConfigRelayDataHandler {
    async fn persist_relay_url(&self, url: &RelayUrl) -> SphinxResult<()> {
        let url = self.format_relay_url(url.clone());
        self.config.write().await.relay.url = url.to_string();
        self.config.save().await?;
        debug!("relay url persisted");
        Ok(())
    }

    async fn retrieve_relay_url(&self) -> Option<RelayUrl> {
        let stored = self.config.read().await.relay.url.clone();
        if stored.trim().is_empty() {
            return None;
        }
        match RelayUrl::new(stored) {
            Ok(url) => Some(self.format_relay_url(url)),
            Err(e) => {
                warn!("stored relay url is invalid: {e}");
                None
            }
        }
    }

    async fn persist_authorization_token(&self, token: &AuthorizationToken) -> SphinxResult<()> {
        self.config.write().await.relay.authorization_token = token.as_str().to_string();
        self.config.save().await?;
        debug!("authorization token persisted");
        Ok(())
    }

    async fn retrieve_authorization_token(&self) -> Option<AuthorizationToken> {
        let stored = self.config.read().await.relay.authorization_token.clone();
        AuthorizationToken::new(stored).ok()
    }
}
