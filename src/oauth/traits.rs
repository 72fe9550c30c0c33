use async_trait::async_trait;

use crate::error::{ExchangeError, RefreshError};

/// Result of a successful authorization-code exchange.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub refresh_token: String,
    /// Full token endpoint answer, kept alongside the stored token.
    pub raw: serde_json::Value,
}

/// The two grant flows this service needs from the identity provider.
#[async_trait]
pub trait OAuthClient: Send + Sync {
    /// Exchange a single-use authorization code for a refresh token.
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, ExchangeError>;

    /// Mint a short-lived access token from a refresh token.
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<String, RefreshError>;
}
