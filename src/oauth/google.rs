use async_trait::async_trait;
use serde::Deserialize;
use tracing::{error, info};

use super::traits::{OAuthClient, TokenGrant};
use crate::config::GoogleClientConfig;
use crate::error::{ExchangeError, RefreshError};

/// Google OAuth 2.0 client.
///
/// Refresh tokens are only returned for offline-access consents and do not
/// expire; access tokens live for one hour.
pub struct GoogleOAuthClient {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    token_url: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
    refresh_token: Option<String>,
}

// Error body of Google's token endpoint
#[derive(Debug, Deserialize)]
struct GoogleErrorResponse {
    error: String,
}

impl GoogleOAuthClient {
    pub fn new(config: &GoogleClientConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            token_url: config.token_url.clone(),
            http: reqwest::Client::new(),
        }
    }
}

/// Pull the OAuth `error` code out of a failed token response body.
fn error_code(body: &str) -> String {
    serde_json::from_str::<GoogleErrorResponse>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| "unknown_error".into())
}

#[async_trait]
impl OAuthClient for GoogleOAuthClient {
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, ExchangeError> {
        let resp = self
            .http
            .post(&self.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(format!("token exchange request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let code = error_code(&body);
            if code == "invalid_grant" {
                return Err(ExchangeError::AlreadyGranted);
            }
            return Err(ExchangeError::Provider {
                code,
                status: status.as_u16(),
            });
        }

        let raw: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ExchangeError::Transport(format!("failed to parse token response: {e}")))?;

        let refresh_token = raw
            .get("refresh_token")
            .and_then(|v| v.as_str())
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| {
                error!("Token exchange succeeded without a refresh token");
                ExchangeError::MissingRefreshToken
            })?;

        info!("Get Token success");
        Ok(TokenGrant { refresh_token, raw })
    }

    async fn refresh_access_token(&self, refresh_token: &str) -> Result<String, RefreshError> {
        let resp = self
            .http
            .post(&self.token_url)
            .form(&[
                ("refresh_token", refresh_token),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| RefreshError::Transport(format!("refresh request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RefreshError::Provider {
                code: error_code(&body),
                status: status.as_u16(),
            });
        }

        let token_resp: GoogleTokenResponse = resp
            .json()
            .await
            .map_err(|e| RefreshError::Transport(format!("failed to parse refresh response: {e}")))?;

        // Google may rotate the refresh token here; the stored one stays valid.
        if token_resp.refresh_token.is_some() {
            info!("Provider returned a rotated refresh token, keeping the stored one");
        }

        info!("New access token issued");
        Ok(token_resp.access_token)
    }
}
