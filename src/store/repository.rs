use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppError;

/// A user's refresh token as persisted by the store.
#[derive(Debug, Clone)]
pub struct TokenRecord {
    pub external_user_id: String,
    pub refresh_token: String,
    /// Token endpoint answer the refresh token came from.
    pub raw_provider_response: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl TokenRecord {
    pub fn new(
        external_user_id: impl Into<String>,
        refresh_token: impl Into<String>,
        raw_provider_response: serde_json::Value,
    ) -> Self {
        Self {
            external_user_id: external_user_id.into(),
            refresh_token: refresh_token.into(),
            raw_provider_response,
            created_at: Utc::now(),
        }
    }
}

/// Persistence for refresh tokens, keyed by external user id.
///
/// At most one record exists per user; `save` replaces any previous one.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn save(&self, record: &TokenRecord) -> Result<(), AppError>;

    async fn find(&self, external_user_id: &str) -> Result<Option<TokenRecord>, AppError>;
}
