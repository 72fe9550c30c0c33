use crate::crypto::CipherError;

/// Unified error type for the assistant-bridge service.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ── Request Errors ──────────────────────────────────────────────────
    #[error("{0}")]
    Validation(String),

    #[error("Authorization Code is null, can't request Refresh Token")]
    MissingAuthorizationCode,

    // ── Provider Errors ─────────────────────────────────────────────────
    #[error(transparent)]
    TokenExchange(#[from] ExchangeError),

    #[error(transparent)]
    Refresh(#[from] RefreshError),

    // ── Downstream Errors ───────────────────────────────────────────────
    #[error(transparent)]
    Assistant(#[from] AssistantError),

    // ── Internal ────────────────────────────────────────────────────────
    #[error("Database error: {0}")]
    Database(String),

    #[error(transparent)]
    Crypto(#[from] CipherError),
}

impl AppError {
    /// Whether the error belongs in a response's error list.
    ///
    /// A reused authorization code is an expected outcome of the single-use
    /// grant and is only logged.
    pub fn is_escalated(&self) -> bool {
        !matches!(self, AppError::TokenExchange(ExchangeError::AlreadyGranted))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!("Database error: {e}");
        AppError::Database(e.to_string())
    }
}

/// Failure of an authorization-code exchange.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExchangeError {
    /// The provider answered `invalid_grant`: the code was already exchanged.
    #[error("Refresh Token is already granted")]
    AlreadyGranted,

    #[error("Get Token error: {code}, status: {status}")]
    Provider { code: String, status: u16 },

    #[error("Get Token error: provider response has no refresh_token")]
    MissingRefreshToken,

    #[error("Get Token error: {0}")]
    Transport(String),
}

/// Failure of a refresh-token grant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    #[error("Refresh Token error: {code}, status: {status}")]
    Provider { code: String, status: u16 },

    #[error("Refresh Token error: {0}")]
    Transport(String),
}

/// Failure while querying the assistant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssistantError {
    #[error("Assistant authentication failed: {0}")]
    Auth(#[from] RefreshError),

    #[error("Assistant query failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Assistant query failed: {0}")]
    Transport(String),
}
