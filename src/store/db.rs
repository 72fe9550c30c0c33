//! PostgreSQL-backed token store.
//!
//! Table `assistant_tokens` holds one encrypted refresh token per external
//! user id, together with the raw token endpoint response it came from.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::info;

use super::repository::{TokenRecord, TokenRepository};
use crate::crypto::TokenCipher;
use crate::error::AppError;

/// Token store backed by PostgreSQL.
pub struct PgTokenStore {
    pool: PgPool,
    cipher: TokenCipher,
}

impl PgTokenStore {
    pub async fn new(db_url: &str, cipher: TokenCipher) -> Result<Self, AppError> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(db_url)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to PostgreSQL: {e}")))?;

        Ok(Self { pool, cipher })
    }

    /// Run schema migrations.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS assistant_tokens (
                external_user_id TEXT PRIMARY KEY,
                refresh_token    TEXT NOT NULL,
                raw_response     JSONB NOT NULL DEFAULT '{}',
                created_at       TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at       TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl TokenRepository for PgTokenStore {
    async fn save(&self, record: &TokenRecord) -> Result<(), AppError> {
        let sealed = self
            .cipher
            .seal(&record.external_user_id, &record.refresh_token)?;

        sqlx::query(
            r#"
            INSERT INTO assistant_tokens (external_user_id, refresh_token, raw_response, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (external_user_id)
            DO UPDATE SET
                refresh_token = EXCLUDED.refresh_token,
                raw_response = EXCLUDED.raw_response,
                updated_at = NOW()
            "#,
        )
        .bind(&record.external_user_id)
        .bind(&sealed)
        .bind(&record.raw_provider_response)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        info!("Stored refresh token for user {}", record.external_user_id);
        Ok(())
    }

    async fn find(&self, external_user_id: &str) -> Result<Option<TokenRecord>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT refresh_token, raw_response, created_at
            FROM assistant_tokens
            WHERE external_user_id = $1
            "#,
        )
        .bind(external_user_id)
        .fetch_optional(&self.pool)
        .await?;

        let row = match row {
            Some(r) => r,
            None => return Ok(None),
        };

        let sealed: String = row.get(0);
        let raw_provider_response: serde_json::Value = row.get(1);
        let created_at: DateTime<Utc> = row.get(2);

        Ok(Some(TokenRecord {
            external_user_id: external_user_id.to_string(),
            refresh_token: self.cipher.open(external_user_id, &sealed)?,
            raw_provider_response,
            created_at,
        }))
    }
}
