//! In-memory token store, used when no database is configured.

use async_trait::async_trait;
use dashmap::DashMap;

use super::repository::{TokenRecord, TokenRepository};
use crate::error::AppError;

/// Token store backed by a concurrent map. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryTokenStore {
    records: DashMap<String, TokenRecord>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenStore {
    async fn save(&self, record: &TokenRecord) -> Result<(), AppError> {
        self.records
            .insert(record.external_user_id.clone(), record.clone());
        Ok(())
    }

    async fn find(&self, external_user_id: &str) -> Result<Option<TokenRecord>, AppError> {
        Ok(self
            .records
            .get(external_user_id)
            .map(|entry| entry.value().clone()))
    }
}
