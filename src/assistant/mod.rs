//! Conversational assistant collaborator.
//!
//! A session is built from a user's refresh token for every query; the
//! query itself goes through [`AssistantApi`].

mod client;
mod session;

pub use client::HttpAssistantClient;
pub use session::{AssistantSession, SessionOptions};

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AssistantError;

/// What the assistant answered to a text query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistantReply {
    pub text: Option<String>,
}

#[async_trait]
pub trait AssistantApi: Send + Sync {
    /// Send a text command on behalf of the session's user.
    async fn query(
        &self,
        session: &AssistantSession,
        text: &str,
    ) -> Result<AssistantReply, AssistantError>;
}
