use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use super::{AssistantApi, AssistantReply, AssistantSession};
use crate::error::AssistantError;
use crate::oauth::OAuthClient;

/// Assistant reached over HTTP with a bearer access token.
///
/// The access token is minted from the session's refresh token on every
/// query.
pub struct HttpAssistantClient {
    endpoint: String,
    oauth: Arc<dyn OAuthClient>,
    http: reqwest::Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    text: &'a str,
    locale: &'a str,
    device_id: &'a str,
    device_model_id: &'a str,
}

impl HttpAssistantClient {
    pub fn new(endpoint: impl Into<String>, oauth: Arc<dyn OAuthClient>) -> Self {
        Self {
            endpoint: endpoint.into(),
            oauth,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AssistantApi for HttpAssistantClient {
    async fn query(
        &self,
        session: &AssistantSession,
        text: &str,
    ) -> Result<AssistantReply, AssistantError> {
        let access_token = self
            .oauth
            .refresh_access_token(session.refresh_token())
            .await?;

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&access_token)
            .json(&QueryRequest {
                text,
                locale: &session.options.locale,
                device_id: &session.options.device_id,
                device_model_id: &session.options.device_model_id,
            })
            .send()
            .await
            .map_err(|e| AssistantError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AssistantError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: AssistantReply = resp
            .json()
            .await
            .map_err(|e| AssistantError::Transport(format!("invalid assistant response: {e}")))?;

        info!("Assistant replied ({} chars)", reply.text.as_deref().map_or(0, str::len));
        Ok(reply)
    }
}
