use crate::config::Config;

/// Locale and device identity reported to the assistant.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub locale: String,
    pub device_id: String,
    pub device_model_id: String,
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            locale: config.assistant_locale.clone(),
            device_id: config.assistant_device_id.clone(),
            device_model_id: config.assistant_device_model_id.clone(),
        }
    }
}

/// A user's assistant session, rebuilt for each query.
///
/// Only the user's refresh token is carried; the OAuth client identity used
/// to turn it into an access token lives in the [`OAuthClient`] the
/// assistant client was built with.
///
/// [`OAuthClient`]: crate::oauth::OAuthClient
#[derive(Debug, Clone)]
pub struct AssistantSession {
    refresh_token: String,
    pub options: SessionOptions,
}

impl AssistantSession {
    pub fn new(refresh_token: impl Into<String>, options: SessionOptions) -> Self {
        Self {
            refresh_token: refresh_token.into(),
            options,
        }
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }
}
