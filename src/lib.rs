pub mod api;
pub mod assistant;
pub mod config;
pub mod crypto;
pub mod error;
pub mod oauth;
pub mod store;

pub use config::Config;
pub use error::AppError;

use std::sync::Arc;

/// Shared application state passed to all API handlers.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn store::TokenRepository>,
    pub oauth: Arc<dyn oauth::OAuthClient>,
    pub assistant: Arc<dyn assistant::AssistantApi>,
}

pub type SharedState = Arc<AppState>;
