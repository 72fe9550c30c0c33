use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use assistant_bridge::assistant::{AssistantApi, HttpAssistantClient};
use assistant_bridge::crypto::TokenCipher;
use assistant_bridge::oauth::{GoogleOAuthClient, OAuthClient};
use assistant_bridge::store::{InMemoryTokenStore, PgTokenStore, TokenRepository};
use assistant_bridge::{api, AppState, Config, SharedState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "assistant_bridge=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    info!("assistant-bridge v{}", env!("CARGO_PKG_VERSION"));
    info!("Listening on {}:{}", config.host, config.port);

    let store: Arc<dyn TokenRepository> = match (&config.database_url, &config.token_encryption_key) {
        (Some(url), Some(key)) => {
            let store = PgTokenStore::new(url, TokenCipher::new(key)?).await?;
            store.migrate().await?;
            info!("Database connected and migrated ✓");
            Arc::new(store)
        }
        _ => {
            warn!("DATABASE_URL not set, refresh tokens are kept in memory only");
            Arc::new(InMemoryTokenStore::new())
        }
    };

    let oauth: Arc<dyn OAuthClient> = Arc::new(GoogleOAuthClient::new(&config.google));
    let assistant: Arc<dyn AssistantApi> = Arc::new(HttpAssistantClient::new(
        config.assistant_endpoint.clone(),
        oauth.clone(),
    ));

    let state: SharedState = Arc::new(AppState {
        config: config.clone(),
        store,
        oauth,
        assistant,
    });

    let app = api::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server ready ✓");
    axum::serve(listener, app).await?;

    Ok(())
}
