//! HTTP surface of the service.
//!
//! - POST /refreshMyAccessToken: refresh token → access token
//! - POST /requestMyRefresToken: authorization code → refresh token
//! - POST /queryAssistant      : text command to the user's assistant
//! - GET  /status              : health check

pub mod envelope;
pub mod routes;

pub use envelope::ResponseEnvelope;

use crate::SharedState;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::endpoints(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
