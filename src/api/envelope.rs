use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, info};

use crate::error::AppError;

/// Uniform body of every endpoint's answer.
///
/// Each request builds its own envelope. The first recorded error is kept as
/// the primary error but not serialized.
#[derive(Debug, Default, Serialize)]
pub struct ResponseEnvelope {
    pub response: String,
    /// Reserved for spoken replies; always empty.
    pub audio: String,
    pub errors: Vec<String>,
    pub success: bool,
    #[serde(skip)]
    primary_error: Option<String>,
}

impl ResponseEnvelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeed(mut self, response: impl Into<String>) -> Self {
        self.response = response.into();
        self.success = true;
        self
    }

    /// Append an error message and log it.
    pub fn record_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!("{message}");
        if self.primary_error.is_none() {
            self.primary_error = Some(message.clone());
        }
        self.errors.push(message);
    }

    /// Mark the envelope failed with `response` as the summary.
    ///
    /// Non-escalated errors are logged without entering the error list.
    pub fn fail(mut self, err: &AppError, response: impl Into<String>) -> Self {
        if err.is_escalated() {
            self.record_error(err.to_string());
        } else {
            info!("{err}");
        }
        self.response = response.into();
        self.success = false;
        self
    }

    pub fn primary_error(&self) -> Option<&str> {
        self.primary_error.as_deref()
    }

    pub fn status(&self) -> StatusCode {
        if self.success {
            StatusCode::OK
        } else {
            StatusCode::BAD_REQUEST
        }
    }
}

impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}
