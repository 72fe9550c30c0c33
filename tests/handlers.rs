use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use assistant_bridge::assistant::{AssistantApi, AssistantReply, AssistantSession};
use assistant_bridge::config::GoogleClientConfig;
use assistant_bridge::error::{AssistantError, ExchangeError, RefreshError};
use assistant_bridge::oauth::{OAuthClient, TokenGrant};
use assistant_bridge::store::{InMemoryTokenStore, TokenRecord, TokenRepository};
use assistant_bridge::{api, AppState, Config};

/// Provider that accepts each code once, like Google does.
#[derive(Default)]
struct FakeProvider {
    used_codes: Mutex<HashSet<String>>,
    exchanges: AtomicUsize,
}

#[async_trait]
impl OAuthClient for FakeProvider {
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, ExchangeError> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        if code == "bad-client" {
            return Err(ExchangeError::Provider {
                code: "invalid_client".into(),
                status: 401,
            });
        }
        if !self.used_codes.lock().unwrap().insert(code.to_string()) {
            return Err(ExchangeError::AlreadyGranted);
        }
        let refresh_token = format!("refresh-{code}");
        Ok(TokenGrant {
            raw: json!({ "refresh_token": refresh_token, "access_token": "ya29.a" }),
            refresh_token,
        })
    }

    async fn refresh_access_token(&self, refresh_token: &str) -> Result<String, RefreshError> {
        if refresh_token.starts_with("refresh-") {
            Ok(format!("access-for-{refresh_token}"))
        } else {
            Err(RefreshError::Provider {
                code: "invalid_grant".into(),
                status: 400,
            })
        }
    }
}

/// Assistant that echoes the command and remembers the sessions it saw.
#[derive(Default)]
struct FakeAssistant {
    seen_tokens: Mutex<Vec<String>>,
    fail: bool,
}

#[async_trait]
impl AssistantApi for FakeAssistant {
    async fn query(
        &self,
        session: &AssistantSession,
        text: &str,
    ) -> Result<AssistantReply, AssistantError> {
        self.seen_tokens
            .lock()
            .unwrap()
            .push(session.refresh_token().to_string());
        if self.fail {
            return Err(AssistantError::Transport("connection refused".into()));
        }
        Ok(AssistantReply {
            text: Some(format!("ok: {text}")),
        })
    }
}

struct Harness {
    app: Router,
    store: Arc<InMemoryTokenStore>,
    provider: Arc<FakeProvider>,
    assistant: Arc<FakeAssistant>,
}

fn test_config() -> Config {
    Config {
        host: "127.0.0.1".into(),
        port: 0,
        database_url: None,
        token_encryption_key: None,
        google: GoogleClientConfig {
            client_id: "client-id".into(),
            client_secret: "client-secret".into(),
            redirect_uri: "https://app.example/callback".into(),
            token_url: "http://127.0.0.1:1/token".into(),
        },
        assistant_endpoint: "http://127.0.0.1:1/query".into(),
        assistant_locale: "es-ES".into(),
        assistant_device_id: "dev".into(),
        assistant_device_model_id: "model".into(),
    }
}

fn harness_with(assistant: FakeAssistant) -> Harness {
    let store = Arc::new(InMemoryTokenStore::new());
    let provider = Arc::new(FakeProvider::default());
    let assistant = Arc::new(assistant);

    let state = Arc::new(AppState {
        config: test_config(),
        store: store.clone(),
        oauth: provider.clone(),
        assistant: assistant.clone(),
    });

    Harness {
        app: api::router(state),
        store,
        provider,
        assistant,
    }
}

fn harness() -> Harness {
    harness_with(FakeAssistant::default())
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    post_raw(app, uri, body.to_string()).await
}

async fn post_raw(app: &Router, uri: &str, body: String) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// =============================================================================
// /refreshMyAccessToken
// =============================================================================

#[tokio::test]
async fn refresh_access_token_success() {
    let h = harness();

    let (status, body) = post(
        &h.app,
        "/refreshMyAccessToken",
        json!({ "refreshToken": "refresh-AC1" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "response": "access-for-refresh-AC1",
            "audio": "",
            "errors": [],
            "success": true,
        })
    );
}

#[tokio::test]
async fn refresh_access_token_rejected_by_provider() {
    let h = harness();

    let (status, body) = post(
        &h.app,
        "/refreshMyAccessToken",
        json!({ "refreshToken": "revoked" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(
        body["errors"],
        json!(["Refresh Token error: invalid_grant, status: 400"])
    );
}

#[tokio::test]
async fn refresh_access_token_requires_field() {
    let h = harness();

    let (status, body) = post(&h.app, "/refreshMyAccessToken", json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["errors"].as_array().unwrap().len(), 1);
}

// =============================================================================
// /requestMyRefresToken
// =============================================================================

#[tokio::test]
async fn request_refresh_token_returns_new_token_without_storing() {
    let h = harness();

    let (status, body) = post(
        &h.app,
        "/requestMyRefresToken",
        json!({ "userAuthCode": "AC123" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["response"], "refresh-AC123");
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn request_refresh_token_twice_is_already_granted() {
    let h = harness();
    let payload = json!({ "userAuthCode": "AC123" });

    let (first, _) = post(&h.app, "/requestMyRefresToken", payload.clone()).await;
    let (second, body) = post(&h.app, "/requestMyRefresToken", payload).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["response"], "Error getting Refresh Token");
    assert_eq!(body["errors"], json!([]));
    assert_eq!(h.provider.exchanges.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn request_refresh_token_other_provider_error_is_listed() {
    let h = harness();

    let (status, body) = post(
        &h.app,
        "/requestMyRefresToken",
        json!({ "userAuthCode": "bad-client" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["errors"],
        json!(["Get Token error: invalid_client, status: 401"])
    );
}

// =============================================================================
// /queryAssistant
// =============================================================================

#[tokio::test]
async fn query_assistant_first_use_exchanges_and_stores() {
    let h = harness();

    let (status, body) = post(
        &h.app,
        "/queryAssistant",
        json!({ "idFB": "u1", "userAuthCode": "AC123", "speakedText": "turn on the light" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["response"], "ok: turn on the light");

    let stored = h.store.find("u1").await.unwrap().unwrap();
    assert_eq!(stored.refresh_token, "refresh-AC123");
    assert_eq!(
        *h.assistant.seen_tokens.lock().unwrap(),
        vec!["refresh-AC123".to_string()]
    );
}

#[tokio::test]
async fn query_assistant_reuses_stored_token() {
    let h = harness();
    h.store
        .save(&TokenRecord::new("u1", "refresh-stored", json!({})))
        .await
        .unwrap();

    let (status, body) = post(
        &h.app,
        "/queryAssistant",
        json!({ "idFB": "u1", "speakedText": "what time is it" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "ok: what time is it");
    assert_eq!(h.provider.exchanges.load(Ordering::SeqCst), 0);
    assert_eq!(
        *h.assistant.seen_tokens.lock().unwrap(),
        vec!["refresh-stored".to_string()]
    );
}

#[tokio::test]
async fn query_assistant_without_token_or_code_fails() {
    let h = harness();

    let (status, body) = post(
        &h.app,
        "/queryAssistant",
        json!({ "idFB": "u1", "userAuthCode": null, "speakedText": "hello" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["response"], "Error sending command");
    assert_eq!(
        body["errors"],
        json!(["Authorization Code is null, can't request Refresh Token"])
    );
}

#[tokio::test]
async fn query_assistant_empty_text_is_rejected() {
    let h = harness();

    for payload in [
        json!({ "idFB": "u1", "userAuthCode": "AC123", "speakedText": "" }),
        json!({ "idFB": "u1", "userAuthCode": "AC123" }),
        json!({ "idFB": "u1", "speakedText": null }),
    ] {
        let (status, body) = post(&h.app, "/queryAssistant", payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"], json!(["The command can't be null or empty"]));
    }
    assert_eq!(h.provider.exchanges.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn query_assistant_empty_id_is_rejected() {
    let h = harness();

    for payload in [
        json!({ "idFB": "", "userAuthCode": "AC123", "speakedText": "hello" }),
        json!({ "speakedText": "hello" }),
    ] {
        let (status, body) = post(&h.app, "/queryAssistant", payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"], json!(["idFB is null or empty, check params"]));
    }
}

#[tokio::test]
async fn query_assistant_downstream_failure() {
    let h = harness_with(FakeAssistant {
        fail: true,
        ..Default::default()
    });

    let (status, body) = post(
        &h.app,
        "/queryAssistant",
        json!({ "idFB": "u1", "userAuthCode": "AC123", "speakedText": "hello" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["response"], "Error sending command");
    assert_eq!(
        body["errors"],
        json!(["Assistant query failed: connection refused"])
    );
    // The token was stored before the query failed
    assert!(h.store.find("u1").await.unwrap().is_some());
}

#[tokio::test]
async fn malformed_body_gets_envelope() {
    let h = harness();

    let (status, body) = post_raw(&h.app, "/queryAssistant", "{not json".into()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["audio"], "");
    assert_eq!(body["errors"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn status_reports_ok() {
    let h = harness();

    let request = Request::builder()
        .uri("/status")
        .body(Body::empty())
        .unwrap();
    let response = h.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
