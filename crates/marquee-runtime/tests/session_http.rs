//! Runtime session handling against a mock backend

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use marquee_api::StreamingClient;
use marquee_core::config::AppConfig;
use marquee_core::storage::SESSION_SERVICE;
use marquee_runtime::{DbHandle, Runtime, RuntimeError};

fn fresh_token() -> String {
    let now = Utc::now().timestamp();
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS512","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD
        .encode(json!({ "sub": "mira", "iat": now - 60, "exp": now + 3600 }).to_string());
    format!("{header}.{payload}.sig")
}

async fn runtime_for(server: &MockServer) -> (Runtime, DbHandle) {
    let db = DbHandle::open_memory().unwrap();
    db.save_token(SESSION_SERVICE, fresh_token()).await.unwrap();
    let api = StreamingClient::new(server.uri(), Duration::from_secs(5)).unwrap();
    let rt = Runtime::with_service(api, db.clone(), AppConfig::default())
        .await
        .unwrap();
    (rt, db)
}

async fn logout_with_dead_token(status: u16) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({
            "code": 1003,
            "message": "Unauthenticated"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (rt, db) = runtime_for(&server).await;
    rt.logout().await.unwrap();

    let session = rt.session().await;
    assert!(session.token.is_none());
    assert!(!session.authenticated);
    assert_eq!(db.get_token(SESSION_SERVICE).await.unwrap(), None);
}

#[tokio::test]
async fn test_logout_dead_token_bad_request() {
    logout_with_dead_token(400).await;
}

#[tokio::test]
async fn test_logout_dead_token_unauthorized() {
    logout_with_dead_token(401).await;
}

#[tokio::test]
async fn test_logout_server_error_keeps_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "code": 9999,
            "message": "Uncategorized error"
        })))
        .mount(&server)
        .await;

    let (rt, db) = runtime_for(&server).await;
    assert!(matches!(rt.logout().await, Err(RuntimeError::Api(_))));
    assert!(rt.session().await.token.is_some());
    assert!(db.get_token(SESSION_SERVICE).await.unwrap().is_some());
}

#[tokio::test]
async fn test_missing_media_reported_in_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/media/77"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 9999,
            "message": "Media not found"
        })))
        .mount(&server)
        .await;

    let (rt, _db) = runtime_for(&server).await;
    assert!(matches!(rt.media(77).await, Err(RuntimeError::NotFound(_))));
}
