//! Web API Authentication Tests
//!
//! Integration tests for registration, login and token handling.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{bearer, create_test_server, register_user, PASSWORD};

#[tokio::test]
async fn test_health_check() {
    let (server, _db) = create_test_server().await;

    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_text("OK");
}

#[tokio::test]
async fn test_register_success() {
    let (server, _db) = create_test_server().await;

    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "email": "alice@example.com",
            "password": PASSWORD,
            "name": "Alice"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);

    let body: Value = response.json();
    assert!(body["access_token"].is_string());
    assert_eq!(body["expires_in"], 900);
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["user"]["name"], "Alice");
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let (server, _db) = create_test_server().await;
    register_user(&server, "alice@example.com").await;

    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "email": "alice@example.com",
            "password": "password456"
        }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "UNPROCESSABLE_ENTITY");
}

#[tokio::test]
async fn test_register_short_password() {
    let (server, _db) = create_test_server().await;

    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "email": "alice@example.com",
            "password": "short"
        }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = response.json();
    assert!(body["error"]["details"]["password"].is_array());
}

#[tokio::test]
async fn test_register_malformed_json() {
    let (server, _db) = create_test_server().await;

    let response = server
        .post("/api/auth/register")
        .json(&json!({ "email": "alice@example.com" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_success() {
    let (server, _db) = create_test_server().await;
    register_user(&server, "alice@example.com").await;

    let response = server
        .post("/api/auth/login")
        .json(&json!({
            "email": "alice@example.com",
            "password": PASSWORD
        }))
        .await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert!(body["access_token"].is_string());
    assert_eq!(body["user"]["email"], "alice@example.com");
}

#[tokio::test]
async fn test_login_wrong_password() {
    let (server, _db) = create_test_server().await;
    register_user(&server, "alice@example.com").await;

    let response = server
        .post("/api/auth/login")
        .json(&json!({
            "email": "alice@example.com",
            "password": "wrongpassword"
        }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);

    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_login_unknown_email() {
    let (server, _db) = create_test_server().await;

    let response = server
        .post("/api/auth/login")
        .json(&json!({
            "email": "nobody@example.com",
            "password": PASSWORD
        }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me() {
    let (server, _db) = create_test_server().await;
    let (token, user_id) = register_user(&server, "alice@example.com").await;

    let response = server
        .get("/api/auth/me")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["id"], user_id);
    assert_eq!(body["email"], "alice@example.com");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let (server, _db) = create_test_server().await;

    for path in [
        "/api/auth/me",
        "/api/feeds",
        "/api/folders",
        "/api/subscribe_job_states",
        "/api/opml_export",
    ] {
        let response = server.get(path).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_invalid_token() {
    let (server, _db) = create_test_server().await;

    let response = server
        .get("/api/auth/me")
        .add_header(AUTHORIZATION, "Bearer not-a-token".to_string())
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}
