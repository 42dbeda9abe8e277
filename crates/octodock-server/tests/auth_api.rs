#![allow(clippy::unwrap_used)]

//! `/api/auth/*` integration tests.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::json;

use common::{TestApp, test_app};

async fn register(app: &TestApp, email: &str) -> serde_json::Value {
    let resp = app
        .json(
            Method::POST,
            "/api/auth/register",
            &json!({ "name": "Alice", "email": email, "password": "Password123" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.text());
    resp.json()
}

fn me_request(token: Option<&str>) -> Request<Body> {
    let mut builder = Request::get("/api/auth/me");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn register_returns_token_and_public_user() {
    let app = test_app().await;
    let body = register(&app, "alice@example.com").await;

    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["name"], "Alice");
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert!(body["user"]["id"].is_string());
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
async fn register_requires_all_fields() {
    let app = test_app().await;
    for payload in [
        json!({ "email": "a@example.com", "password": "pw" }),
        json!({ "name": "A", "password": "pw" }),
        json!({ "name": "A", "email": "a@example.com", "password": "" }),
        json!({}),
    ] {
        let resp = app.json(Method::POST, "/api/auth/register", &payload).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert_eq!(resp.json()["error"]["message"], "All fields are required");
    }
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = test_app().await;
    register(&app, "dup@example.com").await;

    let resp = app
        .json(
            Method::POST,
            "/api/auth/register",
            &json!({ "name": "Other", "email": "dup@example.com", "password": "x" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.json()["error"]["message"], "User already exists");
}

#[tokio::test]
async fn login_with_correct_password() {
    let app = test_app().await;
    let registered = register(&app, "bob@example.com").await;

    let resp = app
        .json(
            Method::POST,
            "/api/auth/login",
            &json!({ "email": "bob@example.com", "password": "Password123" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["user"]["id"], registered["user"]["id"]);
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = test_app().await;
    register(&app, "carol@example.com").await;

    for payload in [
        json!({ "email": "carol@example.com", "password": "wrong" }),
        json!({ "email": "nobody@example.com", "password": "Password123" }),
    ] {
        let resp = app.json(Method::POST, "/api/auth/login", &payload).await;
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
        assert_eq!(resp.json()["error"]["message"], "Invalid credentials");
    }
}

#[tokio::test]
async fn login_requires_fields() {
    let app = test_app().await;
    let resp = app
        .json(Method::POST, "/api/auth/login", &json!({ "email": "x@example.com" }))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = test_app().await;
    let request = Request::post("/api/auth/login")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.send(request).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.json()["error"]["message"].is_string());
}

#[tokio::test]
async fn me_requires_valid_token() {
    let app = test_app().await;
    let body = register(&app, "dave@example.com").await;
    let token = body["token"].as_str().unwrap();

    let ok = app.send(me_request(Some(token))).await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.json()["email"], "dave@example.com");

    assert_eq!(app.send(me_request(None)).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        app.send(me_request(Some("garbage"))).await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn logout_is_stateless() {
    let app = test_app().await;
    let resp = app.json(Method::POST, "/api/auth/logout", &json!({})).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["message"], "Logged out successfully");
}
