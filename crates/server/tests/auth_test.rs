//! # Authentication Endpoint Tests
//!
//! Registration, token issuance, the `/user` resource and bearer-token rejection.

mod common;

use anyhow::Result;
use common::{TestApp, TEST_JWT_SECRET};
use core_access::TokenIssuer;
use persona_server::errors::USER_DELETED;
use persona_test_utils::TEST_PASSWORD;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn test_root_and_health() -> Result<()> {
    let app = TestApp::spawn().await?;

    let root = app.client.get(app.url("/")).send().await?;
    assert_eq!(root.status(), StatusCode::OK);
    assert_eq!(root.text().await?, "persona server is running.");

    let health = app.client.get(app.url("/health")).send().await?;
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(health.text().await?, "OK");
    Ok(())
}

#[tokio::test]
async fn test_register_returns_public_user() -> Result<()> {
    // --- 1. Arrange & Act ---
    let app = TestApp::spawn().await?;
    let response = app.register("alice").await?;

    // --- 2. Assert ---
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    let user = &body["result"];
    assert!(user["id"].as_i64().is_some());
    assert_eq!(user["username"], "alice");
    assert_eq!(user["email"], "alice@example.com");
    assert!(user.get("password").is_none());
    assert!(user.get("hashed_password").is_none());
    assert!(body.get("debug").is_none());
    Ok(())
}

#[tokio::test]
async fn test_register_duplicate_username_and_email() -> Result<()> {
    let app = TestApp::spawn().await?;
    assert!(app.register("alice").await?.status().is_success());

    // Same username again.
    let response = app.register("alice").await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "Username already exists.");

    // New username, taken email.
    let response = app
        .client
        .post(app.url("/register"))
        .json(&json!({
            "username": "alice2",
            "email": "alice@example.com",
            "password": TEST_PASSWORD,
        }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "Email already registered.");
    Ok(())
}

#[tokio::test]
async fn test_token_issues_bearer_for_username() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.register("alice").await?;

    let response = app.request_token("alice", TEST_PASSWORD).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["token_type"], "bearer");
    assert!(body.get("result").is_none(), "token body is not wrapped");

    let token = body["access_token"].as_str().unwrap_or_default();
    let claims = app.app_state.token_issuer.validate(token)?;
    assert_eq!(claims.sub, "alice");
    assert!(claims.exp > claims.iat);
    Ok(())
}

#[tokio::test]
async fn test_token_rejects_bad_credentials() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.register("alice").await?;

    for (username, password) in [("alice", "wrong-password"), ("nobody", TEST_PASSWORD)] {
        let response = app.request_token(username, password).await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: Value = response.json().await?;
        assert_eq!(body["error"], "Invalid credentials.");
    }
    Ok(())
}

#[tokio::test]
async fn test_get_user_with_token() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.register_and_login("alice").await?;

    let response = app
        .client
        .get(app.url("/user?debug=true"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["result"]["username"], "alice");
    assert_eq!(body["result"]["email"], "alice@example.com");
    assert!(body["debug"]["expires_at"].as_u64().is_some());
    Ok(())
}

#[tokio::test]
async fn test_bearer_routes_reject_bad_tokens() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.register("alice").await?;

    // No header at all.
    let response = app.client.get(app.url("/user")).send().await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Garbage, wrong secret and expired tokens.
    let forged = TokenIssuer::new("some-other-secret", 30).issue("alice")?;
    let expired = TokenIssuer::new(TEST_JWT_SECRET, -5).issue("alice")?;
    for token in [
        "not-a-jwt".to_string(),
        forged.access_token,
        expired.access_token,
    ] {
        for path in ["/user", "/users/profile", "/survey/responses"] {
            let response = app
                .client
                .get(app.url(path))
                .bearer_auth(&token)
                .send()
                .await?;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{path}");
            let body: Value = response.json().await?;
            assert_eq!(body["error"], "Invalid or expired token.");
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_delete_user_invalidates_account() -> Result<()> {
    // --- 1. Arrange ---
    let app = TestApp::spawn().await?;
    let token = app.register_and_login("alice").await?;
    let ids = app.seed_questions().await?;
    let submit = app
        .client
        .post(app.url("/survey/responses"))
        .bearer_auth(&token)
        .json(&json!([{ "question_id": ids[0], "response_text": "Alice" }]))
        .send()
        .await?;
    assert_eq!(submit.status(), StatusCode::OK);

    // --- 2. Act ---
    let response = app
        .client
        .delete(app.url("/user"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["result"]["message"], USER_DELETED);

    // --- 3. Assert ---
    // `/user` treats a vanished subject as an authentication failure...
    let me = app
        .client
        .get(app.url("/user"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(me.status(), StatusCode::UNAUTHORIZED);

    // ...while other bearer routes report the missing user.
    let profile = app
        .client
        .get(app.url("/users/profile"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(profile.status(), StatusCode::NOT_FOUND);
    let body: Value = profile.json().await?;
    assert_eq!(body["error"], "User not found.");

    let login = app.request_token("alice", TEST_PASSWORD).await?;
    assert_eq!(login.status(), StatusCode::UNAUTHORIZED);

    // The username is free again.
    assert!(app.register("alice").await?.status().is_success());
    Ok(())
}
