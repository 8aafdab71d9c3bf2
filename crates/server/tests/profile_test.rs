//! # Profile Endpoint Tests

mod common;

use anyhow::Result;
use common::TestApp;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn test_create_and_fetch_profile() -> Result<()> {
    // --- 1. Arrange ---
    let app = TestApp::spawn().await?;
    let token = app.register_and_login("alice").await?;

    // --- 2. Act ---
    let response = app
        .client
        .post(app.url("/users/profile"))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Alice",
            "hobbies": "Climbing",
            "assistant_personality": "Dry wit"
        }))
        .send()
        .await?;

    // --- 3. Assert ---
    assert_eq!(response.status(), StatusCode::OK);
    let created: Value = response.json().await?;
    let profile = &created["result"];
    assert_eq!(profile["name"], "Alice");
    assert_eq!(profile["hobbies"], "Climbing");
    assert_eq!(profile["assistant_personality"], "Dry wit");
    assert_eq!(profile["wants_deep_conversations"], true);
    assert!(profile["description"].is_null());

    let fetched: Value = app
        .client
        .get(app.url("/users/profile"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(fetched["result"], created["result"]);
    Ok(())
}

#[tokio::test]
async fn test_create_profile_twice_is_rejected() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.register_and_login("alice").await?;

    for expected in [StatusCode::OK, StatusCode::BAD_REQUEST] {
        let response = app
            .client
            .post(app.url("/users/profile"))
            .bearer_auth(&token)
            .json(&json!({ "name": "Alice" }))
            .send()
            .await?;
        assert_eq!(response.status(), expected);
        if expected == StatusCode::BAD_REQUEST {
            let body: Value = response.json().await?;
            assert_eq!(body["error"], "Profile already exists.");
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_missing_profile_is_not_found() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.register_and_login("alice").await?;

    let response = app
        .client
        .get(app.url("/users/profile"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "Profile not found.");
    Ok(())
}

#[tokio::test]
async fn test_profiles_are_per_user() -> Result<()> {
    let app = TestApp::spawn().await?;
    let alice = app.register_and_login("alice").await?;
    let bob = app.register_and_login("bob").await?;

    app.client
        .post(app.url("/users/profile"))
        .bearer_auth(&alice)
        .json(&json!({ "name": "Alice", "wants_deep_conversations": false }))
        .send()
        .await?;

    let bob_profile = app
        .client
        .get(app.url("/users/profile"))
        .bearer_auth(&bob)
        .send()
        .await?;
    assert_eq!(bob_profile.status(), StatusCode::NOT_FOUND);

    let alice_profile: Value = app
        .client
        .get(app.url("/users/profile"))
        .bearer_auth(&alice)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(alice_profile["result"]["wants_deep_conversations"], false);
    Ok(())
}
