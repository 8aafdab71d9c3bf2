//! # Common Test Utilities
//!
//! `TestApp` spawns a real server on a random port, backed by a temporary
//! database and configuration file, and talks to it over HTTP.

// Not every test file uses every helper.
#![allow(unused)]

use anyhow::Result;
use axum::serve;
use persona_server::{
    config, router,
    state::{build_app_state, AppState},
};
use persona_test_utils::{default_questions, setup_tracing, TEST_PASSWORD};
use reqwest::{Client, Response};
use serde_json::{json, Value};
use std::{fs::File, io::Write, net::SocketAddr, path::PathBuf};
use tempfile::{tempdir, TempDir};
use tokio::{net::TcpListener, task::JoinHandle};

pub const TEST_JWT_SECRET: &str = "test-secret-for-persona";

/// A harness for end-to-end testing of the Axum server.
pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub db_path: PathBuf,
    pub app_state: AppState,
    _data_dir: TempDir,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestApp {
    /// Spawns the application server and returns a `TestApp` instance.
    pub async fn spawn() -> Result<Self> {
        setup_tracing();

        let data_dir = tempdir()?;
        let db_path = data_dir.path().join("persona.db");
        let config_path = data_dir.path().join("config.yml");
        let config_content = format!(
            r#"
port: 0
db_url: "{}"
jwt_secret: "{TEST_JWT_SECRET}"
token_expiry_minutes: 30
"#,
            db_path.display()
        );
        let mut file = File::create(&config_path)?;
        file.write_all(config_content.as_bytes())?;

        let config_path = config_path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("temp path is not valid UTF-8"))?;
        let config = config::get_config(Some(config_path))?;
        let app_state = build_app_state(config).await?;
        let app_state_for_harness = app_state.clone();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let address = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let server_handle = tokio::spawn(async move {
            let app = router::create_router(app_state);
            let server = serve(listener, app).with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });
            if let Err(e) = server.await {
                tracing::error!("[TestApp] Server error: {}", e);
            }
        });

        Ok(Self {
            address,
            client: Client::new(),
            db_path,
            app_state: app_state_for_harness,
            _data_dir: data_dir,
            _server_handle: server_handle,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Registers `username` with a derived email and [`TEST_PASSWORD`].
    pub async fn register(&self, username: &str) -> Result<Response> {
        Ok(self
            .client
            .post(self.url("/register"))
            .json(&json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": TEST_PASSWORD,
            }))
            .send()
            .await?)
    }

    /// Posts the password-grant form to `/token`.
    pub async fn request_token(&self, username: &str, password: &str) -> Result<Response> {
        Ok(self
            .client
            .post(self.url("/token"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?)
    }

    /// Registers `username` and returns a bearer token for them.
    pub async fn register_and_login(&self, username: &str) -> Result<String> {
        let response = self.register(username).await?;
        anyhow::ensure!(
            response.status().is_success(),
            "registration failed: {}",
            response.status()
        );

        let body: Value = self
            .request_token(username, TEST_PASSWORD)
            .await?
            .json()
            .await?;
        body["access_token"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("no access_token in {body}"))
    }

    /// Adds the default question catalog and returns the ids of all questions, in order.
    pub async fn seed_questions(&self) -> Result<Vec<i64>> {
        let questions: Vec<Value> = default_questions()
            .into_iter()
            .map(|(text, category)| json!({ "question_text": text, "category": category }))
            .collect();
        let response = self
            .client
            .post(self.url("/survey/questions/bulk"))
            .json(&json!({ "questions": questions }))
            .send()
            .await?;
        anyhow::ensure!(response.status().is_success(), "seeding questions failed");

        let body: Value = self
            .client
            .get(self.url("/survey/questions"))
            .send()
            .await?
            .json()
            .await?;
        let ids = body["result"]
            .as_array()
            .ok_or_else(|| anyhow::anyhow!("no question list in {body}"))?
            .iter()
            .filter_map(|q| q["id"].as_i64())
            .collect();
        Ok(ids)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
