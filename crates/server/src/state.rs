//! # Application State
//!
//! The shared application state (`AppState`) and the logic for building it at
//! startup. It holds the configuration, the store and the identity services,
//! making them accessible to all request handlers.

use crate::config::AppConfig;
use core_access::{Argon2Hasher, PasswordHasher, TokenIssuer};
use persona::SqliteStore;
use std::{path::Path, sync::Arc};
use tracing::info;
use turso::Database;

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration, loaded from `config.yml`.
    pub config: Arc<AppConfig>,
    /// The relational store holding users, profiles and survey data.
    pub store: Arc<SqliteStore>,
    /// Signs and validates bearer tokens.
    pub token_issuer: Arc<TokenIssuer>,
    /// Hashes and verifies passwords.
    pub hasher: Arc<dyn PasswordHasher>,
}

impl AppState {
    pub fn db(&self) -> &Database {
        &self.store.db
    }
}

/// Builds the shared application state from the configuration.
///
/// Opens the database (creating its parent directory if needed) and makes
/// sure the schema is in place.
pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    if let Some(parent) = Path::new(&config.db_url).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let store = SqliteStore::new(&config.db_url).await?;
    info!(db_path = %config.db_url, "Initialized local storage (SQLite).");
    store.initialize_schema().await?;

    let token_issuer = TokenIssuer::new(config.jwt_secret.clone(), config.token_expiry_minutes);

    Ok(AppState {
        config: Arc::new(config),
        store: Arc::new(store),
        token_issuer: Arc::new(token_issuer),
        hasher: Arc::new(Argon2Hasher::new()),
    })
}
