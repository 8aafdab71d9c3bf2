//! # Application Configuration
//!
//! Defines the configuration of `persona-server` and loads it in layers:
//! built-in defaults, then `config.yml` (with `${VAR}` substitution), then
//! plain environment variables for top-level keys, then `PERSONA_`-prefixed
//! variables.

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use tracing::info;

/// A custom error type for configuration issues.
#[derive(Debug)]
pub enum ConfigError {
    /// Indicates an error from the underlying `config` crate.
    General(String),
    /// Indicates a required configuration file was not found.
    NotFound(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::General(msg) => write!(f, "Configuration error: {msg}"),
            ConfigError::NotFound(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// The root configuration structure, mapping directly to `config.yml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// The port for the server to listen on. Loaded from `PORT` env var.
    pub port: u16,
    /// The path to the SQLite database file. Loaded from `DB_URL` env var.
    pub db_url: String,
    /// The HMAC secret used to sign access tokens. Loaded from `JWT_SECRET` env var.
    pub jwt_secret: String,
    /// Lifetime of issued access tokens. Loaded from `TOKEN_EXPIRY_MINUTES` env var.
    pub token_expiry_minutes: i64,
}

pub const DEFAULT_PORT: u16 = 9090;
pub const DEFAULT_JWT_SECRET: &str = "a-secure-secret-key";

// Returns Ok(None) if the file does not exist.
fn read_and_substitute(path: &str) -> Result<Option<String>, ConfigError> {
    if !Path::new(path).exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::General(format!("Failed to read config file '{path}': {e}")))?;

    let re = Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}")
        .map_err(|e| ConfigError::General(format!("Invalid substitution pattern: {e}")))?;
    let expanded_content = re.replace_all(&content, |caps: &regex::Captures| {
        let var_name = &caps["var"];
        env::var(var_name).unwrap_or_default()
    });

    Ok(Some(expanded_content.to_string()))
}

/// Loads the application configuration from a file and environment variables.
///
/// - Without an override, `config.yml` next to this crate's manifest is used
///   if present; otherwise only defaults and the environment apply.
/// - With an override, the file must exist or `ConfigError::NotFound` is returned.
/// - Top-level keys are overridden by `PORT`, `DB_URL`, `JWT_SECRET` and
///   `TOKEN_EXPIRY_MINUTES`, then by `PERSONA_...` variables (e.g. `PERSONA_JWT_SECRET`).
pub fn get_config(config_path_override: Option<&str>) -> Result<AppConfig, ConfigError> {
    let base_path = env!("CARGO_MANIFEST_DIR");
    let mut builder = ConfigBuilder::builder()
        // Layer 1: Programmatic defaults.
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("db_url", persona::constants::DEFAULT_DB_FILE)?
        .set_default("jwt_secret", DEFAULT_JWT_SECRET)?
        .set_default(
            "token_expiry_minutes",
            core_access::ACCESS_TOKEN_EXPIRY_MINUTES,
        )?;

    // Layer 2: Main config file.
    let main_content = match config_path_override {
        Some(override_path) => Some(read_and_substitute(override_path)?.ok_or_else(|| {
            ConfigError::NotFound(format!("Config file not found at '{override_path}'."))
        })?),
        None => {
            let user_config_path = format!("{base_path}/config.yml");
            let content = read_and_substitute(&user_config_path)?;
            if content.is_some() {
                info!("Loading configuration from '{user_config_path}'.");
            } else {
                info!("'{user_config_path}' not found. Using defaults and environment.");
            }
            content
        }
    };
    if let Some(content) = main_content {
        builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
    }

    let settings = builder
        // Layer 3: Environment variables for top-level keys like PORT.
        .add_source(Environment::default().try_parsing(true))
        // Layer 4: Prefixed environment variables.
        .add_source(
            Environment::with_prefix("PERSONA")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;

    if config.jwt_secret.is_empty() {
        return Err(ConfigError::General("jwt_secret must not be empty".to_string()));
    }
    if config.token_expiry_minutes <= 0 {
        return Err(ConfigError::General(format!(
            "token_expiry_minutes must be positive, got {}",
            config.token_expiry_minutes
        )));
    }

    Ok(config)
}
