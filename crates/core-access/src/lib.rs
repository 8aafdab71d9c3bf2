//! # Core Access Crate
//!
//! This crate is the central authority for identity and authentication (AuthN)
//! in `persona`: it owns the `users` table, password hashing, and the issuing
//! and validation of bearer tokens.

pub mod password;
pub mod token;
mod users;

pub use password::{Argon2Hasher, PasswordHasher};
pub use token::{AccessToken, Claims, TokenIssuer, ACCESS_TOKEN_EXPIRY_MINUTES};
pub use users::{
    authenticate, find_user_by_id, find_user_by_username, login, register_user, User,
    CREATE_USERS_TABLE_SQL,
};

use thiserror::Error;
use turso::Error as TursoError;

#[derive(Error, Debug)]
pub enum CoreAccessError {
    #[error("Database error: {0}")]
    Database(#[from] TursoError),
    #[error("Username '{0}' already exists")]
    UsernameTaken(String),
    #[error("Email '{0}' is already registered")]
    EmailTaken(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("No user found for subject '{0}'")]
    UserNotFound(String),
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),
}
