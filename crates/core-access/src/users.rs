//! User records: registration, credential checks and token subject resolution.

use crate::{AccessToken, CoreAccessError, PasswordHasher, TokenIssuer};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tokio::sync::Mutex;
use tracing::{info, warn};
use turso::{Connection, Database, Row, params};

// Registrations run the username check and the insert under this lock, so a
// second writer for the same name sees the first one's row instead of racing it.
static REGISTRATION_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Creates the `users` table. Idempotent.
pub const CREATE_USERS_TABLE_SQL: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        hashed_password TEXT NOT NULL,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );
";

/// Represents a registered user. The password hash never leaves this crate.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl TryFrom<&Row> for User {
    type Error = CoreAccessError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
        })
    }
}

/// Registers a new user, storing only a salted hash of `password`.
///
/// Fails with `UsernameTaken` or `EmailTaken` when either value is already in use.
/// Registrations within this process are serialized, so of two concurrent
/// registrations of one name exactly one succeeds. The table's UNIQUE
/// constraints still settle writers from other processes.
pub async fn register_user(
    db: &Database,
    hasher: &dyn PasswordHasher,
    username: &str,
    email: &str,
    password: &str,
) -> Result<User, CoreAccessError> {
    let hashed_password = hasher.hash(password)?;

    let _guard = REGISTRATION_LOCK.lock().await;
    let conn = db.connect()?;

    if find_user_by_username_on(&conn, username).await?.is_some() {
        return Err(CoreAccessError::UsernameTaken(username.to_string()));
    }

    let insert = conn
        .query(
            "INSERT INTO users (username, email, hashed_password) VALUES (?, ?, ?) RETURNING id",
            params![username, email, hashed_password],
        )
        .await;

    let mut rows = match insert {
        Ok(rows) => rows,
        Err(turso::Error::SqlExecutionFailure(msg)) if msg.contains("UNIQUE constraint failed") => {
            return Err(unique_violation(&msg, username, email));
        }
        Err(e) => return Err(e.into()),
    };

    let id: i64 = match rows.next().await {
        Ok(Some(row)) => row.get(0)?,
        Ok(None) => {
            return Err(CoreAccessError::DataIntegrity(format!(
                "Insert of user '{username}' returned no id"
            )));
        }
        Err(turso::Error::SqlExecutionFailure(msg)) if msg.contains("UNIQUE constraint failed") => {
            return Err(unique_violation(&msg, username, email));
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = id, %username, "Registered new user.");
    Ok(User {
        id,
        username: username.to_string(),
        email: email.to_string(),
    })
}

fn unique_violation(msg: &str, username: &str, email: &str) -> CoreAccessError {
    if msg.contains("email") {
        CoreAccessError::EmailTaken(email.to_string())
    } else {
        CoreAccessError::UsernameTaken(username.to_string())
    }
}

/// Finds a user by username.
pub async fn find_user_by_username(
    db: &Database,
    username: &str,
) -> Result<Option<User>, CoreAccessError> {
    let conn = db.connect()?;
    find_user_by_username_on(&conn, username).await
}

/// Finds a user by primary key.
pub async fn find_user_by_id(db: &Database, id: i64) -> Result<Option<User>, CoreAccessError> {
    let conn = db.connect()?;
    let mut rows = conn
        .query(
            "SELECT id, username, email FROM users WHERE id = ?",
            params![id],
        )
        .await?;

    match rows.next().await? {
        Some(row) => Ok(Some(User::try_from(&row)?)),
        None => Ok(None),
    }
}

async fn find_user_by_username_on(
    conn: &Connection,
    username: &str,
) -> Result<Option<User>, CoreAccessError> {
    let mut rows = conn
        .query(
            "SELECT id, username, email FROM users WHERE username = ?",
            params![username],
        )
        .await?;

    match rows.next().await? {
        Some(row) => Ok(Some(User::try_from(&row)?)),
        None => Ok(None),
    }
}

/// Checks `password` against the stored hash and, on success, issues a token
/// whose subject is the username.
pub async fn login(
    db: &Database,
    hasher: &dyn PasswordHasher,
    issuer: &TokenIssuer,
    username: &str,
    password: &str,
) -> Result<AccessToken, CoreAccessError> {
    let conn = db.connect()?;
    let mut rows = conn
        .query(
            "SELECT hashed_password FROM users WHERE username = ?",
            params![username],
        )
        .await?;

    let Some(row) = rows.next().await? else {
        warn!(%username, "Login attempt for unknown user.");
        return Err(CoreAccessError::InvalidCredentials);
    };
    let hashed_password: String = row.get(0)?;

    if !hasher.verify(password, &hashed_password)? {
        warn!(%username, "Login attempt with wrong password.");
        return Err(CoreAccessError::InvalidCredentials);
    }

    info!(%username, "Issuing access token.");
    issuer.issue(username)
}

/// Validates `token` and resolves its subject to a stored user.
///
/// Fails with `InvalidToken` on any signature or expiry problem and with
/// `UserNotFound` when the subject no longer exists.
pub async fn authenticate(
    db: &Database,
    issuer: &TokenIssuer,
    token: &str,
) -> Result<User, CoreAccessError> {
    let claims = issuer.validate(token)?;
    find_user_by_username(db, &claims.sub)
        .await?
        .ok_or(CoreAccessError::UserNotFound(claims.sub))
}
