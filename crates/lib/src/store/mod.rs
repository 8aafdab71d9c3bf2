use crate::errors::PersonaError;
use std::fmt::{self, Debug};
use tracing::{error, info};
use turso::{params, Connection, Database};

pub mod sql;

/// The application's relational store, backed by a local SQLite database via Turso.
///
/// When cloned, it shares the same underlying database, so handlers and tests
/// can hold copies of one in-memory instance.
#[derive(Clone)]
pub struct SqliteStore {
    /// The Turso database instance. It's cloneable and thread-safe.
    pub db: Database,
}

impl SqliteStore {
    /// Opens (or creates) the database at `db_path`. Use ":memory:" for an
    /// isolated in-memory database.
    pub async fn new(db_path: &str) -> Result<Self, PersonaError> {
        let db = turso::Builder::new_local(db_path)
            .build()
            .await
            .map_err(|e| PersonaError::StorageConnection(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| PersonaError::StorageConnection(e.to_string()))?;
        // PRAGMA returns a row, so it has to go through `query`.
        conn.query("PRAGMA journal_mode=WAL;", ())
            .await
            .map_err(|e| PersonaError::StorageConnection(e.to_string()))?;

        Ok(Self { db })
    }

    /// Ensures that all application tables exist. Idempotent; called on every startup.
    pub async fn initialize_schema(&self) -> Result<(), PersonaError> {
        let conn = self.db.connect()?;
        for statement in sql::ALL_TABLE_CREATION_SQL {
            conn.execute(statement, ()).await?;
        }
        Ok(())
    }

    /// Deletes a user together with their profile and survey responses.
    ///
    /// The dependent rows are removed explicitly in the same transaction, so the
    /// cascade holds whether or not the connection enforces foreign keys.
    pub async fn delete_user(&self, user_id: i64) -> Result<(), PersonaError> {
        let conn = self.db.connect()?;

        conn.execute("BEGIN TRANSACTION", ()).await?;
        match delete_user_rows(&conn, user_id).await {
            Ok(false) => {
                rollback(&conn).await;
                Err(PersonaError::UserNotFound(user_id))
            }
            Ok(true) => {
                conn.execute("COMMIT", ()).await?;
                info!(user_id, "Deleted user with profile and responses.");
                Ok(())
            }
            Err(e) => {
                rollback(&conn).await;
                Err(e)
            }
        }
    }
}

/// Rolls back the open transaction on `conn`.
///
/// Used on paths that are already failing: a rollback error is logged and
/// swallowed so the caller can return the error that caused the rollback.
pub(crate) async fn rollback(conn: &Connection) {
    if let Err(e) = conn.execute("ROLLBACK", ()).await {
        error!("Rollback failed: {e}");
    }
}

async fn delete_user_rows(conn: &Connection, user_id: i64) -> Result<bool, PersonaError> {
    let exists = conn
        .query("SELECT 1 FROM users WHERE id = ?", params![user_id])
        .await?
        .next()
        .await?
        .is_some();
    if !exists {
        return Ok(false);
    }

    conn.execute(
        "DELETE FROM survey_responses WHERE user_id = ?",
        params![user_id],
    )
    .await?;
    conn.execute("DELETE FROM user_profiles WHERE user_id = ?", params![user_id])
        .await?;
    conn.execute("DELETE FROM users WHERE id = ?", params![user_id])
        .await?;
    Ok(true)
}

impl Debug for SqliteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}
