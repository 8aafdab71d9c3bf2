//! # Shared Constants
//!
//! Constants shared across the crates of the `persona` workspace.

/// The default path for the main application SQLite database.
pub const DEFAULT_DB_FILE: &str = "db/persona.db";
