use core_access::CoreAccessError;
use thiserror::Error;

/// Errors raised by the profile, survey and response stores.
#[derive(Error, Debug)]
pub enum PersonaError {
    #[error("Database error: {0}")]
    Database(#[from] turso::Error),
    #[error(transparent)]
    Access(#[from] CoreAccessError),
    #[error("Storage connection error: {0}")]
    StorageConnection(String),
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),
    #[error("A profile already exists for user {0}")]
    ProfileExists(i64),
    #[error("No profile found for user {0}")]
    ProfileNotFound(i64),
    #[error("No survey responses found for user {0}")]
    NoResponses(i64),
    #[error("Survey question {0} does not exist")]
    QuestionNotFound(i64),
    #[error("User {0} does not exist")]
    UserNotFound(i64),
}
