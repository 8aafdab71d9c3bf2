use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use core_access::CoreAccessError;
use persona::PersonaError;
use serde_json::json;
use tracing::{error, warn};

pub const USERNAME_TAKEN: &str = "Username already exists.";
pub const EMAIL_TAKEN: &str = "Email already registered.";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials.";
pub const INVALID_TOKEN: &str = "Invalid or expired token.";
pub const USER_NOT_FOUND: &str = "User not found.";
pub const PROFILE_EXISTS: &str = "Profile already exists.";
pub const PROFILE_NOT_FOUND: &str = "Profile not found.";
pub const NO_RESPONSES: &str = "No responses found.";
pub const QUESTION_NOT_FOUND: &str = "Survey question not found.";

// Fixed success messages, kept next to the error set.
pub const USER_DELETED: &str = "User deleted successfully.";
pub const QUESTIONS_ADDED: &str = "Survey question added successfully.";

/// A custom error type for the server application.
///
/// Each variant maps to one HTTP status; the message is sent to the client as
/// `{"error": message}`.
#[derive(Debug)]
pub enum AppError {
    /// The request clashes with existing state (400).
    Conflict(String),
    /// Missing, invalid or expired credentials (401).
    Unauthorized(String),
    /// The addressed resource does not exist (404).
    NotFound(String),
    /// Generic internal server errors.
    Internal(anyhow::Error),
}

/// Conversion from `CoreAccessError` to `AppError`.
impl From<CoreAccessError> for AppError {
    fn from(err: CoreAccessError) -> Self {
        match err {
            CoreAccessError::UsernameTaken(_) => AppError::Conflict(USERNAME_TAKEN.to_string()),
            CoreAccessError::EmailTaken(_) => AppError::Conflict(EMAIL_TAKEN.to_string()),
            CoreAccessError::InvalidCredentials => {
                AppError::Unauthorized(INVALID_CREDENTIALS.to_string())
            }
            CoreAccessError::InvalidToken(e) => {
                warn!("Rejected token: {e}");
                AppError::Unauthorized(INVALID_TOKEN.to_string())
            }
            CoreAccessError::UserNotFound(_) => AppError::NotFound(USER_NOT_FOUND.to_string()),
            other => AppError::Internal(other.into()),
        }
    }
}

/// Conversion from `PersonaError` to `AppError`.
impl From<PersonaError> for AppError {
    fn from(err: PersonaError) -> Self {
        match err {
            PersonaError::Access(e) => e.into(),
            PersonaError::ProfileExists(_) => AppError::Conflict(PROFILE_EXISTS.to_string()),
            PersonaError::ProfileNotFound(_) => AppError::NotFound(PROFILE_NOT_FOUND.to_string()),
            PersonaError::NoResponses(_) => AppError::NotFound(NO_RESPONSES.to_string()),
            PersonaError::QuestionNotFound(_) => {
                AppError::NotFound(QUESTION_NOT_FOUND.to_string())
            }
            PersonaError::UserNotFound(_) => AppError::NotFound(USER_NOT_FOUND.to_string()),
            other => AppError::Internal(other.into()),
        }
    }
}

/// Conversion from `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, error_message) = match self {
            AppError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(err) => {
                error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status_code, body).into_response()
    }
}
