//! # Authentication Middleware
//!
//! Axum extractors for bearer-token authentication.
//!
//! - [`BearerClaims`] only checks the token: a missing, malformed, tampered or
//!   expired token is rejected with `401 Unauthorized`.
//! - [`AuthenticatedUser`] additionally resolves the token's subject to a stored
//!   user and rejects with `404 Not Found` when that user no longer exists.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use core_access::{authenticate, Claims, CoreAccessError, User};
use serde_json::json;
use tracing::{error, info, warn};

use crate::{
    errors::{INVALID_TOKEN, USER_NOT_FOUND},
    state::AppState,
};

pub const NOT_AUTHENTICATED: &str = "Not authenticated.";

/// The validated claims of the request's bearer token.
#[derive(Debug, Clone)]
pub struct BearerClaims(pub Claims);

/// The stored user the request's bearer token was issued to.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// A custom rejection type for authentication failures.
#[derive(Debug)]
pub struct AuthError(pub StatusCode, pub String);

impl AuthError {
    fn unauthorized(message: &str) -> Self {
        AuthError(StatusCode::UNAUTHORIZED, message.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

/// Pulls the raw token out of `Authorization: Bearer <token>`.
async fn bearer_token(parts: &mut Parts, state: &AppState) -> Result<String, AuthError> {
    let bearer_header =
        Option::<TypedHeader<Authorization<Bearer>>>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                warn!("Unexpected error during header extraction: {}", e);
                AuthError::unauthorized(NOT_AUTHENTICATED)
            })?;

    match bearer_header {
        Some(TypedHeader(Authorization(bearer))) => Ok(bearer.token().to_string()),
        None => {
            info!("Rejecting request without a bearer token.");
            Err(AuthError::unauthorized(NOT_AUTHENTICATED))
        }
    }
}

impl FromRequestParts<AppState> for BearerClaims {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts, state).await?;
        let claims = state.token_issuer.validate(&token).map_err(|e| {
            warn!("JWT validation failed: {}", e);
            AuthError::unauthorized(INVALID_TOKEN)
        })?;
        Ok(BearerClaims(claims))
    }
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts, state).await?;
        let user = authenticate(state.db(), &state.token_issuer, &token)
            .await
            .map_err(|e| match e {
                CoreAccessError::InvalidToken(e) => {
                    warn!("JWT validation failed: {}", e);
                    AuthError::unauthorized(INVALID_TOKEN)
                }
                CoreAccessError::UserNotFound(subject) => {
                    warn!(%subject, "Token subject no longer exists.");
                    AuthError(StatusCode::NOT_FOUND, USER_NOT_FOUND.to_string())
                }
                other => {
                    error!("Failed to authenticate request: {}", other);
                    AuthError(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "An internal server error occurred.".to_string(),
                    )
                }
            })?;
        Ok(AuthenticatedUser(user))
    }
}
