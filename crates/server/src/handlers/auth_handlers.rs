//! # Authentication Route Handlers
//!
//! Registration, the OAuth2 password-flow token endpoint and the `/user`
//! resource of the caller.

use super::{wrap_response, ApiResponse, AppError, AppState, DebugParams};
use crate::{
    auth::{AuthenticatedUser, BearerClaims},
    errors::{INVALID_TOKEN, USER_DELETED},
};
use axum::{
    extract::{Query, State},
    Form, Json,
};
use core_access::{find_user_by_username, login, register_user, AccessToken, User};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

// --- API Payloads for Auth Handlers ---

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Form fields of the OAuth2 password grant. Other grant fields are ignored.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// --- Handlers ---

/// Creates a new user account.
pub async fn register_handler(
    State(app_state): State<AppState>,
    debug_params: Query<DebugParams>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    info!(username = %payload.username, "Received registration request.");
    let user = register_user(
        app_state.db(),
        app_state.hasher.as_ref(),
        &payload.username,
        &payload.email,
        &payload.password,
    )
    .await?;
    Ok(wrap_response(user, debug_params, None))
}

/// Exchanges a username and password for a bearer token.
///
/// The body is the bare OAuth2 token response so standard clients can consume it.
pub async fn token_handler(
    State(app_state): State<AppState>,
    Form(form): Form<TokenRequest>,
) -> Result<Json<AccessToken>, AppError> {
    let token = login(
        app_state.db(),
        app_state.hasher.as_ref(),
        &app_state.token_issuer,
        &form.username,
        &form.password,
    )
    .await?;
    Ok(Json(token))
}

/// Returns the details of the currently authenticated user.
pub async fn get_me_handler(
    State(app_state): State<AppState>,
    debug_params: Query<DebugParams>,
    BearerClaims(claims): BearerClaims,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let user = find_user_by_username(app_state.db(), &claims.sub)
        .await?
        .ok_or_else(|| {
            warn!(subject = %claims.sub, "Valid token for a user that no longer exists.");
            AppError::Unauthorized(INVALID_TOKEN.to_string())
        })?;
    let debug_info = json!({ "expires_at": claims.exp });
    Ok(wrap_response(user, debug_params, Some(debug_info)))
}

/// Deletes the current user together with their profile and survey responses.
pub async fn delete_me_handler(
    State(app_state): State<AppState>,
    debug_params: Query<DebugParams>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<ApiResponse<MessageResponse>>, AppError> {
    app_state.store.delete_user(user.id).await?;
    info!(user_id = user.id, "Deleted account.");
    Ok(wrap_response(
        MessageResponse {
            message: USER_DELETED.to_string(),
        },
        debug_params,
        None,
    ))
}
