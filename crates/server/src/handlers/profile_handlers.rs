//! # Profile Route Handlers

use super::{wrap_response, ApiResponse, AppError, AppState, DebugParams};
use crate::auth::AuthenticatedUser;
use axum::{
    extract::{Query, State},
    Json,
};
use persona::{create_profile, get_profile, NewProfile, Profile};
use tracing::info;

/// Creates the caller's profile by hand. Fails if one already exists.
pub async fn create_profile_handler(
    State(app_state): State<AppState>,
    debug_params: Query<DebugParams>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<NewProfile>,
) -> Result<Json<ApiResponse<Profile>>, AppError> {
    info!(user_id = user.id, "Received profile creation request.");
    let profile = create_profile(app_state.db(), user.id, payload).await?;
    Ok(wrap_response(profile, debug_params, None))
}

/// Returns the caller's profile.
pub async fn get_profile_handler(
    State(app_state): State<AppState>,
    debug_params: Query<DebugParams>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<ApiResponse<Profile>>, AppError> {
    let profile = get_profile(app_state.db(), user.id).await?;
    Ok(wrap_response(profile, debug_params, None))
}
