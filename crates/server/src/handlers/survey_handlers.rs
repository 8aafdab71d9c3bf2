//! # Survey Route Handlers
//!
//! The question catalog (public) and the caller's answers (authenticated).
//! Submitting answers reconciles the caller's profile in the same request.

use super::{wrap_response, ApiResponse, AppError, AppState, DebugParams};
use crate::{auth::AuthenticatedUser, errors::QUESTIONS_ADDED};
use axum::{
    extract::{Query, State},
    Json,
};
use persona::{
    bulk_create_questions, list_questions, list_responses, submit_and_reconcile,
    AnsweredQuestion, NewSurveyQuestion, Profile, SurveyAnswer, SurveyQuestion,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

// --- API Payloads for Survey Handlers ---

#[derive(Debug, Deserialize)]
pub struct BulkQuestionsRequest {
    pub questions: Vec<NewSurveyQuestion>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkQuestionsResponse {
    pub message: String,
    pub count: usize,
}

// --- Handlers ---

/// Lists the whole question catalog.
pub async fn list_questions_handler(
    State(app_state): State<AppState>,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Vec<SurveyQuestion>>>, AppError> {
    let questions = list_questions(app_state.db()).await?;
    let debug_info = json!({ "count": questions.len() });
    Ok(wrap_response(questions, debug_params, Some(debug_info)))
}

/// Appends a batch of questions to the catalog.
pub async fn bulk_create_questions_handler(
    State(app_state): State<AppState>,
    debug_params: Query<DebugParams>,
    Json(payload): Json<BulkQuestionsRequest>,
) -> Result<Json<ApiResponse<BulkQuestionsResponse>>, AppError> {
    let count = bulk_create_questions(app_state.db(), &payload.questions).await?;
    Ok(wrap_response(
        BulkQuestionsResponse {
            message: QUESTIONS_ADDED.to_string(),
            count,
        },
        debug_params,
        None,
    ))
}

/// Stores the caller's answers and returns the reconciled profile.
pub async fn submit_responses_handler(
    State(app_state): State<AppState>,
    debug_params: Query<DebugParams>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(answers): Json<Vec<SurveyAnswer>>,
) -> Result<Json<ApiResponse<Profile>>, AppError> {
    info!(
        user_id = user.id,
        answers = answers.len(),
        "Received survey submission."
    );
    let profile = submit_and_reconcile(app_state.db(), &user, &answers).await?;
    let debug_info = json!({ "submitted": answers.len() });
    Ok(wrap_response(profile, debug_params, Some(debug_info)))
}

/// Lists the caller's answers with their question text.
pub async fn list_responses_handler(
    State(app_state): State<AppState>,
    debug_params: Query<DebugParams>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<AnsweredQuestion>>>, AppError> {
    let answers = list_responses(app_state.db(), user.id).await?;
    Ok(wrap_response(answers, debug_params, None))
}
