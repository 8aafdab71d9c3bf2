use super::{handlers, state::AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Creates the Axum router with all the application routes.
pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/register", post(handlers::register_handler))
        .route("/token", post(handlers::token_handler))
        .route(
            "/user",
            get(handlers::get_me_handler).delete(handlers::delete_me_handler),
        )
        .route(
            "/users/profile",
            get(handlers::get_profile_handler).post(handlers::create_profile_handler),
        )
        .route("/survey/questions", get(handlers::list_questions_handler))
        .route(
            "/survey/questions/bulk",
            post(handlers::bulk_create_questions_handler),
        )
        .route(
            "/survey/responses",
            get(handlers::list_responses_handler).post(handlers::submit_responses_handler),
        )
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}
