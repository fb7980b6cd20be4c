// Route modules
pub mod credits;
pub mod trainings;
pub mod webhooks;

use crate::{
    app_state::AppState,
    middleware::{auth_middleware, logging_middleware},
};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "Ok" }))
        .nest("/api/v1", api_v1_routes(state.clone()))
        .with_state(state)
}

/// API v1 routes
fn api_v1_routes(state: AppState) -> Router<AppState> {
    // Protected routes requiring authentication
    let protected_routes = Router::new()
        .route("/trainings", post(trainings::submit_training))
        .route("/credits", get(credits::get_credit_balance))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Provider callbacks authenticate via HMAC signature, not JWT
    let public_routes = Router::new().route("/webhooks/training", post(webhooks::training_webhook));

    Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .layer(middleware::from_fn(logging_middleware))
}
