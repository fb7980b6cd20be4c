use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use tracing::instrument;
use validator::Validate;

use crate::{
    app_state::AppState,
    error::{ApiError, Result},
    middleware::UserIdentity,
    models::{
        common::SuccessResponse,
        training::{SubmitTrainingData, SubmitTrainingRequest, SubmitTrainingResponse},
    },
};

/// POST /api/v1/trainings
///
/// A body that fails to parse answers 400 like any other validation error,
/// not the extractor's default 422.
#[instrument(skip(state, payload))]
pub async fn submit_training(
    State(state): State<AppState>,
    identity: UserIdentity,
    payload: std::result::Result<Json<SubmitTrainingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitTrainingResponse>)> {
    let Json(request) = payload
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e.body_text())))?;

    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

    let job_id = state
        .training_service
        .submit(
            identity.user_id,
            &identity.email,
            identity.display_name.as_deref(),
            request,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new(SubmitTrainingData { job_id })),
    ))
}
