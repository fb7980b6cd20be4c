use axum::{
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
};
use tracing::instrument;

use crate::{
    app_state::AppState,
    error::{ApiError, Result},
    models::training::{TrainingOutcome, TrainingWebhookParams, TrainingWebhookPayload},
    services::webhook_service::WebhookHeaders,
};

/// POST /api/v1/webhooks/training
///
/// Completion callback from the training provider. The query string carries
/// the identity this service appended at submission time; the headers carry
/// the delivery signature. A non-2xx response makes the provider retry, so
/// errors after verification deliberately surface instead of being swallowed.
#[instrument(skip(state, headers, body))]
pub async fn training_webhook(
    State(state): State<AppState>,
    Query(params): Query<TrainingWebhookParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str> {
    let delivery = WebhookHeaders {
        id: required_header(&headers, "webhook-id")?,
        timestamp: required_header(&headers, "webhook-timestamp")?,
        signature: required_header(&headers, "webhook-signature")?,
    };

    // Verify before touching the payload; an invalid delivery mutates nothing.
    state.webhook_verifier.verify(&delivery, &body).await?;

    let payload: TrainingWebhookPayload = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Malformed webhook payload: {}", e)))?;

    let outcome = TrainingOutcome::try_from(payload).map_err(ApiError::BadRequest)?;

    state.reconciler.apply(&params, outcome).await?;

    // Duplicate deliveries also answer 200 so the provider stops retrying
    Ok("Ok")
}

fn required_header(headers: &HeaderMap, name: &str) -> Result<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
        .ok_or_else(|| {
            ApiError::SignatureVerification(format!("Missing required header {}", name))
        })
}
