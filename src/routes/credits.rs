use axum::{extract::State, Json};
use tracing::instrument;

use crate::{
    app_state::AppState,
    error::Result,
    middleware::UserIdentity,
    models::{common::SuccessResponse, credits::CreditBalanceResponse},
};

/// GET /api/v1/credits
#[instrument(skip(state, identity))]
pub async fn get_credit_balance(
    State(state): State<AppState>,
    identity: UserIdentity,
) -> Result<Json<CreditBalanceResponse>> {
    let balance = state.ledger.balance(identity.user_id).await?;

    Ok(Json(SuccessResponse::new(balance)))
}
