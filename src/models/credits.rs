use serde::Serialize;

use super::common::SuccessResponse;

/// Snapshot of a user's credit balance
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreditBalanceData {
    pub training_credits: i32,
    pub max_training_credits: i32,
    pub generation_credits: i32,
    pub max_generation_credits: i32,
}

pub type CreditBalanceResponse = SuccessResponse<CreditBalanceData>;
