use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::common::SuccessResponse;

/// Request to start a fine-tuning run
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTrainingRequest {
    /// Storage key of the uploaded training archive
    #[validate(length(min = 1, max = 512))]
    pub archive_key: String,

    #[validate(length(min = 1, max = 100))]
    pub model_name: String,

    #[validate(length(max = 20))]
    pub gender: Option<String>,
}

pub type SubmitTrainingResponse = SuccessResponse<SubmitTrainingData>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTrainingData {
    pub job_id: Uuid,
}

/// Identifying query parameters this service appends to the callback URL at
/// submission time. The provider is identity-agnostic and echoes them back.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingWebhookParams {
    pub user_id: Uuid,
    pub model_name: String,
    pub archive_name: String,
}

/// Raw provider webhook payload, parsed leniently; shape is validated when
/// converting into a `TrainingOutcome`.
#[derive(Debug, Deserialize)]
pub struct TrainingWebhookPayload {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub metrics: Option<TrainingMetrics>,
    #[serde(default)]
    pub output: Option<TrainingOutput>,
}

#[derive(Debug, Deserialize)]
pub struct TrainingMetrics {
    #[serde(default)]
    pub predict_time: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct TrainingOutput {
    #[serde(default)]
    pub version: Option<String>,
}

/// Closed representation of a completion callback. Anything that does not
/// parse into one of these variants is rejected at the boundary instead of
/// being folded into the failure branch.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainingOutcome {
    Succeeded {
        /// Provider predict_time metric, seconds
        duration: Option<f64>,
        /// Trained version hash, the part after ':' in the composite
        /// "owner/name:hash" string
        version: String,
    },
    Failed {
        reason: Option<String>,
    },
    Canceled,
}

impl TryFrom<TrainingWebhookPayload> for TrainingOutcome {
    type Error = String;

    fn try_from(payload: TrainingWebhookPayload) -> Result<Self, Self::Error> {
        match payload.status.as_str() {
            "succeeded" => {
                let composite = payload
                    .output
                    .and_then(|o| o.version)
                    .ok_or_else(|| "succeeded payload is missing output.version".to_string())?;
                let version = composite
                    .rsplit_once(':')
                    .map(|(_, hash)| hash.to_string())
                    .ok_or_else(|| {
                        format!("output.version {:?} is not in name:hash form", composite)
                    })?;
                Ok(TrainingOutcome::Succeeded {
                    duration: payload.metrics.and_then(|m| m.predict_time),
                    version,
                })
            }
            "failed" => Ok(TrainingOutcome::Failed {
                reason: payload.error,
            }),
            "canceled" => Ok(TrainingOutcome::Canceled),
            other => Err(format!("unrecognized training status {:?}", other)),
        }
    }
}

impl TrainingOutcome {
    /// Human-readable status text used in notifications.
    pub fn status_text(&self) -> &'static str {
        match self {
            TrainingOutcome::Succeeded { .. } => "succeeded",
            TrainingOutcome::Failed { .. } => "failed",
            TrainingOutcome::Canceled => "canceled",
        }
    }
}
