use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a training job.
///
/// Pending and Processing are live states; Succeeded, Failed and Canceled are
/// terminal and must never be overwritten once written.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum TrainingStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "succeeded")]
    Succeeded,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "canceled")]
    Canceled,
}

impl TrainingStatus {
    /// Terminal states reject any further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TrainingStatus::Succeeded | TrainingStatus::Failed | TrainingStatus::Canceled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrainingStatus::Pending => "pending",
            TrainingStatus::Processing => "processing",
            TrainingStatus::Succeeded => "succeeded",
            TrainingStatus::Failed => "failed",
            TrainingStatus::Canceled => "canceled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!TrainingStatus::Pending.is_terminal());
        assert!(!TrainingStatus::Processing.is_terminal());
        assert!(TrainingStatus::Succeeded.is_terminal());
        assert!(TrainingStatus::Failed.is_terminal());
        assert!(TrainingStatus::Canceled.is_terminal());
    }
}
