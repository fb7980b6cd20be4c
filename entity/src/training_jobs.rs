use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::sea_orm_active_enums::TrainingStatus;

/// One remote fine-tuning run and its lifecycle. Created by the submitter,
/// mutated only by the reconciler. Unique on (user_id, model_name), which is
/// the identity the webhook query string carries; external_job_id correlates
/// with the provider side.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "training_jobs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub model_name: String,
    /// Synthesized provider namespace: `{user_id}_{unix_ts}_{normalized name}`.
    pub model_id: String,
    #[sea_orm(unique)]
    pub external_job_id: String,
    pub status: TrainingStatus,
    pub trigger_word: String,
    pub training_steps: i32,
    pub gender: Option<String>,
    /// Storage key of the uploaded training archive; deleted on completion.
    pub archive_name: String,
    pub user_email: String,
    pub user_display_name: Option<String>,
    pub trained_version: Option<String>,
    pub training_duration: Option<f64>,
    pub created_at: TimeDateTimeWithTimeZone,
    pub completed_at: Option<TimeDateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
