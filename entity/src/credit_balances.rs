use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-user consumable quota. Mutated only by the credit ledger inside
/// row-locked transactions; never written directly by handlers.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "credit_balances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub user_id: Uuid,
    pub training_credits: i32,
    pub max_training_credits: i32,
    pub generation_credits: i32,
    pub max_generation_credits: i32,
    pub last_updated: TimeDateTimeWithTimeZone,
    pub created_at: TimeDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
