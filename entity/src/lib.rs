pub mod prelude;

pub mod credit_balances;
pub mod sea_orm_active_enums;
pub mod training_jobs;
