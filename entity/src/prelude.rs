pub use super::credit_balances::Entity as CreditBalances;
pub use super::training_jobs::Entity as TrainingJobs;
