// Service modules
pub mod credit_ledger;
pub mod notification_service;
pub mod reconciler_service;
pub mod replicate_service;
pub mod storage_service;
pub mod training_service;
pub mod webhook_service;

pub use credit_ledger::CreditLedger;
pub use notification_service::NotificationService;
pub use reconciler_service::TrainingReconciler;
pub use replicate_service::ReplicateService;
pub use storage_service::StorageService;
pub use training_service::TrainingService;
pub use webhook_service::WebhookVerifier;
