use crate::{
    config::Config,
    services::{
        CreditLedger, NotificationService, ReplicateService, StorageService, TrainingReconciler,
        TrainingService, WebhookVerifier,
    },
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// All clients and services, constructed once at process start from injected
/// configuration and passed explicitly; no hidden globals.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub ledger: Arc<CreditLedger>,
    pub training_service: Arc<TrainingService>,
    pub webhook_verifier: Arc<WebhookVerifier>,
    pub reconciler: Arc<TrainingReconciler>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self, anyhow::Error> {
        // Connect to database
        let db = sea_orm::Database::connect(&config.database.url).await?;

        // External clients
        let replicate = Arc::new(ReplicateService::new(&config.replicate));
        let storage = Arc::new(StorageService::new(&config.storage));
        let notifier = Arc::new(NotificationService::new(&config.email)?);

        // Core services
        let ledger = Arc::new(CreditLedger::new(db.clone()));
        let training_service = Arc::new(TrainingService::new(
            db.clone(),
            ledger.clone(),
            replicate.clone(),
            storage.clone(),
            &config.training,
            &config.webhook,
        ));
        let webhook_verifier = Arc::new(WebhookVerifier::new(
            replicate.clone(),
            config.webhook.timestamp_tolerance_seconds,
        ));
        let reconciler = Arc::new(TrainingReconciler::new(
            db.clone(),
            ledger.clone(),
            storage,
            notifier,
        ));

        Ok(Self {
            db,
            ledger,
            training_service,
            webhook_verifier,
            reconciler,
            config: Arc::new(config),
        })
    }
}
