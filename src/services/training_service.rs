use crate::{
    config::{TrainingConfig, WebhookConfig},
    error::{ApiError, Result},
    models::{common::CreditKind, training::SubmitTrainingRequest},
    services::{CreditLedger, ReplicateService, StorageService},
};
use entity::sea_orm_active_enums::TrainingStatus;
use sea_orm::{entity::*, DatabaseConnection};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// Validates a submission, reserves a credit, hands the provider a time-bound
/// read URL for the training archive, starts the remote run and persists the
/// job record.
pub struct TrainingService {
    db: DatabaseConnection,
    ledger: Arc<CreditLedger>,
    replicate: Arc<ReplicateService>,
    storage: Arc<StorageService>,
    training: TrainingConfig,
    webhook_base_url: String,
}

impl TrainingService {
    pub fn new(
        db: DatabaseConnection,
        ledger: Arc<CreditLedger>,
        replicate: Arc<ReplicateService>,
        storage: Arc<StorageService>,
        training: &TrainingConfig,
        webhook: &WebhookConfig,
    ) -> Self {
        Self {
            db,
            ledger,
            replicate,
            storage,
            training: training.clone(),
            webhook_base_url: webhook.base_url.clone(),
        }
    }

    /// Submit one fine-tuning job.
    ///
    /// The credit is reserved before any remote call so an out-of-credits user
    /// never reaches the provider. Every failure after the reservation returns
    /// the hold before the error propagates.
    #[instrument(skip(self, request), fields(model_name = %request.model_name))]
    pub async fn submit(
        &self,
        user_id: Uuid,
        user_email: &str,
        user_display_name: Option<&str>,
        request: SubmitTrainingRequest,
    ) -> Result<Uuid> {
        if request.archive_key.trim().is_empty() || request.model_name.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "archiveKey and modelName are required".to_string(),
            ));
        }

        let reservation = self.ledger.reserve(user_id, CreditKind::Training).await?;

        match self
            .submit_reserved(user_id, user_email, user_display_name, &request)
            .await
        {
            Ok(job_id) => Ok(job_id),
            Err(e) => {
                // Compensating transaction: the remote submission did not
                // complete, so the hold goes back.
                if let Err(release_err) = self
                    .ledger
                    .release(reservation.user_id, reservation.kind)
                    .await
                {
                    error!(
                        "Failed to release reservation for user {} after submission error: {}",
                        user_id, release_err
                    );
                }
                Err(e)
            }
        }
    }

    async fn submit_reserved(
        &self,
        user_id: Uuid,
        user_email: &str,
        user_display_name: Option<&str>,
        request: &SubmitTrainingRequest,
    ) -> Result<Uuid> {
        let now = time::OffsetDateTime::now_utc();

        // Time-bound read capability for the archive; the provider must fetch
        // it before expiry.
        let signed_url = self.storage.generate_signed_url(&request.archive_key).await?;

        let model_id = format!(
            "{}_{}_{}",
            user_id,
            now.unix_timestamp(),
            normalize_model_name(&request.model_name)
        );

        self.replicate.create_model(&model_id).await?;

        let webhook_url = self.build_webhook_url(user_id, request)?;

        let training = self
            .replicate
            .create_training(
                &model_id,
                self.training.steps,
                &self.training.resolution,
                &self.training.trigger_word,
                &signed_url,
                webhook_url.as_str(),
            )
            .await?;

        let job_id = Uuid::new_v4();
        let job = entity::training_jobs::ActiveModel {
            id: Set(job_id),
            user_id: Set(user_id),
            model_name: Set(request.model_name.clone()),
            model_id: Set(model_id),
            external_job_id: Set(training.id.clone()),
            status: Set(status_from_provider(training.status.as_deref())),
            trigger_word: Set(self.training.trigger_word.clone()),
            training_steps: Set(self.training.steps),
            gender: Set(request.gender.clone()),
            archive_name: Set(request.archive_key.clone()),
            user_email: Set(user_email.to_string()),
            user_display_name: Set(user_display_name.map(|s| s.to_string())),
            trained_version: Set(None),
            training_duration: Set(None),
            created_at: Set(now),
            completed_at: Set(None),
        };

        entity::training_jobs::Entity::insert(job)
            .exec(&self.db)
            .await
            .map_err(|e| {
                let msg = e.to_string();
                if msg.to_lowercase().contains("unique") || msg.to_lowercase().contains("duplicate")
                {
                    ApiError::BadRequest(format!(
                        "A model named {:?} already exists for this user",
                        request.model_name
                    ))
                } else {
                    ApiError::Database(e)
                }
            })?;

        info!(
            "Persisted training job {} for user {} (external id {})",
            job_id, user_id, training.id
        );

        Ok(job_id)
    }

    fn build_webhook_url(&self, user_id: Uuid, request: &SubmitTrainingRequest) -> Result<reqwest::Url> {
        reqwest::Url::parse_with_params(
            &format!("{}/api/v1/webhooks/training", self.webhook_base_url),
            &[
                ("user_id", user_id.to_string()),
                ("model_name", request.model_name.clone()),
                ("archive_name", request.archive_key.clone()),
            ],
        )
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Invalid webhook base URL: {}", e)))
    }
}

fn normalize_model_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "-")
}

fn status_from_provider(status: Option<&str>) -> TrainingStatus {
    match status {
        // An absent status means the run has not been scheduled yet
        None | Some("pending") => TrainingStatus::Pending,
        // starting/queued/processing all mean the run is live
        Some(_) => TrainingStatus::Processing,
    }
}
