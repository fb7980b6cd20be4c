use crate::{
    error::{ApiError, Result},
    models::{
        common::CreditKind,
        training::{TrainingOutcome, TrainingWebhookParams},
    },
    services::{CreditLedger, NotificationService, StorageService},
};
use entity::sea_orm_active_enums::TrainingStatus;
use sea_orm::{entity::*, query::*, DatabaseConnection, TransactionTrait};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Outcome of applying a verified delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileResult {
    /// The job moved into a terminal state and side effects ran.
    Applied,
    /// The job was already terminal; duplicate delivery, nothing changed.
    AlreadyTerminal,
}

/// Applies verified completion callbacks to persisted job state.
///
/// The transition is one locked conditional update: "apply only if the current
/// status is non-terminal". The provider retries deliveries, so this guard is
/// what guarantees at most one effective transition, one credit adjustment and
/// one notification per job. The refund (non-success outcomes only) commits in
/// the same transaction as the status flip.
pub struct TrainingReconciler {
    db: DatabaseConnection,
    ledger: Arc<CreditLedger>,
    storage: Arc<StorageService>,
    notifier: Arc<NotificationService>,
}

impl TrainingReconciler {
    pub fn new(
        db: DatabaseConnection,
        ledger: Arc<CreditLedger>,
        storage: Arc<StorageService>,
        notifier: Arc<NotificationService>,
    ) -> Self {
        Self {
            db,
            ledger,
            storage,
            notifier,
        }
    }

    #[instrument(skip(self, outcome), fields(model_name = %params.model_name))]
    pub async fn apply(
        &self,
        params: &TrainingWebhookParams,
        outcome: TrainingOutcome,
    ) -> Result<ReconcileResult> {
        let txn = self.db.begin().await?;

        let job = entity::training_jobs::Entity::find()
            .filter(entity::training_jobs::Column::UserId.eq(params.user_id))
            .filter(entity::training_jobs::Column::ModelName.eq(params.model_name.as_str()))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!(
                    "No training job {:?} for user {}",
                    params.model_name, params.user_id
                ))
            })?;

        if job.status.is_terminal() {
            txn.commit().await?;
            info!(
                "Duplicate delivery for job {} (already {}), ignoring",
                job.id,
                job.status.as_str()
            );
            return Ok(ReconcileResult::AlreadyTerminal);
        }

        let job_id = job.id;
        let user_email = job.user_email.clone();
        let user_display_name = job.user_display_name.clone();
        let now = time::OffsetDateTime::now_utc();

        let mut job_active: entity::training_jobs::ActiveModel = job.into();
        match &outcome {
            TrainingOutcome::Succeeded { duration, version } => {
                job_active.status = Set(TrainingStatus::Succeeded);
                job_active.trained_version = Set(Some(version.clone()));
                job_active.training_duration = Set(*duration);
            }
            TrainingOutcome::Failed { .. } => {
                job_active.status = Set(TrainingStatus::Failed);
            }
            TrainingOutcome::Canceled => {
                job_active.status = Set(TrainingStatus::Canceled);
            }
        }
        job_active.completed_at = Set(Some(now));
        job_active.update(&txn).await?;

        // Refund only on non-success: a succeeded training keeps the credit
        // spent. Committing the release with the transition keeps the
        // adjustment exactly-once under retried deliveries.
        if !matches!(outcome, TrainingOutcome::Succeeded { .. }) {
            self.ledger
                .release_in_txn(params.user_id, CreditKind::Training, &txn)
                .await?;
        }

        txn.commit().await?;

        info!(
            "Training job {} transitioned to {}",
            job_id,
            outcome.status_text()
        );

        self.run_post_transition_effects(
            &params.archive_name,
            &user_email,
            user_display_name.as_deref(),
            &params.model_name,
            outcome.status_text(),
        )
        .await;

        Ok(ReconcileResult::Applied)
    }

    /// Expire live jobs whose callback never arrived. Each job goes through
    /// the same guarded transition as a failed delivery, refunding the held
    /// credit. Returns how many jobs were expired.
    #[instrument(skip(self))]
    pub async fn expire_stale(&self, max_age: time::Duration) -> Result<usize> {
        let cutoff = time::OffsetDateTime::now_utc() - max_age;

        let stale: Vec<(Uuid, Uuid, String, String)> = entity::training_jobs::Entity::find()
            .filter(
                entity::training_jobs::Column::Status
                    .is_in([TrainingStatus::Pending, TrainingStatus::Processing]),
            )
            .filter(entity::training_jobs::Column::CreatedAt.lt(cutoff))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|j| (j.id, j.user_id, j.model_name, j.archive_name))
            .collect();

        let mut expired = 0;
        for (job_id, user_id, model_name, archive_name) in stale {
            let params = TrainingWebhookParams {
                user_id,
                model_name,
                archive_name,
            };
            match self
                .apply(
                    &params,
                    TrainingOutcome::Failed {
                        reason: Some("training callback never arrived".to_string()),
                    },
                )
                .await
            {
                Ok(ReconcileResult::Applied) => {
                    warn!("Expired stale training job {}", job_id);
                    expired += 1;
                }
                // Raced with a real delivery, the guard did its job
                Ok(ReconcileResult::AlreadyTerminal) => {}
                Err(e) => {
                    warn!("Failed to expire stale job {}: {}", job_id, e);
                }
            }
        }

        Ok(expired)
    }

    /// Side effects that must never block or reverse the transition.
    async fn run_post_transition_effects(
        &self,
        archive_name: &str,
        user_email: &str,
        user_display_name: Option<&str>,
        model_name: &str,
        status_text: &str,
    ) {
        if let Err(e) = self.storage.delete_object(archive_name).await {
            warn!(
                "Failed to delete training archive {} after completion: {}",
                archive_name, e
            );
        }

        self.notifier
            .notify_training_outcome(user_email, user_display_name, model_name, status_text)
            .await;
    }
}
