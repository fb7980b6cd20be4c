/// Reconciler state-machine tests.
///
/// The provider delivers webhooks at-least-once, so the guarded transition
/// must yield exactly one effective status change, one ledger adjustment and
/// one notification per job. Storage and SMTP point at dead endpoints here;
/// their failures are best-effort by design and must not affect the outcome.
use crate::common::{
    create_balance, create_job, dummy_email_config, dummy_storage_config, fetch_job,
    setup_test_db, training_credits,
};
use entity::sea_orm_active_enums::TrainingStatus;
use std::sync::Arc;
use trainvonia::models::training::{TrainingOutcome, TrainingWebhookParams};
use trainvonia::services::{
    CreditLedger, NotificationService, StorageService, TrainingReconciler,
};
use trainvonia::services::reconciler_service::ReconcileResult;
use uuid::Uuid;

fn build_reconciler(db: sea_orm::DatabaseConnection) -> TrainingReconciler {
    let ledger = Arc::new(CreditLedger::new(db.clone()));
    let storage = Arc::new(StorageService::new(&dummy_storage_config()));
    let notifier =
        Arc::new(NotificationService::new(&dummy_email_config()).expect("notifier builds"));
    TrainingReconciler::new(db, ledger, storage, notifier)
}

fn params(user_id: Uuid, model_name: &str) -> TrainingWebhookParams {
    TrainingWebhookParams {
        user_id,
        model_name: model_name.to_string(),
        archive_name: "does-not-exist.zip".to_string(),
    }
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn test_succeeded_webhook_records_outcome_and_keeps_credit_spent() {
    let db = setup_test_db().await;
    let user_id = Uuid::new_v4();
    // One credit already spent on the running job
    create_balance(&db, user_id, 1, 2).await;
    let job_id = create_job(
        &db,
        user_id,
        "SummerLook",
        TrainingStatus::Processing,
        time::OffsetDateTime::now_utc(),
    )
    .await;

    let reconciler = build_reconciler(db.clone());

    let result = reconciler
        .apply(
            &params(user_id, "SummerLook"),
            TrainingOutcome::Succeeded {
                duration: Some(842.0),
                version: "abc123".to_string(),
            },
        )
        .await
        .expect("apply should succeed");
    assert_eq!(result, ReconcileResult::Applied);

    let job = fetch_job(&db, job_id).await;
    assert_eq!(job.status, TrainingStatus::Succeeded);
    assert_eq!(job.trained_version.as_deref(), Some("abc123"));
    assert_eq!(job.training_duration, Some(842.0));
    assert!(job.completed_at.is_some());

    // Refund-on-non-success policy: a succeeded run keeps the credit spent
    assert_eq!(training_credits(&db, user_id).await, 1);
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn test_duplicate_delivery_applies_exactly_once() {
    let db = setup_test_db().await;
    let user_id = Uuid::new_v4();
    create_balance(&db, user_id, 1, 2).await;
    let job_id = create_job(
        &db,
        user_id,
        "Headshots",
        TrainingStatus::Processing,
        time::OffsetDateTime::now_utc(),
    )
    .await;

    let reconciler = build_reconciler(db.clone());
    let outcome = TrainingOutcome::Failed {
        reason: Some("OOM".to_string()),
    };

    let first = reconciler
        .apply(&params(user_id, "Headshots"), outcome.clone())
        .await
        .expect("first apply");
    assert_eq!(first, ReconcileResult::Applied);
    assert_eq!(training_credits(&db, user_id).await, 2, "failure refunds the credit");

    // Provider retry: same delivery again
    let second = reconciler
        .apply(&params(user_id, "Headshots"), outcome)
        .await
        .expect("second apply");
    assert_eq!(second, ReconcileResult::AlreadyTerminal);

    // Exactly one ledger adjustment
    assert_eq!(training_credits(&db, user_id).await, 2);
    assert_eq!(fetch_job(&db, job_id).await.status, TrainingStatus::Failed);
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn test_terminal_job_rejects_differently_shaped_webhook() {
    let db = setup_test_db().await;
    let user_id = Uuid::new_v4();
    create_balance(&db, user_id, 1, 2).await;
    let job_id = create_job(
        &db,
        user_id,
        "Portraits",
        TrainingStatus::Succeeded,
        time::OffsetDateTime::now_utc(),
    )
    .await;

    let reconciler = build_reconciler(db.clone());

    let result = reconciler
        .apply(&params(user_id, "Portraits"), TrainingOutcome::Canceled)
        .await
        .expect("apply should not error");
    assert_eq!(result, ReconcileResult::AlreadyTerminal);

    let job = fetch_job(&db, job_id).await;
    assert_eq!(job.status, TrainingStatus::Succeeded);
    assert_eq!(training_credits(&db, user_id).await, 1, "no refund for a no-op");
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn test_unknown_job_is_not_found() {
    let db = setup_test_db().await;
    let reconciler = build_reconciler(db.clone());

    let result = reconciler
        .apply(&params(Uuid::new_v4(), "Nope"), TrainingOutcome::Canceled)
        .await;

    assert!(matches!(result, Err(trainvonia::ApiError::NotFound(_))));
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn test_stale_pending_job_is_expired_and_refunded() {
    let db = setup_test_db().await;
    let user_id = Uuid::new_v4();
    create_balance(&db, user_id, 0, 2).await;
    let job_id = create_job(
        &db,
        user_id,
        "Forgotten",
        TrainingStatus::Pending,
        time::OffsetDateTime::now_utc() - time::Duration::hours(6),
    )
    .await;

    let reconciler = build_reconciler(db.clone());

    let expired = reconciler
        .expire_stale(time::Duration::hours(2))
        .await
        .expect("sweep should succeed");
    assert!(expired >= 1);

    let job = fetch_job(&db, job_id).await;
    assert_eq!(job.status, TrainingStatus::Failed);
    assert_eq!(training_credits(&db, user_id).await, 1, "held credit returned");

    // A later sweep sees the job as terminal and leaves it alone
    reconciler
        .expire_stale(time::Duration::hours(2))
        .await
        .expect("second sweep");
    assert_eq!(training_credits(&db, user_id).await, 1);
}
