/// HTTP-surface tests driven through the full router.
///
/// These exercise the composed request path: extractors, auth middleware,
/// verification ordering, and the error envelope status codes.
use crate::common::{
    create_balance, create_job, fetch_job, make_token, setup_test_db, test_config,
    training_credits,
};
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use entity::sea_orm_active_enums::TrainingStatus;
use tower::ServiceExt;
use trainvonia::{routes::create_router, AppState};
use uuid::Uuid;

async fn build_app() -> axum::Router {
    let state = AppState::new(test_config())
        .await
        .expect("app state builds against the test database");
    create_router(state)
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn test_body_missing_required_fields_returns_400() {
    let db = setup_test_db().await;
    let user_id = Uuid::new_v4();
    create_balance(&db, user_id, 1, 2).await;

    let app = build_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/trainings")
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {}", make_token(user_id)))
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    // Missing fields parse-fail in the extractor and answer 400, not 422
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // No reservation happened
    assert_eq!(training_credits(&db, user_id).await, 1);
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn test_rejected_webhook_delivery_leaves_job_untouched() {
    let db = setup_test_db().await;
    let user_id = Uuid::new_v4();
    create_balance(&db, user_id, 1, 2).await;
    let job_id = create_job(
        &db,
        user_id,
        "SummerLook",
        TrainingStatus::Processing,
        time::OffsetDateTime::now_utc(),
    )
    .await;

    let app = build_app().await;

    let uri = format!(
        "/api/v1/webhooks/training?user_id={}&model_name=SummerLook&archive_name=a.zip",
        user_id
    );
    let body = r#"{"status":"succeeded","output":{"version":"ns/summer-look:abc123"}}"#;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .header("webhook-id", "msg_1")
                // Ancient timestamp, rejected before any state is read
                .header("webhook-timestamp", "1000")
                .header("webhook-signature", "v1,Zm9yZ2Vk")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The delivery failed verification, so the job row is completely unmodified
    let job = fetch_job(&db, job_id).await;
    assert_eq!(job.status, TrainingStatus::Processing);
    assert!(job.trained_version.is_none());
    assert!(job.completed_at.is_none());
    assert_eq!(training_credits(&db, user_id).await, 1);
}
