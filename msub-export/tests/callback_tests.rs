//! Integration tests for the import-result callback endpoint
//!
//! Tests cover:
//! - Literal token validation at the HTTP boundary
//! - Terminal status transitions for both verdicts
//! - Failure notification (exactly one mail, on failure only)
//! - Unknown submission handling

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt; // for `oneshot` method
use uuid::Uuid;

use async_trait::async_trait;
use msub_common::config::Config;
use msub_common::models::{ArticleType, FileRecord, Submission, SubmissionStatus};
use msub_export::delivery::PackageStore;
use msub_export::error::ExportError;
use msub_export::export::PackageAssembler;
use msub_export::services::mailer::{MailError, MailSender};
use msub_export::services::people_client::{PeopleError, Person, PersonLookup};
use msub_export::services::FileContentStore;
use msub_export::{build_router, AppState};

// =============================================================================
// Test doubles
// =============================================================================

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<(String, Vec<String>)>>,
}

impl RecordingMailer {
    fn subjects(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(subject, _)| subject.clone())
            .collect()
    }
}

#[async_trait]
impl MailSender for RecordingMailer {
    async fn send_email(
        &self,
        _text: &str,
        _html: &str,
        subject: &str,
        to: &[String],
    ) -> Result<bool, MailError> {
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), to.to_vec()));
        Ok(true)
    }
}

struct NoFiles;

#[async_trait]
impl FileContentStore for NoFiles {
    async fn get_content(&self, record: &FileRecord) -> Result<Vec<u8>, ExportError> {
        Err(ExportError::FileContent(record.filename.clone()))
    }
}

struct NoPeople;

#[async_trait]
impl PersonLookup for NoPeople {
    async fn get_person(&self, id: &str) -> Result<Person, PeopleError> {
        Err(PeopleError::NotFound(id.to_string()))
    }
}

// =============================================================================
// Fixtures
// =============================================================================

async fn test_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    msub_common::db::create_tables(&pool).await.unwrap();
    pool
}

fn test_app(pool: &SqlitePool, mailer: Arc<RecordingMailer>) -> axum::Router {
    let mut config = Config::default();
    config.mail.enabled = true;
    config.mail.import_failure_recipient = "editorial@example.org".to_string();

    let assembler = Arc::new(PackageAssembler::new(
        pool.clone(),
        Arc::new(NoFiles),
        Arc::new(NoPeople),
        config.transfer.clone(),
    ));
    let state = AppState::new(
        pool.clone(),
        Arc::new(config),
        assembler,
        Arc::new(PackageStore::new(vec![])),
        mailer,
    );
    build_router(state)
}

async fn delivered_submission(pool: &SqlitePool) -> Submission {
    let mut submission = Submission::new(ArticleType::ResearchArticle);
    submission.status = SubmissionStatus::MecaExportSucceeded;
    msub_export::db::submissions::save_submission(pool, &submission)
        .await
        .unwrap();
    submission
}

fn callback_request(submission_id: Uuid, result: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/api/meca-result/{}", submission_id))
        .header("content-type", "application/json")
        .body(Body::from(format!(r#"{{"result":"{}"}}"#, result)))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn stored_status(pool: &SqlitePool, id: Uuid) -> SubmissionStatus {
    msub_export::db::submissions::load_submission(pool, id)
        .await
        .unwrap()
        .unwrap()
        .status
}

// =============================================================================
// Callback behavior
// =============================================================================

#[tokio::test]
async fn success_verdict_reaches_the_terminal_state_without_mail() {
    let pool = test_pool().await;
    let mailer = Arc::new(RecordingMailer::default());
    let app = test_app(&pool, mailer.clone());
    let submission = delivered_submission(&pool).await;

    let response = app
        .oneshot(callback_request(submission.id, "success"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["submission_id"], submission.id.to_string());
    assert_eq!(body["status"], "MECA_IMPORT_SUCCEEDED");

    assert_eq!(
        stored_status(&pool, submission.id).await,
        SubmissionStatus::MecaImportSucceeded
    );
    assert!(mailer.subjects().is_empty());
}

#[tokio::test]
async fn failure_verdict_sends_exactly_one_notification() {
    let pool = test_pool().await;
    let mailer = Arc::new(RecordingMailer::default());
    let app = test_app(&pool, mailer.clone());
    let submission = delivered_submission(&pool).await;

    let response = app
        .oneshot(callback_request(submission.id, "failure"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "MECA_IMPORT_FAILED");

    assert_eq!(
        stored_status(&pool, submission.id).await,
        SubmissionStatus::MecaImportFailed
    );

    let subjects = mailer.subjects();
    assert_eq!(subjects.len(), 1);
    assert!(subjects[0].starts_with("MECA import failed"));
    assert!(subjects[0].contains(&submission.id.to_string()));
}

#[tokio::test]
async fn unexpected_token_is_rejected_before_touching_state() {
    let pool = test_pool().await;
    let mailer = Arc::new(RecordingMailer::default());
    let app = test_app(&pool, mailer.clone());
    let submission = delivered_submission(&pool).await;

    for token in ["", "true", "1", "SUCCESS", "Failure"] {
        let response = app
            .clone()
            .oneshot(callback_request(submission.id, token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "token {:?}", token);
        let body = extract_json(response.into_body()).await;
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    // Nothing moved
    assert_eq!(
        stored_status(&pool, submission.id).await,
        SubmissionStatus::MecaExportSucceeded
    );
    assert!(mailer.subjects().is_empty());
}

#[tokio::test]
async fn unknown_submission_returns_not_found() {
    let pool = test_pool().await;
    let mailer = Arc::new(RecordingMailer::default());
    let app = test_app(&pool, mailer);

    let response = app
        .oneshot(callback_request(Uuid::new_v4(), "success"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "SUBMISSION_NOT_FOUND");
}
