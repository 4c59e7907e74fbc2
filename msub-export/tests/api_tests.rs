//! HTTP surface tests for the export service
//!
//! Tests cover:
//! - Health endpoint identity and delivery-target count
//! - Export endpoint wiring: JSON response shape, error mapping,
//!   forwarded-address passthrough into the disclosure artifact

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use lopdf::{Document, Object};
use serde_json::Value;
use sqlx::SqlitePool;
use std::io::{Cursor, Read};
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt; // for `oneshot` method
use uuid::Uuid;
use zip::ZipArchive;

use async_trait::async_trait;
use msub_common::config::Config;
use msub_common::models::{
    ArticleType, Author, FileRecord, FileRole, FileState, Submission,
};
use msub_export::delivery::{DeliveryLocation, PackageStore, PackageWriter, TransportKind};
use msub_export::error::ExportError;
use msub_export::export::PackageAssembler;
use msub_export::services::mailer::{MailError, MailSender};
use msub_export::services::people_client::{PeopleError, Person, PersonLookup};
use msub_export::services::LocalFileStore;
use msub_export::{build_router, AppState};

// =============================================================================
// Test doubles
// =============================================================================

struct NullMailer;

#[async_trait]
impl MailSender for NullMailer {
    async fn send_email(
        &self,
        _text: &str,
        _html: &str,
        _subject: &str,
        _to: &[String],
    ) -> Result<bool, MailError> {
        Ok(false)
    }
}

struct NoPeople;

#[async_trait]
impl PersonLookup for NoPeople {
    async fn get_person(&self, id: &str) -> Result<Person, PeopleError> {
        Err(PeopleError::NotFound(id.to_string()))
    }
}

struct RecordingWriter {
    packages: Mutex<Vec<Vec<u8>>>,
}

impl RecordingWriter {
    fn new() -> Self {
        Self {
            packages: Mutex::new(Vec::new()),
        }
    }

    fn deliveries(&self) -> Vec<Vec<u8>> {
        self.packages.lock().unwrap().clone()
    }
}

#[async_trait]
impl PackageWriter for RecordingWriter {
    async fn write(
        &self,
        submission_id: &str,
        package: &[u8],
    ) -> Result<DeliveryLocation, ExportError> {
        self.packages.lock().unwrap().push(package.to_vec());
        Ok(DeliveryLocation {
            kind: TransportKind::S3,
            key: format!("recorded/{}-meca.zip", submission_id),
            submission_id: submission_id.to_string(),
        })
    }
}

// =============================================================================
// Fixtures
// =============================================================================

struct TestService {
    app: axum::Router,
    pool: SqlitePool,
    writer: Arc<RecordingWriter>,
    _uploads: tempfile::TempDir,
}

async fn test_service() -> TestService {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    msub_common::db::create_tables(&pool).await.unwrap();

    let uploads = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.transfer.secret = "api-test-secret".to_string();
    config.uploads.dir = uploads.path().to_path_buf();

    let assembler = Arc::new(PackageAssembler::new(
        pool.clone(),
        Arc::new(LocalFileStore::new(uploads.path())),
        Arc::new(NoPeople),
        config.transfer.clone(),
    ));
    let writer = Arc::new(RecordingWriter::new());
    let store = Arc::new(PackageStore::new(vec![writer.clone()]));
    let state = AppState::new(
        pool.clone(),
        Arc::new(config),
        assembler,
        store,
        Arc::new(NullMailer),
    );

    TestService {
        app: build_router(state),
        pool,
        writer,
        _uploads: uploads,
    }
}

async fn seed_submission(service: &TestService, with_manuscript: bool) -> Submission {
    let mut submission = Submission::new(ArticleType::ResearchArticle);
    submission.title = "Thermal tolerance of reef-building corals".to_string();
    submission.author = Author {
        first_name: "Eugenie".to_string(),
        last_name: "Clark".to_string(),
        email: "eugenie@example.org".to_string(),
        institution: "Mote Marine Laboratory".to_string(),
    };
    submission.cover_letter = "Dear editors, please consider our work.".to_string();
    submission.submitter_signature = "E. Clark".to_string();
    msub_export::db::submissions::save_submission(&service.pool, &submission)
        .await
        .unwrap();

    if with_manuscript {
        let mut record = FileRecord::new(
            submission.id,
            FileRole::ManuscriptSource,
            "corals.docx",
            "application/msword",
        );
        record.state = FileState::Stored;
        record.size_bytes = 15;
        record.created_at = Utc::now() - Duration::seconds(30);

        let path = service._uploads.path().join(&record.storage_key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"manuscript body").unwrap();
        msub_export::db::files::save_file(&service.pool, &record)
            .await
            .unwrap();
    }

    submission
}

fn export_request(submission_id: Uuid, forwarded_for: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(format!("/api/submissions/{}/export", submission_id));
    if let Some(addr) = forwarded_for {
        builder = builder.header("x-forwarded-for", addr);
    }
    builder.body(Body::empty()).unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// All decompressed content streams of a PDF, lossily decoded
fn stream_text(bytes: &[u8]) -> String {
    let doc = Document::load_mem(bytes).unwrap();
    let mut all = Vec::new();
    for (_, object) in doc.objects.iter() {
        if let Object::Stream(stream) = object {
            if let Ok(content) = stream.decompressed_content() {
                all.extend_from_slice(&content);
            }
        }
    }
    String::from_utf8_lossy(&all).into_owned()
}

fn read_entry(package: &[u8], index: usize) -> Vec<u8> {
    let mut archive = ZipArchive::new(Cursor::new(package.to_vec())).unwrap();
    let mut content = Vec::new();
    archive
        .by_index(index)
        .unwrap()
        .read_to_end(&mut content)
        .unwrap();
    content
}

// =============================================================================
// Health endpoint
// =============================================================================

#[tokio::test]
async fn health_reports_identity_and_delivery_targets() {
    let service = test_service().await;

    let response = service
        .app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "msub-export");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["delivery_targets"], 1);
    assert!(body["uptime_seconds"].is_number());
}

// =============================================================================
// Export endpoint
// =============================================================================

#[tokio::test]
async fn export_of_unknown_submission_returns_not_found() {
    let service = test_service().await;
    let missing = Uuid::new_v4();

    let response = service
        .app
        .oneshot(export_request(missing, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "SUBMISSION_NOT_FOUND");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains(&missing.to_string()));
}

#[tokio::test]
async fn export_without_manuscript_is_a_conflict() {
    let service = test_service().await;
    let submission = seed_submission(&service, false).await;

    let response = service
        .app
        .clone()
        .oneshot(export_request(submission.id, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "NO_MANUSCRIPT_FILE");
    assert!(service.writer.deliveries().is_empty());
}

#[tokio::test]
async fn export_reports_locations_and_stamps_the_forwarded_address() {
    let service = test_service().await;
    let submission = seed_submission(&service, true).await;

    let response = service
        .app
        .clone()
        .oneshot(export_request(
            submission.id,
            Some("203.0.113.77, 10.1.1.1"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["submission_id"], submission.id.to_string());
    assert_eq!(body["status"], "MECA_EXPORT_SUCCEEDED");
    assert_eq!(body["locations"].as_array().unwrap().len(), 1);
    assert_eq!(body["locations"][0]["kind"], "S3");
    assert!(body["locations"][0]["key"]
        .as_str()
        .unwrap()
        .contains(&submission.id.to_string()));

    // The disclosure artifact carries the first forwarding hop
    let packages = service.writer.deliveries();
    assert_eq!(packages.len(), 1);
    let disclosure = read_entry(&packages[0], 2);
    let content = stream_text(&disclosure);
    assert!(content.contains("203.0.113.77"));
    assert!(!content.contains("10.1.1.1"));
}
