//! Import-result reconciliation
//!
//! After a package is delivered, the downstream editorial system processes
//! it and reports the outcome later through a callback. This module turns
//! that callback into a durable status transition.
//!
//! Failure handling is deliberately asymmetric: the audit write is
//! best-effort (logged, never propagated), while a failed status write is
//! the one fatal condition and surfaces as
//! [`ExportError::UnableToUpdateManuscript`] so the external caller can
//! retry or alert.

use msub_common::models::{AuditAction, AuditLogEntry, SubmissionStatus};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db;
use crate::error::ExportError;
use crate::services::mailer::MailSender;

/// Subject prefix for import-failure notifications
const FAILURE_SUBJECT_PREFIX: &str = "MECA import failed";

/// Accepts exactly the two literal outcome tokens.
///
/// Callers must reject anything else before invoking [`store_result`].
pub fn validate_response(response: &str) -> bool {
    matches!(response, "success" | "failure")
}

/// Record an import outcome for a submission.
///
/// Writes an audit entry (best-effort), advances the status machine to
/// `MECA_IMPORT_SUCCEEDED` or `MECA_IMPORT_FAILED`, and on a failed import
/// notifies the configured recipient. Returns the status that was written.
pub async fn store_result(
    pool: &SqlitePool,
    mailer: &dyn MailSender,
    failure_recipient: &str,
    submission_id: Uuid,
    response: &str,
) -> Result<SubmissionStatus, ExportError> {
    let target_status = match response {
        "success" => SubmissionStatus::MecaImportSucceeded,
        "failure" => SubmissionStatus::MecaImportFailed,
        other => {
            return Err(msub_common::Error::InvalidInput(format!(
                "unexpected import response: {}",
                other
            ))
            .into());
        }
    };

    // Best-effort audit of the raw response; never blocks the transition
    let entry = AuditLogEntry::system(
        AuditAction::Updated,
        &submission_id.to_string(),
        "submission.status",
        response,
    );
    if let Err(e) = db::audit::record_audit(pool, &entry).await {
        warn!(submission_id = %submission_id, "Audit write failed: {}", e);
    }

    let submission = db::submissions::load_submission(pool, submission_id)
        .await?
        .ok_or_else(|| ExportError::SubmissionNotFound(submission_id.to_string()))?;

    let touched = db::submissions::update_status(pool, submission.id, target_status)
        .await
        .map_err(|e| {
            warn!(submission_id = %submission_id, "Status write failed: {}", e);
            ExportError::UnableToUpdateManuscript(submission_id.to_string())
        })?;
    if touched == 0 {
        return Err(ExportError::UnableToUpdateManuscript(
            submission_id.to_string(),
        ));
    }

    info!(
        submission_id = %submission_id,
        status = target_status.as_str(),
        "Import result recorded"
    );

    if target_status == SubmissionStatus::MecaImportFailed {
        notify_import_failure(mailer, failure_recipient, submission_id, response).await;
    }

    Ok(target_status)
}

/// Email the configured recipient about a failed import. Mail problems are
/// logged, never propagated.
async fn notify_import_failure(
    mailer: &dyn MailSender,
    recipient: &str,
    submission_id: Uuid,
    response: &str,
) {
    let subject = format!("{}: {}", FAILURE_SUBJECT_PREFIX, submission_id);
    let text = format!(
        "The downstream system reported a failed import for submission {}.\n\nRaw response: {}\n",
        submission_id, response
    );
    let html = format!(
        "<p>The downstream system reported a failed import for submission <b>{}</b>.</p><p>Raw response: {}</p>",
        submission_id, response
    );

    match mailer
        .send_email(&text, &html, &subject, &[recipient.to_string()])
        .await
    {
        Ok(true) => info!(submission_id = %submission_id, "Import failure notification sent"),
        Ok(false) => info!(submission_id = %submission_id, "Outbound mail disabled, notification skipped"),
        Err(e) => warn!(submission_id = %submission_id, "Import failure notification failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mailer::MailError;
    use async_trait::async_trait;
    use msub_common::models::{ArticleType, Submission};
    use std::sync::Mutex;

    struct RecordingMailer {
        sent: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingMailer {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn subjects(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MailSender for RecordingMailer {
        async fn send_email(
            &self,
            _text: &str,
            _html: &str,
            subject: &str,
            _to: &[String],
        ) -> Result<bool, MailError> {
            if self.fail {
                return Err(MailError::Network("relay unreachable".to_string()));
            }
            self.sent.lock().unwrap().push(subject.to_string());
            Ok(true)
        }
    }

    async fn pool_with_submission() -> (SqlitePool, Submission) {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        msub_common::db::create_tables(&pool).await.unwrap();

        let mut submission = Submission::new(ArticleType::ResearchArticle);
        submission.status = SubmissionStatus::MecaExportSucceeded;
        crate::db::submissions::save_submission(&pool, &submission)
            .await
            .unwrap();
        (pool, submission)
    }

    #[test]
    fn only_the_two_literals_validate() {
        assert!(validate_response("success"));
        assert!(validate_response("failure"));
        assert!(!validate_response(""));
        assert!(!validate_response("true"));
        assert!(!validate_response("1"));
        assert!(!validate_response("Success"));
        assert!(!validate_response("failure "));
    }

    #[tokio::test]
    async fn success_transitions_without_email() {
        let (pool, submission) = pool_with_submission().await;
        let mailer = RecordingMailer::new();

        let status = store_result(&pool, &mailer, "editorial@example.org", submission.id, "success")
            .await
            .unwrap();
        assert_eq!(status, SubmissionStatus::MecaImportSucceeded);

        let loaded = crate::db::submissions::load_submission(&pool, submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.status, SubmissionStatus::MecaImportSucceeded);
        assert!(mailer.subjects().is_empty());
    }

    #[tokio::test]
    async fn failure_transitions_and_sends_exactly_one_email() {
        let (pool, submission) = pool_with_submission().await;
        let mailer = RecordingMailer::new();

        let status = store_result(&pool, &mailer, "editorial@example.org", submission.id, "failure")
            .await
            .unwrap();
        assert_eq!(status, SubmissionStatus::MecaImportFailed);

        let subjects = mailer.subjects();
        assert_eq!(subjects.len(), 1);
        assert!(subjects[0].starts_with(FAILURE_SUBJECT_PREFIX));
        assert!(subjects[0].contains(&submission.id.to_string()));
    }

    #[tokio::test]
    async fn audit_failure_is_swallowed() {
        let (pool, submission) = pool_with_submission().await;
        sqlx::query("DROP TABLE audit_log").execute(&pool).await.unwrap();
        let mailer = RecordingMailer::new();

        let status = store_result(&pool, &mailer, "editorial@example.org", submission.id, "success")
            .await
            .unwrap();
        assert_eq!(status, SubmissionStatus::MecaImportSucceeded);
    }

    #[tokio::test]
    async fn missing_submission_is_named() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        msub_common::db::create_tables(&pool).await.unwrap();
        let mailer = RecordingMailer::new();
        let id = Uuid::new_v4();

        let err = store_result(&pool, &mailer, "editorial@example.org", id, "success")
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::SubmissionNotFound(ref s) if s == &id.to_string()));
    }

    #[tokio::test]
    async fn status_write_failure_is_fatal_and_names_the_id() {
        let (pool, submission) = pool_with_submission().await;
        sqlx::query(
            "CREATE TRIGGER block_status BEFORE UPDATE ON submissions \
             BEGIN SELECT RAISE(ABORT, 'locked'); END",
        )
        .execute(&pool)
        .await
        .unwrap();
        let mailer = RecordingMailer::new();

        let err = store_result(&pool, &mailer, "editorial@example.org", submission.id, "failure")
            .await
            .unwrap_err();
        match err {
            ExportError::UnableToUpdateManuscript(id) => {
                assert_eq!(id, submission.id.to_string());
            }
            other => panic!("unexpected error: {}", other),
        }
        // No status change, no email
        assert!(mailer.subjects().is_empty());
    }

    #[tokio::test]
    async fn mailer_failure_does_not_undo_the_transition() {
        let (pool, submission) = pool_with_submission().await;
        let mailer = RecordingMailer::failing();

        let status = store_result(&pool, &mailer, "editorial@example.org", submission.id, "failure")
            .await
            .unwrap();
        assert_eq!(status, SubmissionStatus::MecaImportFailed);
    }

    #[tokio::test]
    async fn unexpected_token_is_rejected() {
        let (pool, submission) = pool_with_submission().await;
        let mailer = RecordingMailer::new();

        let result = store_result(&pool, &mailer, "editorial@example.org", submission.id, "ok")
            .await;
        assert!(result.is_err());

        // Status untouched
        let loaded = crate::db::submissions::load_submission(&pool, submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.status, SubmissionStatus::MecaExportSucceeded);
    }
}
