//! Submission persistence
//!
//! The export pipeline reads whole submissions and writes only `status`.
//! Structured fields are stored as JSON text columns; the closed
//! vocabularies (article type, subject areas, status) are re-validated
//! when a row is decoded, so a corrupted row surfaces as an error instead
//! of leaking an unknown label into a package.

use chrono::{DateTime, Utc};
use msub_common::models::{
    ArticleType, Author, ReviewerSuggestion, SubjectArea, Submission, SubmissionStatus,
};
use msub_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Insert or replace a full submission row
pub async fn save_submission(pool: &SqlitePool, submission: &Submission) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO submissions (
            id, article_type, status, title, author, cover_letter,
            previously_discussed, subject_areas,
            suggested_senior_editors, opposed_senior_editors,
            suggested_reviewing_editors, opposed_reviewing_editors,
            suggested_reviewers, opposed_reviewers,
            submitter_signature, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(submission.id.to_string())
    .bind(submission.article_type.as_str())
    .bind(submission.status.as_str())
    .bind(&submission.title)
    .bind(serde_json::to_string(&submission.author).map_err(json_err)?)
    .bind(&submission.cover_letter)
    .bind(&submission.previously_discussed)
    .bind(serde_json::to_string(&submission.subject_areas).map_err(json_err)?)
    .bind(serde_json::to_string(&submission.suggested_senior_editors).map_err(json_err)?)
    .bind(serde_json::to_string(&submission.opposed_senior_editors).map_err(json_err)?)
    .bind(serde_json::to_string(&submission.suggested_reviewing_editors).map_err(json_err)?)
    .bind(serde_json::to_string(&submission.opposed_reviewing_editors).map_err(json_err)?)
    .bind(serde_json::to_string(&submission.suggested_reviewers).map_err(json_err)?)
    .bind(serde_json::to_string(&submission.opposed_reviewers).map_err(json_err)?)
    .bind(&submission.submitter_signature)
    .bind(submission.created_at.to_rfc3339())
    .bind(submission.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a submission by id
pub async fn load_submission(pool: &SqlitePool, id: Uuid) -> Result<Option<Submission>> {
    let row = sqlx::query(
        r#"
        SELECT id, article_type, status, title, author, cover_letter,
               previously_discussed, subject_areas,
               suggested_senior_editors, opposed_senior_editors,
               suggested_reviewing_editors, opposed_reviewing_editors,
               suggested_reviewers, opposed_reviewers,
               submitter_signature, created_at, updated_at
        FROM submissions
        WHERE id = ?
        "#,
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let id_str: String = row.get("id");
            let id = Uuid::parse_str(&id_str)
                .map_err(|e| Error::Internal(format!("bad submission id {}: {}", id_str, e)))?;

            let article_type_str: String = row.get("article_type");
            let article_type = ArticleType::parse(&article_type_str)?;

            let status_str: String = row.get("status");
            let status = SubmissionStatus::parse(&status_str)?;

            let author: Author = decode_json(&row, "author")?;
            let subject_areas: Vec<SubjectArea> = decode_json(&row, "subject_areas")?;
            let suggested_senior_editors: Vec<String> =
                decode_json(&row, "suggested_senior_editors")?;
            let opposed_senior_editors: Vec<String> = decode_json(&row, "opposed_senior_editors")?;
            let suggested_reviewing_editors: Vec<String> =
                decode_json(&row, "suggested_reviewing_editors")?;
            let opposed_reviewing_editors: Vec<String> =
                decode_json(&row, "opposed_reviewing_editors")?;
            let suggested_reviewers: Vec<ReviewerSuggestion> =
                decode_json(&row, "suggested_reviewers")?;
            let opposed_reviewers: Vec<ReviewerSuggestion> = decode_json(&row, "opposed_reviewers")?;

            Ok(Some(Submission {
                id,
                article_type,
                status,
                title: row.get("title"),
                author,
                cover_letter: row.get("cover_letter"),
                previously_discussed: row.get("previously_discussed"),
                subject_areas,
                suggested_senior_editors,
                opposed_senior_editors,
                suggested_reviewing_editors,
                opposed_reviewing_editors,
                suggested_reviewers,
                opposed_reviewers,
                submitter_signature: row.get("submitter_signature"),
                created_at: parse_timestamp(&row, "created_at")?,
                updated_at: parse_timestamp(&row, "updated_at")?,
            }))
        }
        None => Ok(None),
    }
}

/// Persist a new status for a submission.
///
/// Returns the number of rows touched; zero means the id is unknown and
/// the caller decides how to surface that.
pub async fn update_status(
    pool: &SqlitePool,
    id: Uuid,
    status: SubmissionStatus,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE submissions
        SET status = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(status.as_str())
    .bind(Utc::now().to_rfc3339())
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

fn decode_json<T: serde::de::DeserializeOwned>(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<T> {
    let raw: String = row.get(column);
    serde_json::from_str(&raw)
        .map_err(|e| Error::Internal(format!("bad JSON in column {}: {}", column, e)))
}

fn parse_timestamp(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<DateTime<Utc>> {
    let raw: String = row.get(column);
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("bad timestamp in column {}: {}", column, e)))
}

fn json_err(e: serde_json::Error) -> Error {
    Error::Internal(format!("JSON encode failed: {}", e))
}
