//! File record queries
//!
//! Only rows in state STORED are visible to the export pipeline. Supporting
//! files come back in retrieval order (creation time, then id) so repeated
//! exports of the same submission produce identically ordered packages.

use chrono::DateTime;
use chrono::Utc;
use msub_common::models::{FileRecord, FileRole, FileState};
use msub_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Insert or replace a file row
pub async fn save_file(pool: &SqlitePool, file: &FileRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO files (
            id, submission_id, role, state, filename, mime_type,
            size_bytes, storage_key, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(file.id.to_string())
    .bind(file.submission_id.to_string())
    .bind(file.role.as_str())
    .bind(file.state.as_str())
    .bind(&file.filename)
    .bind(&file.mime_type)
    .bind(file.size_bytes)
    .bind(&file.storage_key)
    .bind(file.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Find the stored manuscript file for a submission, if any
pub async fn find_manuscript_file(
    pool: &SqlitePool,
    submission_id: Uuid,
) -> Result<Option<FileRecord>> {
    let row = sqlx::query(
        r#"
        SELECT id, submission_id, role, state, filename, mime_type,
               size_bytes, storage_key, created_at
        FROM files
        WHERE submission_id = ? AND role = 'MANUSCRIPT_SOURCE' AND state = 'STORED'
        LIMIT 1
        "#,
    )
    .bind(submission_id.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(row_to_file(&row)?)),
        None => Ok(None),
    }
}

/// All stored supporting files for a submission, in retrieval order
pub async fn get_supporting_files(
    pool: &SqlitePool,
    submission_id: Uuid,
) -> Result<Vec<FileRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT id, submission_id, role, state, filename, mime_type,
               size_bytes, storage_key, created_at
        FROM files
        WHERE submission_id = ? AND role = 'SUPPORTING_FILE' AND state = 'STORED'
        ORDER BY created_at, id
        "#,
    )
    .bind(submission_id.to_string())
    .fetch_all(pool)
    .await?;

    let mut files = Vec::with_capacity(rows.len());
    for row in &rows {
        files.push(row_to_file(row)?);
    }

    Ok(files)
}

fn row_to_file(row: &sqlx::sqlite::SqliteRow) -> Result<FileRecord> {
    let id_str: String = row.get("id");
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| Error::Internal(format!("bad file id {}: {}", id_str, e)))?;

    let submission_id_str: String = row.get("submission_id");
    let submission_id = Uuid::parse_str(&submission_id_str)
        .map_err(|e| Error::Internal(format!("bad submission id {}: {}", submission_id_str, e)))?;

    let role_str: String = row.get("role");
    let role = FileRole::parse(&role_str)?;

    let state_str: String = row.get("state");
    let state = FileState::parse(&state_str)?;

    let created_at_str: String = row.get("created_at");
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_at_str)
        .map_err(|e| Error::Internal(format!("bad timestamp {}: {}", created_at_str, e)))?
        .with_timezone(&Utc);

    Ok(FileRecord {
        id,
        submission_id,
        role,
        state,
        filename: row.get("filename"),
        mime_type: row.get("mime_type"),
        size_bytes: row.get("size_bytes"),
        storage_key: row.get("storage_key"),
        created_at,
    })
}
