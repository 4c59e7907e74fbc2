//! Database initialization
//!
//! Opens (creating if necessary) the SQLite database and brings the schema
//! up to date. All DDL is idempotent; services call [`init_database`] at
//! startup and tests call [`create_tables`] against an in-memory pool.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    // WAL allows concurrent readers while the export pipeline writes status rows
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_tables(&pool).await?;

    Ok(pool)
}

/// Create all tables (idempotent). Exposed so tests can run against
/// `sqlite::memory:` pools.
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_submissions_table(pool).await?;
    create_files_table(pool).await?;
    create_audit_log_table(pool).await?;
    create_known_reviewers_table(pool).await?;
    Ok(())
}

/// Create the submissions table
///
/// Structured fields (author, subject areas, editor lists, reviewer
/// suggestions) are stored as JSON text; everything the export pipeline
/// filters or updates on is a plain column.
async fn create_submissions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS submissions (
            id TEXT PRIMARY KEY,
            article_type TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'INITIAL',
            title TEXT NOT NULL DEFAULT '',
            author TEXT NOT NULL DEFAULT '{}',
            cover_letter TEXT NOT NULL DEFAULT '',
            previously_discussed TEXT,
            subject_areas TEXT NOT NULL DEFAULT '[]',
            suggested_senior_editors TEXT NOT NULL DEFAULT '[]',
            opposed_senior_editors TEXT NOT NULL DEFAULT '[]',
            suggested_reviewing_editors TEXT NOT NULL DEFAULT '[]',
            opposed_reviewing_editors TEXT NOT NULL DEFAULT '[]',
            suggested_reviewers TEXT NOT NULL DEFAULT '[]',
            opposed_reviewers TEXT NOT NULL DEFAULT '[]',
            submitter_signature TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_submissions_status ON submissions(status)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the files table
///
/// One row per uploaded file. `storage_key` locates the bytes in the
/// content store; only rows in state STORED are exportable.
async fn create_files_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS files (
            id TEXT PRIMARY KEY,
            submission_id TEXT NOT NULL REFERENCES submissions(id) ON DELETE CASCADE,
            role TEXT NOT NULL CHECK (role IN ('MANUSCRIPT_SOURCE', 'MANUSCRIPT_SOURCE_PENDING', 'SUPPORTING_FILE')),
            state TEXT NOT NULL CHECK (state IN ('CREATED', 'UPLOADED', 'STORED', 'CANCELLED', 'DELETED')),
            filename TEXT NOT NULL,
            mime_type TEXT NOT NULL,
            size_bytes INTEGER NOT NULL DEFAULT 0,
            storage_key TEXT NOT NULL,
            created_at TEXT NOT NULL,
            CHECK (size_bytes >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_files_submission ON files(submission_id, role, state)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the audit_log table (append-only)
async fn create_audit_log_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS audit_log (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL DEFAULT 'SYSTEM',
            action TEXT NOT NULL,
            object_id TEXT NOT NULL,
            object_type TEXT NOT NULL,
            value TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_audit_log_object ON audit_log(object_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the known_reviewers table
///
/// Directory of reviewers the journal already works with; consulted when
/// rendering reviewer suggestions into article metadata.
async fn create_known_reviewers_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS known_reviewers (
            id TEXT PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
