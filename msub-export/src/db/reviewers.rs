//! Known-reviewer directory
//!
//! Reviewer suggestions in article metadata get annotated with the id of a
//! matching directory entry when one exists. Lookups here are best-effort;
//! the article generator ignores failures.

use msub_common::Result;
use sqlx::{Row, SqlitePool};

/// One directory row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownReviewer {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Insert or replace a directory entry
pub async fn save_reviewer(pool: &SqlitePool, reviewer: &KnownReviewer) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO known_reviewers (id, first_name, last_name, email)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&reviewer.id)
    .bind(&reviewer.first_name)
    .bind(&reviewer.last_name)
    .bind(&reviewer.email)
    .execute(pool)
    .await?;

    Ok(())
}

/// Case-insensitive match on "first last"
pub async fn find_reviewer_by_name(
    pool: &SqlitePool,
    full_name: &str,
) -> Result<Option<KnownReviewer>> {
    let row = sqlx::query(
        r#"
        SELECT id, first_name, last_name, email
        FROM known_reviewers
        WHERE lower(first_name || ' ' || last_name) = lower(?)
        LIMIT 1
        "#,
    )
    .bind(full_name.trim())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| KnownReviewer {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
    }))
}
