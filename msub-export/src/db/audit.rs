//! Audit trail persistence
//!
//! Callers in this pipeline treat audit failures as non-fatal: log and move
//! on. The write itself still returns a Result so that decision stays with
//! the caller.

use chrono::{DateTime, Utc};
use msub_common::models::{AuditAction, AuditLogEntry};
use msub_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Append one audit entry
pub async fn record_audit(pool: &SqlitePool, entry: &AuditLogEntry) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_log (id, user_id, action, object_id, object_type, value, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.id.to_string())
    .bind(entry.actor())
    .bind(entry.action.as_str())
    .bind(&entry.object_id)
    .bind(&entry.object_type)
    .bind(&entry.value)
    .bind(entry.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// All audit entries for an object, oldest first
pub async fn audit_for_object(pool: &SqlitePool, object_id: &str) -> Result<Vec<AuditLogEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, action, object_id, object_type, value, created_at
        FROM audit_log
        WHERE object_id = ?
        ORDER BY created_at, id
        "#,
    )
    .bind(object_id)
    .fetch_all(pool)
    .await?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in &rows {
        let id_str: String = row.get("id");
        let id = Uuid::parse_str(&id_str)
            .map_err(|e| Error::Internal(format!("bad audit id {}: {}", id_str, e)))?;

        let actor: String = row.get("user_id");
        let user_id = if actor == "SYSTEM" {
            None
        } else {
            Some(
                Uuid::parse_str(&actor)
                    .map_err(|e| Error::Internal(format!("bad audit actor {}: {}", actor, e)))?,
            )
        };

        let action_str: String = row.get("action");
        let action = match action_str.as_str() {
            "CREATED" => AuditAction::Created,
            "UPDATED" => AuditAction::Updated,
            "EXPORTED" => AuditAction::Exported,
            other => {
                return Err(Error::Internal(format!("unknown audit action: {}", other)));
            }
        };

        let created_at_str: String = row.get("created_at");
        let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|e| Error::Internal(format!("bad timestamp {}: {}", created_at_str, e)))?
            .with_timezone(&Utc);

        entries.push(AuditLogEntry {
            id,
            user_id,
            action,
            object_id: row.get("object_id"),
            object_type: row.get("object_type"),
            value: row.get("value"),
            created_at,
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn record_and_read_back() {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        msub_common::db::create_tables(&pool).await.unwrap();

        let entry = AuditLogEntry::system(
            AuditAction::Updated,
            "sub-1",
            "submission.status",
            "failure",
        );
        record_audit(&pool, &entry).await.unwrap();

        let entries = audit_for_object(&pool, "sub-1").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].value, "failure");
        assert!(entries[0].user_id.is_none());
    }
}
