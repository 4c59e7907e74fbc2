//! Append-only audit trail entries
//!
//! Audit writes are best-effort everywhere in the export pipeline: a failure
//! to record one is logged by the caller and never propagated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened to the audited object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Created,
    Updated,
    Exported,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Created => "CREATED",
            AuditAction::Updated => "UPDATED",
            AuditAction::Exported => "EXPORTED",
        }
    }
}

/// One audit trail row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    /// Acting user; `None` means the platform itself (recorded as SYSTEM)
    pub user_id: Option<Uuid>,
    pub action: AuditAction,
    pub object_id: String,
    pub object_type: String,
    /// Free-form detail (raw callback response, delivery location, ...)
    pub value: String,
    pub created_at: DateTime<Utc>,
}

impl AuditLogEntry {
    /// Entry attributed to the platform rather than a user
    pub fn system(action: AuditAction, object_id: &str, object_type: &str, value: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: None,
            action,
            object_id: object_id.to_string(),
            object_type: object_type.to_string(),
            value: value.to_string(),
            created_at: Utc::now(),
        }
    }

    /// Entry attributed to a user
    pub fn user(
        user_id: Uuid,
        action: AuditAction,
        object_id: &str,
        object_type: &str,
        value: &str,
    ) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::system(action, object_id, object_type, value)
        }
    }

    /// Stored form of the actor column
    pub fn actor(&self) -> String {
        match self.user_id {
            Some(id) => id.to_string(),
            None => "SYSTEM".to_string(),
        }
    }
}
