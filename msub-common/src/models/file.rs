//! File records attached to a submission
//!
//! A submission carries at most one manuscript-source file and any number of
//! supporting files. Only files that reached the STORED state are eligible
//! for export; everything else is in flight or discarded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Role a file plays within its submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileRole {
    /// The manuscript itself (at most one per submission)
    ManuscriptSource,
    /// Replacement manuscript still being processed
    ManuscriptSourcePending,
    /// Any additional material uploaded by the author
    SupportingFile,
}

impl FileRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileRole::ManuscriptSource => "MANUSCRIPT_SOURCE",
            FileRole::ManuscriptSourcePending => "MANUSCRIPT_SOURCE_PENDING",
            FileRole::SupportingFile => "SUPPORTING_FILE",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "MANUSCRIPT_SOURCE" => Ok(FileRole::ManuscriptSource),
            "MANUSCRIPT_SOURCE_PENDING" => Ok(FileRole::ManuscriptSourcePending),
            "SUPPORTING_FILE" => Ok(FileRole::SupportingFile),
            other => Err(Error::InvalidInput(format!("unknown file role: {other}"))),
        }
    }
}

/// Upload lifecycle state: CREATED → UPLOADED → STORED, or CANCELLED/DELETED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileState {
    Created,
    Uploaded,
    Stored,
    Cancelled,
    Deleted,
}

impl FileState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileState::Created => "CREATED",
            FileState::Uploaded => "UPLOADED",
            FileState::Stored => "STORED",
            FileState::Cancelled => "CANCELLED",
            FileState::Deleted => "DELETED",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "CREATED" => Ok(FileState::Created),
            "UPLOADED" => Ok(FileState::Uploaded),
            "STORED" => Ok(FileState::Stored),
            "CANCELLED" => Ok(FileState::Cancelled),
            "DELETED" => Ok(FileState::Deleted),
            other => Err(Error::InvalidInput(format!("unknown file state: {other}"))),
        }
    }

    /// Only STORED content may leave the platform
    pub fn is_exportable(&self) -> bool {
        matches!(self, FileState::Stored)
    }
}

/// One uploaded file belonging to a submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub role: FileRole,
    pub state: FileState,
    /// Original filename as uploaded (may contain anything)
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: i64,
    /// Location of the content within the upload store
    pub storage_key: String,
    pub created_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn new(submission_id: Uuid, role: FileRole, filename: &str, mime_type: &str) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            submission_id,
            role,
            state: FileState::Created,
            filename: filename.to_string(),
            mime_type: mime_type.to_string(),
            size_bytes: 0,
            storage_key: format!("{submission_id}/{id}"),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_and_state_round_trip() {
        for role in [
            FileRole::ManuscriptSource,
            FileRole::ManuscriptSourcePending,
            FileRole::SupportingFile,
        ] {
            assert_eq!(FileRole::parse(role.as_str()).unwrap(), role);
        }
        for state in [
            FileState::Created,
            FileState::Uploaded,
            FileState::Stored,
            FileState::Cancelled,
            FileState::Deleted,
        ] {
            assert_eq!(FileState::parse(state.as_str()).unwrap(), state);
        }
    }

    #[test]
    fn only_stored_files_are_exportable() {
        assert!(FileState::Stored.is_exportable());
        assert!(!FileState::Uploaded.is_exportable());
        assert!(!FileState::Cancelled.is_exportable());
    }

    #[test]
    fn new_record_derives_storage_key() {
        let submission_id = Uuid::new_v4();
        let record = FileRecord::new(
            submission_id,
            FileRole::SupportingFile,
            "figure1.tif",
            "image/tiff",
        );
        assert!(record.storage_key.starts_with(&submission_id.to_string()));
        assert_eq!(record.state, FileState::Created);
    }
}
