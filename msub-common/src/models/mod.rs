//! Domain models shared across MSUB services

pub mod audit;
pub mod file;
pub mod submission;

pub use audit::{AuditAction, AuditLogEntry};
pub use file::{FileRecord, FileRole, FileState};
pub use submission::{
    ArticleType, Author, ReviewerSuggestion, SubjectArea, Submission, SubmissionStatus,
};
