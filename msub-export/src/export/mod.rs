//! MECA package assembly and export orchestration
//!
//! A package carries five generated artifacts plus the author's stored
//! files, in a fixed order:
//!
//! | position | entry            |
//! |----------|------------------|
//! | 0        | article.xml      |
//! | 1        | cover_letter.pdf |
//! | 2        | disclosure.pdf   |
//! | 3        | manifest.xml     |
//! | 4        | transfer.xml     |
//! | 5        | manuscript file  |
//! | 6..      | supporting files |
//!
//! The manifest is generated from the other entries and spliced in at its
//! fixed position afterwards, so it describes exactly what the archive
//! carries. Every entry name passes through the sanitizer with its final
//! archive position.

pub mod archive;
pub mod article_xml;
pub mod manifest_xml;
pub mod pdf;
pub mod sanitize;
pub mod transfer_xml;
mod xml;

use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use msub_common::config::TransferConfig;
use msub_common::models::{AuditAction, AuditLogEntry, FileRecord, Submission, SubmissionStatus};

use crate::db;
use crate::delivery::{DeliveryLocation, PackageStore};
use crate::error::ExportError;
use crate::export::sanitize::sanitize;
use crate::services::{FileContentStore, PersonLookup};

/// Artifacts preceding the author's files in every package
const ARTIFACT_COUNT: usize = 5;
/// Archive position of the manifest
const MANIFEST_POSITION: usize = 3;

/// What a package entry is; drives the manifest description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    ArticleXml,
    CoverLetterPdf,
    DisclosurePdf,
    ManifestXml,
    TransferXml,
    Manuscript,
    Supporting,
}

/// One named archive entry
#[derive(Debug, Clone)]
pub struct PackageEntry {
    pub name: String,
    pub kind: EntryKind,
    pub mime_type: String,
    pub content: Vec<u8>,
}

impl PackageEntry {
    /// `position` is the entry's final archive index; the name is sanitized
    /// against it here.
    pub fn new(
        name: &str,
        position: usize,
        kind: EntryKind,
        mime_type: &str,
        content: Vec<u8>,
    ) -> Self {
        Self {
            name: sanitize(name, position),
            kind,
            mime_type: mime_type.to_string(),
            content,
        }
    }

    fn from_file(record: &FileRecord, position: usize, kind: EntryKind, content: Vec<u8>) -> Self {
        Self::new(&record.filename, position, kind, &record.mime_type, content)
    }
}

/// Builds one deliverable package per submission
pub struct PackageAssembler {
    pool: SqlitePool,
    files: Arc<dyn FileContentStore>,
    people: Arc<dyn PersonLookup>,
    transfer: TransferConfig,
}

impl PackageAssembler {
    pub fn new(
        pool: SqlitePool,
        files: Arc<dyn FileContentStore>,
        people: Arc<dyn PersonLookup>,
        transfer: TransferConfig,
    ) -> Self {
        Self {
            pool,
            files,
            people,
            transfer,
        }
    }

    /// Assemble the full archive for one submission.
    ///
    /// Fails with [`ExportError::NoManuscriptFile`] before generating any
    /// artifact when the submission has no stored manuscript.
    pub async fn assemble(
        &self,
        submission: &Submission,
        client_ip: &str,
    ) -> Result<Vec<u8>, ExportError> {
        let entries = self.collect_entries(submission, client_ip).await?;
        archive::write_archive(&entries)
    }

    /// The ordered entry list with the manifest spliced in.
    pub(crate) async fn collect_entries(
        &self,
        submission: &Submission,
        client_ip: &str,
    ) -> Result<Vec<PackageEntry>, ExportError> {
        let manuscript = db::files::find_manuscript_file(&self.pool, submission.id)
            .await?
            .ok_or(ExportError::NoManuscriptFile)?;
        let supporting = db::files::get_supporting_files(&self.pool, submission.id).await?;

        let now = Utc::now();
        let mut entries = Vec::with_capacity(ARTIFACT_COUNT + 1 + supporting.len());
        entries.push(PackageEntry::new(
            "article.xml",
            0,
            EntryKind::ArticleXml,
            "application/xml",
            article_xml::generate_article_xml(&self.pool, self.people.as_ref(), submission).await?,
        ));
        entries.push(PackageEntry::new(
            "cover_letter.pdf",
            1,
            EntryKind::CoverLetterPdf,
            "application/pdf",
            pdf::cover_letter_pdf(submission)?,
        ));
        entries.push(PackageEntry::new(
            "disclosure.pdf",
            2,
            EntryKind::DisclosurePdf,
            "application/pdf",
            pdf::disclosure_pdf(submission, client_ip, now)?,
        ));
        // Manifest comes later; the transfer entry already carries its
        // post-splice position.
        entries.push(PackageEntry::new(
            "transfer.xml",
            MANIFEST_POSITION + 1,
            EntryKind::TransferXml,
            "application/xml",
            transfer_xml::generate_transfer_xml(&self.transfer, submission.id, now)?,
        ));

        let content = self.files.get_content(&manuscript).await?;
        entries.push(PackageEntry::from_file(
            &manuscript,
            ARTIFACT_COUNT,
            EntryKind::Manuscript,
            content,
        ));
        for (i, record) in supporting.iter().enumerate() {
            let content = self.files.get_content(record).await?;
            entries.push(PackageEntry::from_file(
                record,
                ARTIFACT_COUNT + 1 + i,
                EntryKind::Supporting,
                content,
            ));
        }

        let manifest = PackageEntry::new(
            "manifest.xml",
            MANIFEST_POSITION,
            EntryKind::ManifestXml,
            "application/xml",
            manifest_xml::generate_manifest(&entries)?,
        );
        entries.insert(MANIFEST_POSITION, manifest);

        Ok(entries)
    }
}

/// Result of a completed export
#[derive(Debug)]
pub struct ExportOutcome {
    pub status: SubmissionStatus,
    pub locations: Vec<DeliveryLocation>,
}

/// Drive one submission through assembly and delivery, keeping the durable
/// status in step.
///
/// The submission is marked pending before any work happens; every failure
/// after that point marks it failed (best-effort) and propagates the
/// original error.
pub async fn run_export(
    pool: &SqlitePool,
    assembler: &PackageAssembler,
    store: &PackageStore,
    submission_id: Uuid,
    client_ip: &str,
) -> Result<ExportOutcome, ExportError> {
    let submission = db::submissions::load_submission(pool, submission_id)
        .await?
        .ok_or_else(|| ExportError::SubmissionNotFound(submission_id.to_string()))?;

    db::submissions::update_status(pool, submission_id, SubmissionStatus::MecaExportPending)
        .await?;
    info!(submission_id = %submission_id, "Export started");

    match assemble_and_deliver(assembler, store, &submission, client_ip).await {
        Ok(locations) => {
            db::submissions::update_status(
                pool,
                submission_id,
                SubmissionStatus::MecaExportSucceeded,
            )
            .await?;
            record_export_audit(pool, submission_id, &locations).await;
            info!(
                submission_id = %submission_id,
                destinations = locations.len(),
                "Export succeeded"
            );
            Ok(ExportOutcome {
                status: SubmissionStatus::MecaExportSucceeded,
                locations,
            })
        }
        Err(e) => {
            error!(submission_id = %submission_id, "Export failed: {}", e);
            if let Err(mark) = db::submissions::update_status(
                pool,
                submission_id,
                SubmissionStatus::MecaExportFailed,
            )
            .await
            {
                warn!(submission_id = %submission_id, "Unable to record failed export: {}", mark);
            }
            Err(e)
        }
    }
}

async fn assemble_and_deliver(
    assembler: &PackageAssembler,
    store: &PackageStore,
    submission: &Submission,
    client_ip: &str,
) -> Result<Vec<DeliveryLocation>, ExportError> {
    if store.is_empty() {
        return Err(ExportError::NoDeliveryTargets);
    }
    let package = assembler.assemble(submission, client_ip).await?;
    store.deliver(&submission.id.to_string(), &package).await
}

/// Best-effort audit trail; a failed write never fails the export.
async fn record_export_audit(
    pool: &SqlitePool,
    submission_id: Uuid,
    locations: &[DeliveryLocation],
) {
    let value = serde_json::to_string(locations).unwrap_or_default();
    let entry = AuditLogEntry::system(
        AuditAction::Exported,
        &submission_id.to_string(),
        "submission.package",
        &value,
    );
    if let Err(e) = db::audit::record_audit(pool, &entry).await {
        warn!(submission_id = %submission_id, "Audit write failed: {}", e);
    }
}
