//! Submission model and export/import status state machine
//!
//! A submission progresses through six states:
//! INITIAL → MECA_EXPORT_PENDING → {MECA_EXPORT_SUCCEEDED, MECA_EXPORT_FAILED}
//! and, once the downstream system reports back,
//! → {MECA_IMPORT_SUCCEEDED, MECA_IMPORT_FAILED}.
//!
//! Transitions only move forward; the import states are terminal. The export
//! service writes the export states around delivery, the import-callback
//! handler writes the import states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Submission lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    /// Freshly created, never exported
    Initial,
    /// Export triggered, delivery in flight
    MecaExportPending,
    /// Package assembly or delivery failed
    MecaExportFailed,
    /// Package delivered to every configured transport
    MecaExportSucceeded,
    /// Downstream system rejected the package (terminal)
    MecaImportFailed,
    /// Downstream system accepted the package (terminal)
    MecaImportSucceeded,
}

impl SubmissionStatus {
    /// Stored string form (UPPER_SNAKE, matches the database column)
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Initial => "INITIAL",
            SubmissionStatus::MecaExportPending => "MECA_EXPORT_PENDING",
            SubmissionStatus::MecaExportFailed => "MECA_EXPORT_FAILED",
            SubmissionStatus::MecaExportSucceeded => "MECA_EXPORT_SUCCEEDED",
            SubmissionStatus::MecaImportFailed => "MECA_IMPORT_FAILED",
            SubmissionStatus::MecaImportSucceeded => "MECA_IMPORT_SUCCEEDED",
        }
    }

    /// Parse the stored string form
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "INITIAL" => Ok(SubmissionStatus::Initial),
            "MECA_EXPORT_PENDING" => Ok(SubmissionStatus::MecaExportPending),
            "MECA_EXPORT_FAILED" => Ok(SubmissionStatus::MecaExportFailed),
            "MECA_EXPORT_SUCCEEDED" => Ok(SubmissionStatus::MecaExportSucceeded),
            "MECA_IMPORT_FAILED" => Ok(SubmissionStatus::MecaImportFailed),
            "MECA_IMPORT_SUCCEEDED" => Ok(SubmissionStatus::MecaImportSucceeded),
            other => Err(Error::InvalidInput(format!(
                "unknown submission status: {other}"
            ))),
        }
    }

    /// Import states are terminal; nothing writes after them
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubmissionStatus::MecaImportFailed | SubmissionStatus::MecaImportSucceeded
        )
    }
}

/// Closed set of article types accepted by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArticleType {
    ResearchArticle,
    ShortReport,
    ToolsResources,
    ScientificCorrespondence,
    Feature,
}

impl ArticleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleType::ResearchArticle => "research-article",
            ArticleType::ShortReport => "short-report",
            ArticleType::ToolsResources => "tools-resources",
            ArticleType::ScientificCorrespondence => "scientific-correspondence",
            ArticleType::Feature => "feature",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "research-article" => Ok(ArticleType::ResearchArticle),
            "short-report" => Ok(ArticleType::ShortReport),
            "tools-resources" => Ok(ArticleType::ToolsResources),
            "scientific-correspondence" => Ok(ArticleType::ScientificCorrespondence),
            "feature" => Ok(ArticleType::Feature),
            other => Err(Error::InvalidInput(format!(
                "unknown article type: {other}"
            ))),
        }
    }

    /// Numeric article-type code used in the deposit XML
    pub fn deposit_code(&self) -> u32 {
        match self {
            ArticleType::ResearchArticle => 5,
            ArticleType::ShortReport => 13,
            ArticleType::ToolsResources => 18,
            ArticleType::ScientificCorrespondence => 20,
            ArticleType::Feature => 23,
        }
    }
}

/// Closed subject-area vocabulary; slugs are stored, labels are deposited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubjectArea {
    BiochemistryChemicalBiology,
    CancerBiology,
    CellBiology,
    ComputationalSystemsBiology,
    DevelopmentalBiology,
    Ecology,
    EpidemiologyGlobalHealth,
    GeneticsGenomics,
    ImmunologyInflammation,
    Medicine,
    MicrobiologyInfectiousDisease,
    Neuroscience,
    PhysicsLivingSystems,
    PlantBiology,
    StemCellsRegenerativeMedicine,
    StructuralBiologyMolecularBiophysics,
}

impl SubjectArea {
    /// Human-readable label used in generated metadata
    pub fn label(&self) -> &'static str {
        match self {
            SubjectArea::BiochemistryChemicalBiology => "Biochemistry and Chemical Biology",
            SubjectArea::CancerBiology => "Cancer Biology",
            SubjectArea::CellBiology => "Cell Biology",
            SubjectArea::ComputationalSystemsBiology => "Computational and Systems Biology",
            SubjectArea::DevelopmentalBiology => "Developmental Biology",
            SubjectArea::Ecology => "Ecology",
            SubjectArea::EpidemiologyGlobalHealth => "Epidemiology and Global Health",
            SubjectArea::GeneticsGenomics => "Genetics and Genomics",
            SubjectArea::ImmunologyInflammation => "Immunology and Inflammation",
            SubjectArea::Medicine => "Medicine",
            SubjectArea::MicrobiologyInfectiousDisease => "Microbiology and Infectious Disease",
            SubjectArea::Neuroscience => "Neuroscience",
            SubjectArea::PhysicsLivingSystems => "Physics of Living Systems",
            SubjectArea::PlantBiology => "Plant Biology",
            SubjectArea::StemCellsRegenerativeMedicine => "Stem Cells and Regenerative Medicine",
            SubjectArea::StructuralBiologyMolecularBiophysics => {
                "Structural Biology and Molecular Biophysics"
            }
        }
    }
}

/// Corresponding author details captured by the submission wizard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub institution: String,
}

impl Author {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// A reviewer suggested or opposed by the author (name + email, no account)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewerSuggestion {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// A manuscript submission
///
/// The export pipeline reads every field but writes only `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub article_type: ArticleType,
    pub status: SubmissionStatus,
    pub title: String,
    pub author: Author,
    pub cover_letter: String,
    pub previously_discussed: Option<String>,
    pub subject_areas: Vec<SubjectArea>,
    /// Person ids resolved through the people service during export
    pub suggested_senior_editors: Vec<String>,
    pub opposed_senior_editors: Vec<String>,
    pub suggested_reviewing_editors: Vec<String>,
    pub opposed_reviewing_editors: Vec<String>,
    pub suggested_reviewers: Vec<ReviewerSuggestion>,
    pub opposed_reviewers: Vec<ReviewerSuggestion>,
    pub submitter_signature: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    /// Create a fresh submission in the INITIAL state
    pub fn new(article_type: ArticleType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            article_type,
            status: SubmissionStatus::Initial,
            title: String::new(),
            author: Author::default(),
            cover_letter: String::new(),
            previously_discussed: None,
            subject_areas: Vec::new(),
            suggested_senior_editors: Vec::new(),
            opposed_senior_editors: Vec::new(),
            suggested_reviewing_editors: Vec::new(),
            opposed_reviewing_editors: Vec::new(),
            suggested_reviewers: Vec::new(),
            opposed_reviewers: Vec::new(),
            submitter_signature: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Distinct editor ids across all four editor lists, in first-seen order
    pub fn editor_ids(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for id in self
            .suggested_senior_editors
            .iter()
            .chain(self.opposed_senior_editors.iter())
            .chain(self.suggested_reviewing_editors.iter())
            .chain(self.opposed_reviewing_editors.iter())
        {
            if !seen.contains(&id.as_str()) {
                seen.push(id.as_str());
            }
        }
        seen
    }
}
