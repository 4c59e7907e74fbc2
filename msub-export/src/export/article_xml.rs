//! Article metadata XML generator
//!
//! Maps the submission's article type to its fixed deposit code, renders the
//! closed subject-area vocabulary, and lists every contributor: the author,
//! the suggested/opposed senior and reviewing editors, and the
//! suggested/opposed reviewers.
//!
//! Editor ids are resolved through the person directory exactly once per
//! distinct id. A failed lookup aborts generation with an error naming the
//! offending id; an editor is never silently omitted. Reviewer names are
//! additionally matched against the known-reviewer directory, but only to
//! enrich the entry; that lookup can fail without consequence.
//!
//! Affiliation strings are deduplicated into an indexed list and every
//! contributor references its affiliations by index.

use quick_xml::events::BytesStart;
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::warn;

use msub_common::models::{ReviewerSuggestion, Submission};

use crate::db;
use crate::error::ExportError;
use crate::export::xml::{document_writer, end, leaf, start, text, XmlWriter};
use crate::services::people_client::{Person, PersonLookup};

/// Deduplicated, insertion-ordered affiliation list
#[derive(Default)]
struct Affiliations {
    labels: Vec<String>,
}

impl Affiliations {
    fn index_of(&mut self, label: &str) -> usize {
        match self.labels.iter().position(|l| l == label) {
            Some(idx) => idx,
            None => {
                self.labels.push(label.to_string());
                self.labels.len() - 1
            }
        }
    }
}

/// Build the article metadata document for one submission.
pub async fn generate_article_xml(
    pool: &SqlitePool,
    people: &dyn PersonLookup,
    submission: &Submission,
) -> Result<Vec<u8>, ExportError> {
    // Resolve each distinct editor id once; failure names the id
    let mut editors: HashMap<String, Person> = HashMap::new();
    for id in submission.editor_ids() {
        let person = people
            .get_person(id)
            .await
            .map_err(|e| ExportError::EditorLookup {
                id: id.to_string(),
                reason: e.to_string(),
            })?;
        editors.insert(id.to_string(), person);
    }

    let mut affiliations = Affiliations::default();
    let mut writer = document_writer()?;

    let mut article = BytesStart::new("article");
    article.push_attribute(("article-type", submission.article_type.as_str()));
    let deposit_code = submission.article_type.deposit_code().to_string();
    article.push_attribute(("deposit-code", deposit_code.as_str()));
    start(&mut writer, article)?;

    start(&mut writer, BytesStart::new("title-group"))?;
    leaf(&mut writer, "article-title", &submission.title)?;
    end(&mut writer, "title-group")?;

    start(&mut writer, BytesStart::new("subject-areas"))?;
    for area in &submission.subject_areas {
        leaf(&mut writer, "subject-area", area.label())?;
    }
    end(&mut writer, "subject-areas")?;

    if let Some(discussed) = &submission.previously_discussed {
        leaf(&mut writer, "previously-discussed", discussed)?;
    }

    start(&mut writer, BytesStart::new("contrib-group"))?;

    // Author
    let author_affs = if submission.author.institution.is_empty() {
        Vec::new()
    } else {
        vec![affiliations.index_of(&submission.author.institution)]
    };
    write_contrib(
        &mut writer,
        "author",
        &submission.author.full_name(),
        Some(&submission.author.email),
        &author_affs,
        None,
    )?;

    // Editors, in the order the submission lists them
    let editor_groups = [
        ("suggested-senior-editor", &submission.suggested_senior_editors),
        ("opposed-senior-editor", &submission.opposed_senior_editors),
        (
            "suggested-reviewing-editor",
            &submission.suggested_reviewing_editors,
        ),
        (
            "opposed-reviewing-editor",
            &submission.opposed_reviewing_editors,
        ),
    ];
    for (contrib_type, ids) in editor_groups {
        for id in ids {
            // Resolved above for every id in editor_ids()
            let person = editors.get(id).ok_or_else(|| ExportError::EditorLookup {
                id: id.clone(),
                reason: "not resolved".to_string(),
            })?;
            let refs: Vec<usize> = person
                .affiliations
                .iter()
                .map(|a| affiliations.index_of(a))
                .collect();
            write_contrib(
                &mut writer,
                contrib_type,
                &person.name,
                person.email.as_deref(),
                &refs,
                None,
            )?;
        }
    }

    // Reviewers, annotated with a directory id when the name is known
    for (contrib_type, reviewers) in [
        ("suggested-reviewer", &submission.suggested_reviewers),
        ("opposed-reviewer", &submission.opposed_reviewers),
    ] {
        for reviewer in reviewers {
            let known_id = lookup_known_reviewer(pool, reviewer).await;
            write_contrib(
                &mut writer,
                contrib_type,
                &reviewer.name,
                Some(&reviewer.email),
                &[],
                known_id.as_deref(),
            )?;
        }
    }

    end(&mut writer, "contrib-group")?;

    start(&mut writer, BytesStart::new("aff-group"))?;
    for (idx, label) in affiliations.labels.iter().enumerate() {
        let mut aff = BytesStart::new("aff");
        let id = format!("aff{}", idx);
        aff.push_attribute(("id", id.as_str()));
        start(&mut writer, aff)?;
        text(&mut writer, label)?;
        end(&mut writer, "aff")?;
    }
    end(&mut writer, "aff-group")?;

    end(&mut writer, "article")?;

    Ok(writer.into_inner())
}

/// Best-effort directory match; errors only downgrade the annotation.
async fn lookup_known_reviewer(pool: &SqlitePool, reviewer: &ReviewerSuggestion) -> Option<String> {
    match db::reviewers::find_reviewer_by_name(pool, &reviewer.name).await {
        Ok(found) => found.map(|r| r.id),
        Err(e) => {
            warn!(reviewer = %reviewer.name, "Reviewer directory lookup failed: {}", e);
            None
        }
    }
}

fn write_contrib(
    writer: &mut XmlWriter,
    contrib_type: &str,
    name: &str,
    email: Option<&str>,
    aff_refs: &[usize],
    directory_id: Option<&str>,
) -> Result<(), ExportError> {
    let mut contrib = BytesStart::new("contrib");
    contrib.push_attribute(("contrib-type", contrib_type));
    if !aff_refs.is_empty() {
        let refs = aff_refs
            .iter()
            .map(|idx| format!("aff{}", idx))
            .collect::<Vec<_>>()
            .join(" ");
        contrib.push_attribute(("aff-ref", refs.as_str()));
    }
    if let Some(id) = directory_id {
        contrib.push_attribute(("directory-id", id));
    }
    start(writer, contrib)?;

    leaf(writer, "name", name)?;
    if let Some(email) = email {
        if !email.is_empty() {
            leaf(writer, "email", email)?;
        }
    }

    end(writer, "contrib")
}
