//! Cover-letter and disclosure PDF generators
//!
//! Both documents share one fixed layout: a Helvetica title line followed by
//! word-wrapped body text, paginated onto A4 pages. Text is encoded as
//! WinAnsi; characters outside that range degrade to `?` rather than
//! producing an unreadable glyph. Empty submission fields still yield a
//! well-formed single-page document.

use chrono::{DateTime, SecondsFormat, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

use msub_common::models::Submission;

use crate::error::ExportError;

const FONT_SIZE: i64 = 11;
const TITLE_SIZE: i64 = 16;
const LEADING: i64 = 16;
const MARGIN: i64 = 56;
const PAGE_TOP: i64 = 780;
const LINES_PER_PAGE: usize = 44;
const WRAP_COLUMNS: usize = 88;

const DISCLOSURE_STATEMENT: &str = "Our submission system shares manuscript metadata and files \
with the journal's editorial platform. By signing below the submitting author confirms that all \
listed authors have approved this submission and agree to its transfer for peer review.";

/// Render the author's cover letter.
pub fn cover_letter_pdf(submission: &Submission) -> Result<Vec<u8>, ExportError> {
    let paragraphs: Vec<String> = submission
        .cover_letter
        .split('\n')
        .map(|p| p.trim_end().to_string())
        .collect();
    render_document("Cover Letter", &paragraphs)
}

/// Render the signed disclosure page recorded at export time.
pub fn disclosure_pdf(
    submission: &Submission,
    client_ip: &str,
    now: DateTime<Utc>,
) -> Result<Vec<u8>, ExportError> {
    let paragraphs = vec![
        format!("Manuscript: {}", submission.title),
        format!("Submitted by: {}", submission.author.full_name()),
        String::new(),
        DISCLOSURE_STATEMENT.to_string(),
        String::new(),
        format!("Signature: {}", submission.submitter_signature),
        format!(
            "Accepted: {}",
            now.to_rfc3339_opts(SecondsFormat::Secs, true)
        ),
        format!("Network address: {}", client_ip),
    ];
    render_document("Disclosure of Data Usage", &paragraphs)
}

fn render_document(title: &str, paragraphs: &[String]) -> Result<Vec<u8>, ExportError> {
    let lines: Vec<String> = paragraphs
        .iter()
        .flat_map(|p| wrap(p, WRAP_COLUMNS))
        .collect();

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut page_ids: Vec<Object> = Vec::new();
    for (index, page_lines) in pages(&lines).into_iter().enumerate() {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Td", vec![MARGIN.into(), PAGE_TOP.into()]),
            Operation::new("TL", vec![LEADING.into()]),
        ];
        if index == 0 {
            operations.push(Operation::new("Tf", vec!["F1".into(), TITLE_SIZE.into()]));
            operations.push(Operation::new("Tj", vec![pdf_text(title)]));
            operations.push(Operation::new("T*", vec![]));
            operations.push(Operation::new("T*", vec![]));
        }
        operations.push(Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]));
        for line in page_lines {
            operations.push(Operation::new("Tj", vec![pdf_text(line)]));
            operations.push(Operation::new("T*", vec![]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let encoded = content.encode().map_err(pdf_err)?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id.into());
    }

    let page_count = page_ids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(pdf_err)?;
    Ok(bytes)
}

/// Page slices; an empty document still gets one page.
fn pages(lines: &[String]) -> Vec<&[String]> {
    if lines.is_empty() {
        vec![&[]]
    } else {
        lines.chunks(LINES_PER_PAGE).collect()
    }
}

/// WinAnsi-encoded literal string; out-of-range characters become `?`.
fn pdf_text(text: &str) -> Object {
    let bytes = text
        .chars()
        .map(|c| if (c as u32) < 0x100 { c as u8 } else { b'?' })
        .collect::<Vec<u8>>();
    Object::String(bytes, StringFormat::Literal)
}

fn pdf_err(e: impl std::fmt::Display) -> ExportError {
    ExportError::Pdf(e.to_string())
}

/// Greedy word wrap; tokens longer than the column limit are hard-split.
fn wrap(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current_len > 0 && current_len + 1 + word_len > columns {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if word_len > columns {
            let mut chars: Vec<char> = word.chars().collect();
            while chars.len() > columns {
                lines.push(chars.drain(..columns).collect());
            }
            current = chars.into_iter().collect();
            current_len = current.chars().count();
        } else {
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(word);
            current_len += word_len;
        }
    }
    if current_len > 0 {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use msub_common::models::{ArticleType, Author};

    fn submission() -> Submission {
        let mut submission = Submission::new(ArticleType::ShortReport);
        submission.title = "Mapping calcium waves in zebrafish".to_string();
        submission.author = Author {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.org".to_string(),
            institution: "Analytical Engine Institute".to_string(),
        };
        submission.cover_letter = "Dear editors,\n\nPlease consider our manuscript.".to_string();
        submission.submitter_signature = "A. Lovelace".to_string();
        submission
    }

    fn stream_text(bytes: &[u8]) -> String {
        let doc = Document::load_mem(bytes).unwrap();
        let mut all = Vec::new();
        for (_, object) in doc.objects.iter() {
            if let Object::Stream(stream) = object {
                if let Ok(content) = stream.decompressed_content() {
                    all.extend_from_slice(&content);
                }
            }
        }
        String::from_utf8_lossy(&all).into_owned()
    }

    #[test]
    fn cover_letter_renders_title_and_body() {
        let bytes = cover_letter_pdf(&submission()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);

        let content = stream_text(&bytes);
        assert!(content.contains("Cover Letter"));
        assert!(content.contains("Dear editors,"));
        assert!(content.contains("Please consider our manuscript."));
    }

    #[test]
    fn long_cover_letter_paginates() {
        let mut submission = submission();
        submission.cover_letter = (0..120)
            .map(|i| format!("Paragraph {} of an unusually thorough letter.", i))
            .collect::<Vec<_>>()
            .join("\n");

        let bytes = cover_letter_pdf(&submission).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert!(doc.get_pages().len() >= 2);
    }

    #[test]
    fn disclosure_records_signature_timestamp_and_address() {
        let now = Utc::now();
        let bytes = disclosure_pdf(&submission(), "203.0.113.9", now).unwrap();
        let content = stream_text(&bytes);

        assert!(content.contains("Mapping calcium waves in zebrafish"));
        assert!(content.contains("Ada Lovelace"));
        assert!(content.contains("A. Lovelace"));
        assert!(content.contains("203.0.113.9"));
        assert!(content.contains(&now.to_rfc3339_opts(SecondsFormat::Secs, true)));
    }

    #[test]
    fn empty_fields_still_yield_a_wellformed_document() {
        let submission = Submission::new(ArticleType::Feature);
        let bytes = disclosure_pdf(&submission, "", Utc::now()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);

        let bytes = cover_letter_pdf(&submission).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }
}
