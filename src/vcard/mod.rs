pub mod photo;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use clap::ValueEnum;
use thiserror::Error;
use tracing::warn;

use crate::parser::sections::RawEntry;
use crate::parser::ProfileRecord;
use photo::PhotoResolver;

/// Separator the source markup uses to join "Company · Employment type".
const ORG_SEPARATOR: char = '\u{B7}';

/// Which role the first experience field plays. Both orderings have shipped
/// in the targeted markup; pick the one matching the revision at hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum FieldOrder {
    /// `[title, organization, dates]` — unless the second field opens with a
    /// digit (a date range), in which case the entry is organization-first.
    #[default]
    TitleFirst,
    /// `[organization, title, dates]`, title falling back to the third field
    /// when the second is a date range.
    OrganizationFirst,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum PhotoMode {
    /// Reference the photo by URL.
    #[default]
    Uri,
    /// Fetch the photo and embed it base64-encoded.
    Inline,
    /// No photo field.
    Omit,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CardOptions {
    pub field_order: FieldOrder,
    pub photo_mode: PhotoMode,
}

/// The serialized card plus its suggested filename. Write-once; handed
/// straight to file delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct CardDocument {
    pub filename: String,
    pub content: String,
}

impl CardDocument {
    pub fn bytes(&self) -> &[u8] {
        self.content.as_bytes()
    }
}

#[derive(Debug, Error)]
pub enum CardError {
    #[error("profile record has no name; nothing to build a card from")]
    MissingName,
}

enum PhotoField {
    Uri(String),
    Inline { kind: String, data: String },
}

/// Build the vCard for a record. The one suspension point is the optional
/// photo resolution; a failed resolution drops the photo field and the build
/// proceeds. Identical input produces byte-identical output.
pub async fn build_card(
    record: &ProfileRecord,
    source_url: &str,
    options: &CardOptions,
    resolver: &dyn PhotoResolver,
) -> Result<CardDocument, CardError> {
    let name = record
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or(CardError::MissingName)?;

    let photo = resolve_photo(record.photo_ref.as_deref(), options.photo_mode, resolver).await;
    Ok(render_card(name, record, source_url, options.field_order, photo))
}

async fn resolve_photo(
    photo_ref: Option<&str>,
    mode: PhotoMode,
    resolver: &dyn PhotoResolver,
) -> Option<PhotoField> {
    let url = photo_ref?;
    match mode {
        PhotoMode::Omit => None,
        PhotoMode::Uri => Some(PhotoField::Uri(url.to_string())),
        PhotoMode::Inline => match resolver.resolve(url).await {
            Ok(resolved) => Some(PhotoField::Inline {
                kind: photo_type(&resolved.mime),
                data: BASE64_STANDARD.encode(&resolved.bytes),
            }),
            Err(e) => {
                warn!("Photo resolution failed for {}: {:#}", url, e);
                None
            }
        },
    }
}

/// Pure assembly of resolved inputs, in fixed field order.
fn render_card(
    name: &str,
    record: &ProfileRecord,
    source_url: &str,
    order: FieldOrder,
    photo: Option<PhotoField>,
) -> CardDocument {
    let (given, family) = split_name(name);
    let (organization, title) = infer_org_title(record.experience.first(), order);
    let note = escape_newlines(&assemble_note(record));

    let mut lines = vec!["BEGIN:VCARD".to_string(), "VERSION:3.0".to_string()];
    lines.push(format!("FN:{}", name));
    lines.push(format!("N:{};{};;;", family, given));
    match photo {
        Some(PhotoField::Uri(url)) => lines.push(format!("PHOTO;VALUE=URI:{}", url)),
        Some(PhotoField::Inline { kind, data }) => {
            lines.push(format!("PHOTO;ENCODING=b;TYPE={}:{}", kind, data))
        }
        None => {}
    }
    if !organization.is_empty() {
        lines.push(format!("ORG:{}", organization));
    }
    if !title.is_empty() {
        lines.push(format!("TITLE:{}", title));
    }
    lines.push(format!("NOTE:{}", note));
    lines.push(format!("URL:{}", source_url));
    lines.push("END:VCARD".to_string());

    CardDocument {
        filename: card_filename(name),
        content: lines.join("\n"),
    }
}

/// First token → given name, last token → family name; middle tokens stay in
/// the full-name field only. A single token is all given name.
pub fn split_name(full: &str) -> (String, String) {
    let tokens: Vec<&str> = full.split_whitespace().collect();
    match tokens.as_slice() {
        [] => (String::new(), String::new()),
        [only] => (only.to_string(), String::new()),
        [first, .., last] => (first.to_string(), last.to_string()),
    }
}

/// Positional heuristic over `experience[0]`. A second field opening with a
/// digit is a date range, which flips the mapping. Empty experience yields
/// empty strings for both.
pub fn infer_org_title(entry: Option<&RawEntry>, order: FieldOrder) -> (String, String) {
    let Some(entry) = entry else {
        return (String::new(), String::new());
    };
    let field = |i: usize| entry.get(i).map(String::as_str).unwrap_or("");
    let second_is_date = field(1).starts_with(|c: char| c.is_ascii_digit());

    let (organization, title) = match order {
        FieldOrder::TitleFirst => {
            if !field(1).is_empty() && !second_is_date {
                (field(1), field(0))
            } else {
                (field(0), field(2))
            }
        }
        FieldOrder::OrganizationFirst => {
            let title = if !field(1).is_empty() && !second_is_date {
                field(1)
            } else {
                field(2)
            };
            (field(0), title)
        }
    };

    (truncate_organization(organization), title.trim().to_string())
}

/// Keep only the text before the first `·`, trimmed.
fn truncate_organization(org: &str) -> String {
    match org.find(ORG_SEPARATOR) {
        Some(idx) => org[..idx].trim().to_string(),
        None => org.trim().to_string(),
    }
}

/// Fixed-header free-text block. Absent sections keep their header over an
/// empty body so the note layout is stable across profiles.
fn assemble_note(record: &ProfileRecord) -> String {
    format!(
        " -------- ABOUT: -------- \n{}\n\n \
         -------- EXPERIENCE: -------- \n{}\n\n \
         -------- EDUCATION: -------- \n{}\n\n \
         -------- LICENSES & CERTIFICATION: -------- \n{}",
        record.description.as_deref().unwrap_or(""),
        format_entries(&record.experience),
        format_entries(&record.education),
        format_entries(&record.licenses),
    )
}

/// Fragments joined by a line break, entries separated by a blank line.
fn format_entries(entries: &[RawEntry]) -> String {
    entries
        .iter()
        .map(|entry| entry.join("\n"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Line-folding rule of the target format: no unescaped newline may appear
/// inside a single field value.
pub fn escape_newlines(text: &str) -> String {
    text.replace('\n', "\\n")
}

fn card_filename(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
        .collect();
    format!("{}.vcf", safe)
}

fn photo_type(mime: &str) -> String {
    mime.rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_ascii_uppercase)
        .unwrap_or_else(|| "JPEG".to_string())
}

// ── Tests ──
