use std::sync::LazyLock;

use clap::ValueEnum;
use tracing::warn;

use crate::dom::{closest_ancestor, Node, PageQuery, Selector};

static LIST_ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li.artdeco-list__item").unwrap());

/// UI affordance labels rendered inside entries; never profile data.
const EXCLUDED_PHRASES: &[&str] = &["show all", "see more"];

/// Visible entries a collapsed section renders without further interaction.
pub const DEFAULT_MAX_ENTRIES: usize = 4;

/// Cleaned, ordered text fragments for one list item within a section.
pub type RawEntry = Vec<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Experience,
    Education,
    Licenses,
}

/// Identifies which named section to read and how many entries to keep.
#[derive(Debug, Clone)]
pub struct SectionQuery {
    pub kind: SectionKind,
    pub container: &'static str,
    pub max_entries: usize,
}

pub fn default_queries(max_entries: usize) -> Vec<SectionQuery> {
    vec![
        SectionQuery {
            kind: SectionKind::Experience,
            container: "div#experience",
            max_entries,
        },
        SectionQuery {
            kind: SectionKind::Education,
            container: "div#education",
            max_entries,
        },
        SectionQuery {
            kind: SectionKind::Licenses,
            container: "div#licenses_and_certifications",
            max_entries,
        },
    ]
}

/// How duplicated text fragments inside one entry are collapsed. The profile
/// markup this targets renders each visible label as an adjacent pair (a
/// visually-hidden copy next to the visible string); `Alternate` keeps every
/// second loggable fragment to recover one clean copy per field. Markup
/// without paired duplicates wants `KeepAll`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum DedupePolicy {
    #[default]
    Alternate,
    KeepAll,
}

/// Section results for one extraction pass, in extraction order.
#[derive(Debug, Clone, Default)]
pub struct ExtractedSections {
    pub experience: Vec<RawEntry>,
    pub education: Vec<RawEntry>,
    pub licenses: Vec<RawEntry>,
}

/// Run every query against the page. Absence at any level degrades to an
/// empty result; this never fails.
pub fn extract_sections(
    page: &impl PageQuery,
    queries: &[SectionQuery],
    policy: DedupePolicy,
) -> ExtractedSections {
    let mut out = ExtractedSections::default();
    for query in queries {
        let entries = extract_section(page, query, policy);
        match query.kind {
            SectionKind::Experience => out.experience = entries,
            SectionKind::Education => out.education = entries,
            SectionKind::Licenses => out.licenses = entries,
        }
    }
    out
}

/// Resolve one section query: container → enclosing `section` → list items.
/// Missing container or missing enclosing section yields an empty sequence,
/// not an error; profiles commonly omit sections.
pub fn extract_section(
    page: &impl PageQuery,
    query: &SectionQuery,
    policy: DedupePolicy,
) -> Vec<RawEntry> {
    let selector = match Selector::parse(query.container) {
        Ok(s) => s,
        Err(e) => {
            warn!("Bad container selector {:?}: {}", query.container, e);
            return Vec::new();
        }
    };
    let Some(path) = page.query(&selector) else {
        return Vec::new();
    };
    let Some(section) = closest_ancestor(&path, "section") else {
        return Vec::new();
    };

    page.query_all(&LIST_ITEM, section)
        .into_iter()
        .take(query.max_entries)
        .map(|item| extract_entry(item, policy))
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Depth-first walk of an entry's descendant text. Fragments containing an
/// excluded phrase are not counted; under `Alternate` only odd-indexed
/// loggable fragments survive.
pub fn extract_entry(item: &Node, policy: DedupePolicy) -> RawEntry {
    let mut kept = Vec::new();
    let mut loggable = 0usize;
    collect_fragments(item, policy, &mut loggable, &mut kept);
    kept
}

fn collect_fragments(
    node: &Node,
    policy: DedupePolicy,
    loggable: &mut usize,
    out: &mut Vec<String>,
) {
    match node {
        Node::Text(raw) => {
            let text = raw.trim();
            if text.is_empty() || !is_loggable(text) {
                return;
            }
            match policy {
                DedupePolicy::Alternate => {
                    if *loggable % 2 == 1 {
                        out.push(text.to_string());
                    }
                    *loggable += 1;
                }
                DedupePolicy::KeepAll => out.push(text.to_string()),
            }
        }
        Node::Element { children, .. } => {
            for child in children {
                collect_fragments(child, policy, loggable, out);
            }
        }
    }
}

fn is_loggable(text: &str) -> bool {
    let lower = text.to_lowercase();
    !EXCLUDED_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

// ── Tests ──
