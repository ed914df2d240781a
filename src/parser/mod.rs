pub mod sections;

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::dom::{Document, PageQuery, Selector};
use sections::{default_queries, extract_sections, DedupePolicy, RawEntry};

static NAME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".text-heading-xlarge").unwrap());
static PHOTO: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".pv-top-card-profile-picture__image--show").unwrap());
static DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.text-body-medium.break-words").unwrap());

/// Everything one extraction pass recovers from a profile page. Plain data,
/// no live node references; round-trips as JSON between `extract` and `card`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub name: Option<String>,
    pub photo_ref: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub experience: Vec<RawEntry>,
    #[serde(default)]
    pub education: Vec<RawEntry>,
    #[serde(default)]
    pub licenses: Vec<RawEntry>,
}

/// Single pass over the page: top-card fields plus the named sections.
/// Absence of any piece degrades to `None`/empty; this never fails.
pub fn extract_profile(page: &Document, max_entries: usize, policy: DedupePolicy) -> ProfileRecord {
    let name = query_text(page, &NAME);
    let photo_ref = page
        .query(&PHOTO)
        .and_then(|path| path.last().and_then(|n| n.attr("src")).map(str::to_string));
    let description = query_text(page, &DESCRIPTION);

    let found = extract_sections(page, &default_queries(max_entries), policy);

    ProfileRecord {
        name,
        photo_ref,
        description,
        experience: found.experience,
        education: found.education,
        licenses: found.licenses,
    }
}

fn query_text(page: &Document, selector: &Selector) -> Option<String> {
    page.query(selector)
        .and_then(|path| path.last().map(|n| n.text_content()))
        .filter(|t| !t.is_empty())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use super::sections::DEFAULT_MAX_ENTRIES;

    fn fixture(name: &str) -> Document {
        let html = std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap();
        Document::parse(&html)
    }

    fn extract(doc: &Document) -> ProfileRecord {
        extract_profile(doc, DEFAULT_MAX_ENTRIES, DedupePolicy::Alternate)
    }

    #[test]
    fn janedoe_top_card() {
        let record = extract(&fixture("janedoe"));
        assert_eq!(record.name.as_deref(), Some("Jane Doe"));
        assert_eq!(
            record.photo_ref.as_deref(),
            Some("https://cdn.example.com/photos/janedoe.jpg")
        );
        assert_eq!(
            record.description.as_deref(),
            Some("Engineer. Builds data tooling.")
        );
    }

    #[test]
    fn janedoe_experience_entries() {
        let record = extract(&fixture("janedoe"));
        assert_eq!(
            record.experience,
            vec![
                vec![
                    "Senior Engineer".to_string(),
                    "Acme Corp · Full-time".to_string(),
                    "2019 - Present".to_string(),
                ],
                vec!["Engineer".to_string(), "Initech · Contract".to_string()],
            ]
        );
    }

    #[test]
    fn janedoe_education_entries() {
        let record = extract(&fixture("janedoe"));
        assert_eq!(
            record.education,
            vec![vec![
                "State University".to_string(),
                "BSc, Computer Science".to_string(),
            ]]
        );
    }

    #[test]
    fn janedoe_orphan_licenses_container_is_empty() {
        // The licenses container in the fixture has no enclosing <section>.
        let record = extract(&fixture("janedoe"));
        assert!(record.licenses.is_empty());
    }

    #[test]
    fn empty_page_degrades_to_default_record() {
        let record = extract(&Document::parse("<html><body></body></html>"));
        assert_eq!(record, ProfileRecord::default());
    }

    #[test]
    fn record_json_roundtrip() {
        let record = extract(&fixture("janedoe"));
        let json = serde_json::to_string(&record).unwrap();
        let back: ProfileRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
