//! Entry model: one fetched document, before change detection.
//!
//! Fetch adapters write raw entries in whatever shape their source speaks. `RawEntry`
//! accepts the normalized field names as well as the Federal Register document shape
//! (`document_number`, `html_url`, `publication_date`, `abstract`) and the feed shape
//! (`id`, `summary`, `updated`, `content`), then resolves into an [`Entry`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title used when a source omits one.
pub const UNTITLED: &str = "(no title)";

/// A normalized fetched document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Stable key for "the same document" across fetch cycles. Never empty once resolved.
    pub identity: String,
    pub title: String,
    pub link: Option<String>,
    pub published: Option<DateTime<Utc>>,
    /// Markup or plain text
    pub raw_body: String,
}

impl Entry {
    /// Create an entry; the identity is trimmed.
    pub fn new(
        identity: impl Into<String>,
        title: impl Into<String>,
        raw_body: impl Into<String>,
    ) -> Self {
        Self {
            identity: identity.into().trim().to_string(),
            title: title.into(),
            link: None,
            published: None,
            raw_body: raw_body.into(),
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_published(mut self, published: DateTime<Utc>) -> Self {
        self.published = Some(published);
        self
    }

    /// Identity as used for dedup and storage.
    pub fn canonical_identity(&self) -> &str {
        self.identity.trim()
    }

    /// Entries without an identity never reach the detector.
    pub fn has_identity(&self) -> bool {
        !self.canonical_identity().is_empty()
    }
}

/// Body field of feed entries: either a string or a list of `{value}` blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentField {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(default)]
    pub value: Option<String>,
}

impl ContentField {
    fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Blocks(blocks) => blocks.into_iter().next().and_then(|b| b.value),
        }
    }
}

/// An entry as written by a fetch adapter, before identity resolution.
///
/// Each spelling is its own field, so an entry may carry several of them. When more than
/// one is present, the normalized name wins, then the Federal Register one, then the feed
/// one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEntry {
    pub identity: Option<String>,
    pub document_number: Option<String>,
    pub id: Option<String>,

    pub title: Option<String>,

    pub link: Option<String>,
    pub html_url: Option<String>,

    pub published: Option<String>,
    pub publication_date: Option<String>,
    pub updated: Option<String>,

    pub raw_body: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub summary: Option<String>,
    pub content: Option<ContentField>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// First non-blank value, in order.
fn first_non_blank<const N: usize>(values: [Option<String>; N]) -> Option<String> {
    values.into_iter().find_map(non_blank)
}

impl RawEntry {
    /// Resolve into an [`Entry`], or `None` when neither an id nor a link is present.
    ///
    /// `now` stands in for a published value that is present but unparseable.
    pub fn resolve(self, now: DateTime<Utc>) -> Option<Entry> {
        let link = first_non_blank([self.link, self.html_url]);
        let identity = first_non_blank([self.identity, self.document_number, self.id])
            .or_else(|| link.clone())?;

        let title = non_blank(self.title).unwrap_or_else(|| UNTITLED.to_string());

        let published = first_non_blank([self.published, self.publication_date, self.updated])
            .map(|raw| parse_published(&raw).unwrap_or(now));

        let raw_body = self
            .content
            .and_then(ContentField::into_text)
            .or(self.raw_body)
            .or(self.abstract_text)
            .or(self.summary)
            .unwrap_or_default();

        Some(Entry {
            identity,
            title,
            link,
            published,
            raw_body,
        })
    }
}

/// Parse the timestamp shapes fetch sources actually emit.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_federal_register_shape() {
        let json = r#"{
            "document_number": "2026-00001",
            "title": "CY2026 Physician Fee Schedule (PFS) Final Rule",
            "publication_date": "2026-01-02",
            "html_url": "https://www.federalregister.gov/d/2026-00001",
            "abstract": "<p>Updates payment rates.</p>"
        }"#;
        let raw: RawEntry = serde_json::from_str(json).unwrap();
        let entry = raw.resolve(now()).unwrap();
        assert_eq!(entry.identity, "2026-00001");
        assert_eq!(entry.link.as_deref(), Some("https://www.federalregister.gov/d/2026-00001"));
        assert_eq!(
            entry.published,
            Some(Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap())
        );
        assert_eq!(entry.raw_body, "<p>Updates payment rates.</p>");
    }

    #[test]
    fn test_normalized_shape() {
        let json = r#"{
            "identity": " doc-7 ",
            "title": "Notice",
            "link": "https://example.gov/doc-7",
            "published": "2026-03-04T05:06:07Z",
            "raw_body": "plain body"
        }"#;
        let raw: RawEntry = serde_json::from_str(json).unwrap();
        let entry = raw.resolve(now()).unwrap();
        assert_eq!(entry.identity, "doc-7");
        assert_eq!(entry.raw_body, "plain body");
        assert!(entry.published.is_some());
    }

    #[test]
    fn test_identity_falls_back_to_link() {
        let raw = RawEntry {
            link: Some("https://example.gov/a".into()),
            ..RawEntry::default()
        };
        let entry = raw.resolve(now()).unwrap();
        assert_eq!(entry.identity, "https://example.gov/a");
        assert_eq!(entry.title, UNTITLED);
    }

    #[test]
    fn test_missing_identity_dropped() {
        let raw = RawEntry {
            id: Some("   ".into()),
            title: Some("orphan".into()),
            ..RawEntry::default()
        };
        assert!(raw.resolve(now()).is_none());
    }

    #[test]
    fn test_feed_content_preferred_over_summary() {
        let json = r#"{
            "id": "tag:feed,2026:1",
            "summary": "short",
            "content": [{"value": "<div>long body</div>"}],
            "updated": "Tue, 01 Sep 2026 10:00:00 +0000"
        }"#;
        let raw: RawEntry = serde_json::from_str(json).unwrap();
        let entry = raw.resolve(now()).unwrap();
        assert_eq!(entry.raw_body, "<div>long body</div>");
        assert_eq!(
            entry.published,
            Some(Utc.with_ymd_and_hms(2026, 9, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_unparseable_published_uses_now() {
        let raw = RawEntry {
            id: Some("x".into()),
            published: Some("sometime last week".into()),
            ..RawEntry::default()
        };
        assert_eq!(raw.resolve(now()).unwrap().published, Some(now()));
    }

    #[test]
    fn test_several_spellings_resolve_by_precedence() {
        let json = r#"{
            "id": "feed-id",
            "identity": "doc-9",
            "document_number": "2026-00009",
            "link": "https://example.gov/doc-9",
            "html_url": "https://www.federalregister.gov/d/2026-00009",
            "summary": "feed summary",
            "abstract": "register abstract"
        }"#;
        let raw: RawEntry = serde_json::from_str(json).unwrap();
        let entry = raw.resolve(now()).unwrap();
        assert_eq!(entry.identity, "doc-9");
        assert_eq!(entry.link.as_deref(), Some("https://example.gov/doc-9"));
        assert_eq!(entry.raw_body, "register abstract");
    }

    #[test]
    fn test_blank_preferred_spelling_falls_through() {
        let raw = RawEntry {
            identity: Some("  ".into()),
            id: Some("tag:feed,2026:2".into()),
            ..RawEntry::default()
        };
        assert_eq!(raw.resolve(now()).unwrap().identity, "tag:feed,2026:2");
    }

    #[test]
    fn test_parse_published_formats() {
        assert!(parse_published("2026-01-02").is_some());
        assert!(parse_published("2026-01-02 03:04").is_some());
        assert!(parse_published("2026-01-02 03:04:05").is_some());
        assert!(parse_published("2026-01-02T03:04:05+02:00").is_some());
        assert!(parse_published("not a date").is_none());
    }
}
