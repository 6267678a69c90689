//! Best-effort decoding of deposit XML back into structured records.
//!
//! The reader never fails: malformed input produces an empty head and no
//! entries, and missing nodes produce empty strings.

use chrono::{DateTime, Utc};
use roxmltree::{Document, Node, ParsingOptions};
use serde::Serialize;

use crate::xml::{
    descendant_text, element_children, find_child, find_descendant, find_descendants, get_tag_name,
    text_content,
};

/// Containers whose children are read as entries.
const CONTAINERS: [&str; 3] = ["conference", "journal", "database"];

/// Depositor recovered from the head.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecodedDepositor {
    pub name: String,
    pub email: String,
}

/// The batch `<head>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecodedHead {
    pub id: String,
    /// `None` when the timestamp is missing or not an integer.
    pub timestamp: Option<DateTime<Utc>>,
    pub depositor: DecodedDepositor,
    pub registrant: String,
}

/// An author of a work, as `"<given> <surname>"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedAuthor {
    pub name: String,
}

/// A paper, article, posted content or dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub authors: Vec<DecodedAuthor>,
    pub doi: Option<String>,
    pub year: String,
    /// First and last page, when a `<pages>` block exists.
    pub pages: Option<[String; 2]>,
}

/// `<event_metadata>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub acronym: String,
    pub location: String,
    pub date: String,
    pub number: String,
}

/// `<proceedings_series_metadata>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub original_language_title: String,
    pub issn: String,
    pub publisher: String,
    pub doi: String,
    pub resource: String,
}

/// `<proceedings_metadata>` or `<journal_metadata>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub publisher: String,
    pub doi: String,
}

/// Anything else, kept as its source fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpaqueRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub xml: String,
}

/// One decoded body entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DecodedEntry {
    Work(WorkRecord),
    Event(EventRecord),
    Series(SeriesRecord),
    Container(ContainerRecord),
    Opaque(OpaqueRecord),
}

impl DecodedEntry {
    /// The tag name the entry was decoded from.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Work(record) => &record.kind,
            Self::Event(record) => &record.kind,
            Self::Series(record) => &record.kind,
            Self::Container(record) => &record.kind,
            Self::Opaque(record) => &record.kind,
        }
    }
}

/// Head and entries of a whole deposit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecodedDeposit {
    pub head: DecodedHead,
    pub entries: Vec<DecodedEntry>,
}

/// A parsed deposit document.
///
/// # Examples
/// ```
/// use crossref_deposit::reader::DepositReader;
///
/// let reader = DepositReader::new("<doi_batch><head><registrant>Crossref</registrant></head></doi_batch>");
/// assert_eq!(reader.head().registrant, "Crossref");
/// assert!(reader.entries().is_empty());
/// ```
pub struct DepositReader<'input> {
    doc: Option<Document<'input>>,
}

impl<'input> DepositReader<'input> {
    /// Parse `xml`. Parse failures are logged and leave the reader empty.
    #[must_use]
    pub fn new(xml: &'input str) -> Self {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let doc = match Document::parse_with_options(xml, options) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!(error = %e, "Could not parse deposit XML");
                None
            }
        };
        Self { doc }
    }

    /// Whether the input parsed as XML.
    #[must_use]
    pub fn is_parsed(&self) -> bool {
        self.doc.is_some()
    }

    /// Reconstruct the batch head.
    #[must_use]
    pub fn head(&self) -> DecodedHead {
        let Some(head) = self
            .doc
            .as_ref()
            .and_then(|doc| find_descendant(doc.root(), "head"))
        else {
            return DecodedHead::default();
        };

        let timestamp = descendant_text(head, "timestamp")
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0));

        DecodedHead {
            id: descendant_text(head, "doi_batch_id"),
            timestamp,
            depositor: DecodedDepositor {
                name: descendant_text(head, "depositor_name"),
                email: descendant_text(head, "email_address"),
            },
            registrant: descendant_text(head, "registrant"),
        }
    }

    /// Reconstruct the body entries in document order.
    ///
    /// Children of `conference`, `journal` and `database` containers are
    /// read as entries; other body children are entries themselves.
    #[must_use]
    pub fn entries(&self) -> Vec<DecodedEntry> {
        let Some(doc) = self.doc.as_ref() else {
            return Vec::new();
        };
        let Some(body) = find_descendant(doc.root(), "body") else {
            return Vec::new();
        };

        let mut entries = Vec::new();
        for child in element_children(body) {
            if CONTAINERS.contains(&get_tag_name(child)) {
                entries.extend(element_children(child).map(|entry| decode_entry(doc, entry)));
            } else {
                entries.push(decode_entry(doc, child));
            }
        }
        entries
    }

    /// Head and entries together.
    #[must_use]
    pub fn decode(&self) -> DecodedDeposit {
        DecodedDeposit {
            head: self.head(),
            entries: self.entries(),
        }
    }
}

fn decode_entry(doc: &Document<'_>, entry: Node<'_, '_>) -> DecodedEntry {
    let tag = get_tag_name(entry);
    let kind = tag.to_string();
    match tag {
        "conference_paper" | "journal_article" | "posted_content" | "dataset" => {
            DecodedEntry::Work(decode_work(kind, entry))
        }
        "event_metadata" => DecodedEntry::Event(EventRecord {
            name: descendant_text(entry, "conference_name"),
            acronym: descendant_text(entry, "conference_acronym"),
            location: descendant_text(entry, "conference_location"),
            date: descendant_text(entry, "conference_date"),
            number: descendant_text(entry, "conference_number"),
            kind,
        }),
        "proceedings_series_metadata" => DecodedEntry::Series(SeriesRecord {
            title: descendant_text(entry, "title"),
            original_language_title: descendant_text(entry, "original_language_title"),
            issn: descendant_text(entry, "issn"),
            publisher: descendant_text(entry, "publisher_name"),
            doi: descendant_text(entry, "doi"),
            resource: descendant_text(entry, "resource"),
            kind,
        }),
        "proceedings_metadata" => DecodedEntry::Container(ContainerRecord {
            title: descendant_text(entry, "proceedings_title"),
            publisher: descendant_text(entry, "publisher_name"),
            doi: descendant_text(entry, "doi"),
            kind,
        }),
        "journal_metadata" => DecodedEntry::Container(ContainerRecord {
            title: descendant_text(entry, "full_title"),
            publisher: descendant_text(entry, "publisher_name"),
            doi: descendant_text(entry, "doi"),
            kind,
        }),
        _ => DecodedEntry::Opaque(OpaqueRecord {
            xml: doc.input_text()[entry.range()].to_string(),
            kind,
        }),
    }
}

fn decode_work(kind: String, entry: Node<'_, '_>) -> WorkRecord {
    let authors = find_child(entry, "contributors")
        .map(|contributors| {
            find_descendants(contributors, "person_name")
                .map(|person| DecodedAuthor {
                    name: format!(
                        "{} {}",
                        descendant_text(person, "given_name"),
                        descendant_text(person, "surname")
                    ),
                })
                .collect()
        })
        .unwrap_or_default();
    let pages = find_descendant(entry, "pages").map(|_| {
        [
            descendant_text(entry, "first_page"),
            descendant_text(entry, "last_page"),
        ]
    });

    WorkRecord {
        kind,
        title: descendant_text(entry, "title"),
        authors,
        doi: find_descendant(entry, "doi").map(text_content),
        year: descendant_text(entry, "year"),
        pages,
    }
}
