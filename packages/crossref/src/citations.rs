//! Citation lists.
//!
//! Citations come from an external bibliography collaborator as an ordered
//! list of keys with optional DOIs. Entries without a usable DOI cannot be
//! deposited; they are dropped with a warning instead of failing the batch.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::doi::normalize_doi;
use crate::error::Result;
use crate::tree::{text_element, Element};

/// One cited work as reported by the bibliography.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CitationRecord {
    /// Citation key, unique within the document.
    pub key: String,

    /// DOI of the cited work, in any common notation.
    #[serde(default)]
    pub doi: Option<String>,
}

impl CitationRecord {
    /// Create a record.
    #[must_use]
    pub fn new(key: impl Into<String>, doi: Option<&str>) -> Self {
        Self {
            key: key.into(),
            doi: doi.map(str::to_string),
        }
    }
}

/// Source of citation records, in citation order.
pub trait CitationSource {
    /// All citations of the document.
    fn citation_records(&self) -> Vec<CitationRecord>;
}

impl CitationSource for [CitationRecord] {
    fn citation_records(&self) -> Vec<CitationRecord> {
        self.to_vec()
    }
}

impl CitationSource for Vec<CitationRecord> {
    fn citation_records(&self) -> Vec<CitationRecord> {
        self.clone()
    }
}

/// Load citation records from a YAML list of `{key, doi}` entries.
pub fn load_citations(path: &Path) -> Result<Vec<CitationRecord>> {
    let text = fs::read_to_string(path)?;
    Ok(serde_yaml_ng::from_str(&text)?)
}

/// Citation key to normalized DOI, in citation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Citations(Vec<(String, String)>);

impl Citations {
    /// Collect citations with a normalizable DOI.
    ///
    /// Entries without a DOI, or with one that cannot be normalized, are
    /// excluded and logged. Repeated keys keep their first occurrence.
    #[must_use]
    pub fn from_source(source: &(impl CitationSource + ?Sized)) -> Self {
        let mut citations = Self::default();
        for record in source.citation_records() {
            let Some(raw) = record.doi.as_deref() else {
                tracing::warn!(key = %record.key, "Citation without DOI excluded from deposit");
                continue;
            };
            let Some(doi) = normalize_doi(raw) else {
                tracing::warn!(key = %record.key, doi = %raw, "Citation with invalid DOI excluded from deposit");
                continue;
            };
            if citations.contains_key(&record.key) {
                tracing::debug!(key = %record.key, "Duplicate citation key skipped");
                continue;
            }
            citations.0.push((record.key, doi));
        }
        citations
    }

    /// Whether a key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    /// Number of citations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no citations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(key, doi)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, doi)| (key.as_str(), doi.as_str()))
    }
}

/// Build `<citation_list>`, or `None` when there is nothing to cite.
#[must_use]
pub fn citation_list_xml(citations: &Citations) -> Option<Element> {
    if citations.is_empty() {
        return None;
    }
    Some(Element::new("citation_list").with_children(citations.iter().map(|(key, doi)| {
        Element::new("citation")
            .with_attribute("key", key)
            .with_child(text_element("doi", doi))
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn records() -> Vec<CitationRecord> {
        vec![
            CitationRecord::new("smith2020", Some("https://doi.org/10.1000/xyz")),
            CitationRecord::new("nodoi", None),
            CitationRecord::new("bogus", Some("not a doi")),
            CitationRecord::new("jones2021", Some("10.1000/abc")),
            CitationRecord::new("smith2020", Some("10.1000/other")),
        ]
    }

    #[test]
    fn test_citations_drop_unusable_entries() {
        let citations = Citations::from_source(&records());
        let pairs: Vec<_> = citations.iter().collect();
        assert_eq!(
            pairs,
            vec![("smith2020", "10.1000/xyz"), ("jones2021", "10.1000/abc")]
        );
    }

    #[test]
    fn test_citation_list_xml() {
        let citations = Citations::from_source(records().as_slice());
        assert_eq!(
            citation_list_xml(&citations).unwrap().to_xml().unwrap(),
            concat!(
                r#"<citation_list><citation key="smith2020"><doi>10.1000/xyz</doi></citation>"#,
                r#"<citation key="jones2021"><doi>10.1000/abc</doi></citation></citation_list>"#
            )
        );
    }

    #[test]
    fn test_empty_citations_emit_nothing() {
        assert!(citation_list_xml(&Citations::default()).is_none());
        let only_missing = vec![CitationRecord::new("a", None)];
        assert!(citation_list_xml(&Citations::from_source(&only_missing)).is_none());
    }

    #[test]
    fn test_load_citations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("citations.yml");
        fs::write(&path, "- key: a\n  doi: 10.1000/a\n- key: b\n").unwrap();
        let loaded = load_citations(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].doi, None);
    }
}
