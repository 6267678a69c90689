//! Blocks shared by the document-type encoders.

use crate::citations::Citations;
use crate::config::DEFAULT_RESOURCE_BASE;
use crate::doi::{normalize_doi, DoiData};
use crate::error::{DepositError, Result};
use crate::frontmatter::Frontmatter;
use crate::schema::SchemaVersion;
use crate::tree::{text_element, Element};

/// Settings shared by the frontmatter adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Target schema version.
    pub version: SchemaVersion,

    /// Landing pages are `{resource_base}/{doi}`.
    pub resource_base: String,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            version: SchemaVersion::default(),
            resource_base: DEFAULT_RESOURCE_BASE.to_string(),
        }
    }
}

impl EncodeOptions {
    /// Set the schema version.
    #[must_use]
    pub fn with_version(mut self, version: SchemaVersion) -> Self {
        self.version = version;
        self
    }

    /// Set the landing page base URL.
    #[must_use]
    pub fn with_resource_base(mut self, resource_base: impl Into<String>) -> Self {
        self.resource_base = resource_base.into();
        self
    }

    /// DOI data for a raw DOI, or `None` if it does not normalize.
    #[must_use]
    pub fn doi_data(&self, raw: Option<&str>) -> Option<DoiData> {
        let raw = raw?;
        let doi = normalize_doi(raw);
        if doi.is_none() {
            tracing::warn!(doi = %raw, "Value is not a DOI and was ignored");
        }
        doi.map(|doi| DoiData::with_resource_base(doi, &self.resource_base))
    }
}

/// One document handed to a frontmatter adapter.
#[derive(Debug, Clone)]
pub struct DocumentInput<'a> {
    pub frontmatter: &'a Frontmatter,
    pub citations: Citations,
    /// Pre-rendered `jats:abstract`; takes precedence over the plain-text abstract.
    pub abstract_xml: Option<Element>,
}

impl<'a> DocumentInput<'a> {
    /// Wrap frontmatter with no citations or rendered abstract.
    #[must_use]
    pub fn new(frontmatter: &'a Frontmatter) -> Self {
        Self {
            frontmatter,
            citations: Citations::default(),
            abstract_xml: None,
        }
    }

    /// Attach citations.
    #[must_use]
    pub fn with_citations(mut self, citations: Citations) -> Self {
        self.citations = citations;
        self
    }

    /// Attach a rendered abstract.
    #[must_use]
    pub fn with_abstract(mut self, abstract_xml: Element) -> Self {
        self.abstract_xml = Some(abstract_xml);
        self
    }

    /// The rendered abstract, else one built from the plain-text abstract.
    #[must_use]
    pub fn abstract_element(&self) -> Option<Element> {
        self.abstract_xml.clone().or_else(|| {
            self.frontmatter
                .abstract_text
                .as_deref()
                .and_then(abstract_from_text)
        })
    }
}

/// Title block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Titles {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub original_language_title: Option<String>,
    pub original_language_subtitle: Option<String>,
}

impl Titles {
    /// A title with no subtitle.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Title and optional subtitle from frontmatter.
    #[must_use]
    pub fn from_frontmatter(frontmatter: &Frontmatter) -> Self {
        Self {
            title: frontmatter.title().map(str::to_string),
            subtitle: frontmatter.subtitle.clone(),
            ..Self::default()
        }
    }

    /// Set the subtitle.
    #[must_use]
    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// The title, or a missing-field error.
    pub fn require_title(&self) -> Result<&str> {
        present(self.title.as_deref()).ok_or_else(|| DepositError::missing("title"))
    }

    /// Whether any part is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts().next().is_none()
    }

    fn parts(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("title", self.title.as_deref()),
            ("subtitle", self.subtitle.as_deref()),
            ("original_language_title", self.original_language_title.as_deref()),
            ("original_language_subtitle", self.original_language_subtitle.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, value)| present(value).map(|v| (name, v)))
    }
}

/// Build `<titles>` from the parts that are set.
#[must_use]
pub fn titles_xml(titles: &Titles) -> Element {
    Element::new("titles").with_children(
        titles
            .parts()
            .map(|(name, value)| text_element(name, value)),
    )
}

/// Page range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pages {
    pub first_page: String,
    pub last_page: Option<String>,
    pub other_pages: Option<String>,
}

impl Pages {
    /// First and optional last page.
    #[must_use]
    pub fn new(first_page: impl Into<String>, last_page: Option<String>) -> Self {
        Self {
            first_page: first_page.into(),
            last_page,
            other_pages: None,
        }
    }

    /// Pages from `biblio.first_page` / `biblio.last_page`.
    #[must_use]
    pub fn from_frontmatter(frontmatter: &Frontmatter) -> Option<Self> {
        frontmatter
            .pages()
            .map(|(first, last)| Self::new(first, last))
    }
}

/// Build `<pages>`.
#[must_use]
pub fn pages_xml(pages: &Pages) -> Element {
    Element::new("pages").with_children([
        Some(text_element("first_page", pages.first_page.as_str())),
        pages.last_page.as_deref().map(|p| text_element("last_page", p)),
        pages.other_pages.as_deref().map(|p| text_element("other_pages", p)),
    ])
}

/// Build the access-indicators block for an open license URL.
#[must_use]
pub fn license_xml(url: &str) -> Element {
    Element::new("ai:program")
        .with_attribute("name", "AccessIndicators")
        .with_children([
            Element::new("ai:free_to_read"),
            text_element("ai:license_ref", url).with_attribute("applies_to", "vor"),
        ])
}

/// License URL from frontmatter; only Creative Commons licenses are deposited.
#[must_use]
pub fn license_from_frontmatter(frontmatter: &Frontmatter) -> Option<String> {
    frontmatter.license.as_ref().and_then(|license| license.cc_url())
}

/// Build a `jats:abstract` with one `jats:p` per blank-line separated paragraph.
///
/// # Examples
/// ```
/// use crossref_deposit::common::abstract_from_text;
///
/// let el = abstract_from_text("First.\n\nSecond.").unwrap();
/// assert_eq!(
///     el.to_xml().unwrap(),
///     "<jats:abstract><jats:p>First.</jats:p><jats:p>Second.</jats:p></jats:abstract>"
/// );
/// ```
#[must_use]
pub fn abstract_from_text(text: &str) -> Option<Element> {
    let paragraphs: Vec<Element> = text
        .split("\n\n")
        .map(|para| para.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|para| !para.is_empty())
        .map(|para| text_element("jats:p", para))
        .collect();
    (!paragraphs.is_empty()).then(|| Element::new("jats:abstract").with_children(paragraphs))
}

/// Treat blank strings as absent.
#[must_use]
pub fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Combine a value that several records must agree on.
///
/// Absent values are ignored. Returns the shared value, or
/// `ConflictingValues` naming the first two values that differ.
///
/// # Examples
/// ```
/// use crossref_deposit::common::agree;
///
/// assert_eq!(agree("venue.title", [Some("A"), None, Some("A")]).unwrap(), Some("A"));
/// assert!(agree("venue.title", [Some("A"), Some("B")]).is_err());
/// ```
pub fn agree<'a>(
    field: &str,
    values: impl IntoIterator<Item = Option<&'a str>>,
) -> Result<Option<&'a str>> {
    let mut shared: Option<&'a str> = None;
    for value in values.into_iter().filter_map(present) {
        match shared {
            None => shared = Some(value),
            Some(first) if first != value => {
                return Err(DepositError::ConflictingValues {
                    field: field.to_string(),
                    first: first.to_string(),
                    second: value.to_string(),
                });
            }
            Some(_) => {}
        }
    }
    Ok(shared)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_titles_xml_order() {
        let titles = Titles {
            title: Some("Title".to_string()),
            subtitle: Some("Sub".to_string()),
            original_language_title: Some("Titel".to_string()),
            original_language_subtitle: None,
        };
        assert_eq!(
            titles_xml(&titles).to_xml().unwrap(),
            "<titles><title>Title</title><subtitle>Sub</subtitle><original_language_title>Titel</original_language_title></titles>"
        );
    }

    #[test]
    fn test_require_title() {
        assert_eq!(Titles::new("T").require_title().unwrap(), "T");
        let err = Titles::new("  ").require_title().unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: title");
        assert!(Titles::default().is_empty());
    }

    #[test]
    fn test_pages_xml() {
        let pages = Pages::new("1", Some("6".to_string()));
        assert_eq!(
            pages_xml(&pages).to_xml().unwrap(),
            "<pages><first_page>1</first_page><last_page>6</last_page></pages>"
        );
        assert_eq!(
            pages_xml(&Pages::new("e12", None)).to_xml().unwrap(),
            "<pages><first_page>e12</first_page></pages>"
        );
    }

    #[test]
    fn test_license_xml() {
        assert_eq!(
            license_xml("https://creativecommons.org/licenses/by/4.0/").to_xml().unwrap(),
            concat!(
                r#"<ai:program name="AccessIndicators"><ai:free_to_read/>"#,
                r#"<ai:license_ref applies_to="vor">https://creativecommons.org/licenses/by/4.0/</ai:license_ref>"#,
                "</ai:program>"
            )
        );
    }

    #[test]
    fn test_abstract_from_blank_text() {
        assert!(abstract_from_text(" \n\n ").is_none());
        let el = abstract_from_text("Line one\nwraps here.").unwrap();
        assert_eq!(el.elements().count(), 1);
        assert_eq!(el.text_content(), "Line one wraps here.");
    }

    #[test]
    fn test_agree_reports_both_values() {
        let err = agree("venue.issn", [None, Some("1234-5678"), Some("8765-4321")]).unwrap_err();
        assert!(matches!(
            err,
            DepositError::ConflictingValues { ref first, ref second, .. }
                if first == "1234-5678" && second == "8765-4321"
        ));
        assert_eq!(agree("x", [None, Some(" ")]).unwrap(), None);
    }

    #[test]
    fn test_encode_options_doi_data() {
        let opts = EncodeOptions::default();
        let data = opts.doi_data(Some("doi:10.62329/ABCD1234")).unwrap();
        assert_eq!(data.doi, "10.62329/ABCD1234");
        assert_eq!(
            data.resource.as_deref(),
            Some("https://doi.curvenote.com/10.62329/ABCD1234")
        );
        assert!(opts.doi_data(Some("nope")).is_none());
        assert!(opts.doi_data(None).is_none());
    }

    #[test]
    fn test_document_input_prefers_rendered_abstract() {
        let fm = Frontmatter {
            abstract_text: Some("Plain.".to_string()),
            ..Frontmatter::default()
        };
        let plain = DocumentInput::new(&fm).abstract_element().unwrap();
        assert_eq!(plain.text_content(), "Plain.");

        let rendered = Element::new("jats:abstract").with_child(text_element("jats:p", "Rich."));
        let input = DocumentInput::new(&fm).with_abstract(rendered);
        assert_eq!(input.abstract_element().unwrap().text_content(), "Rich.");
    }
}
