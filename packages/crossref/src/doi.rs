//! DOI normalization, generation and the `<doi_data>` block.

use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;

use crate::tree::{text_element, Element};

/// Matches a DOI with an optional resolver or `doi:` prefix.
/// Captures: (1) the bare DOI.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DOI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:https?://(?:dx\.)?doi\.org/|(?:dx\.)?doi\.org/|doi:\s*)?(10\.\d{4,9}/\S+)$")
        .expect("valid regex")
});

/// Letters used in generated suffixes. Excludes B, I, L, O, Q, S and Z,
/// which read too much like digits.
const SUFFIX_LETTERS: &[u8] = b"ACDEFGHJKMNPRTUVWXY";

/// Digits used in generated suffixes.
const SUFFIX_DIGITS: &[u8] = b"0123456789";

/// Normalize a DOI to its bare `10.xxxx/suffix` form.
///
/// Accepts bare DOIs, `doi:` prefixes and `doi.org` resolver URLs.
///
/// # Returns
/// The bare DOI, or `None` if the input is not a DOI
///
/// # Examples
/// ```
/// use crossref_deposit::doi::normalize_doi;
///
/// assert_eq!(normalize_doi("https://doi.org/10.1234/ABC"), Some("10.1234/ABC".to_string()));
/// assert_eq!(normalize_doi("doi:10.1234/abc"), Some("10.1234/abc".to_string()));
/// assert_eq!(normalize_doi("not-a-doi"), None);
/// ```
#[must_use]
pub fn normalize_doi(input: &str) -> Option<String> {
    DOI_PATTERN
        .captures(input.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Generate a new DOI under the given prefix.
///
/// The suffix is four unambiguous letters followed by four digits,
/// e.g. `10.62329/FMKR4521`.
pub fn generate_doi<R: Rng + ?Sized>(prefix: &str, rng: &mut R) -> String {
    let mut suffix = String::with_capacity(8);
    for _ in 0..4 {
        suffix.push(char::from(SUFFIX_LETTERS[rng.random_range(0..SUFFIX_LETTERS.len())]));
    }
    for _ in 0..4 {
        suffix.push(char::from(SUFFIX_DIGITS[rng.random_range(0..SUFFIX_DIGITS.len())]));
    }
    format!("{prefix}/{suffix}")
}

/// A DOI with its landing page and optional machine-readable variants.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DoiData {
    /// The DOI being registered.
    pub doi: String,

    /// Landing page URL.
    pub resource: Option<String>,

    /// URL of the XML rendition.
    pub xml: Option<String>,

    /// URL of the PDF rendition.
    pub pdf: Option<String>,

    /// URL of a ZIP archive.
    pub zip: Option<String>,
}

impl DoiData {
    /// Create DOI data with a landing page.
    #[must_use]
    pub fn new(doi: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            doi: doi.into(),
            resource: Some(resource.into()),
            ..Self::default()
        }
    }

    /// Create DOI data whose landing page is `{resource_base}/{doi}`.
    ///
    /// # Examples
    /// ```
    /// use crossref_deposit::doi::DoiData;
    ///
    /// let data = DoiData::with_resource_base("10.62329/ABCD1234", "https://doi.curvenote.com/");
    /// assert_eq!(data.resource.as_deref(), Some("https://doi.curvenote.com/10.62329/ABCD1234"));
    /// ```
    #[must_use]
    pub fn with_resource_base(doi: impl Into<String>, resource_base: &str) -> Self {
        let doi = doi.into();
        let resource = format!("{}/{doi}", resource_base.trim_end_matches('/'));
        Self::new(doi, resource)
    }

    /// Set the XML rendition link.
    #[must_use]
    pub fn with_xml(mut self, url: impl Into<String>) -> Self {
        self.xml = Some(url.into());
        self
    }

    /// Set the PDF rendition link.
    #[must_use]
    pub fn with_pdf(mut self, url: impl Into<String>) -> Self {
        self.pdf = Some(url.into());
        self
    }

    /// Set the ZIP archive link.
    #[must_use]
    pub fn with_zip(mut self, url: impl Into<String>) -> Self {
        self.zip = Some(url.into());
        self
    }

    /// Rendition links paired with their MIME types, in output order.
    fn variants(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("text/xml", self.xml.as_deref()),
            ("application/pdf", self.pdf.as_deref()),
            ("application/zip", self.zip.as_deref()),
        ]
        .into_iter()
        .filter_map(|(mime, url)| url.map(|u| (mime, u)))
    }
}

/// Build `<doi_data>`: `doi`, `resource`, then an optional text-mining collection.
#[must_use]
pub fn doi_data_xml(data: &DoiData) -> Element {
    let items: Vec<Element> = data
        .variants()
        .map(|(mime, url)| {
            Element::new("item").with_child(
                text_element("resource", url)
                    .with_attribute("mime_type", mime)
                    .with_attribute("content_version", "vor"),
            )
        })
        .collect();
    let collection = (!items.is_empty()).then(|| {
        Element::new("collection")
            .with_attribute("property", "text-mining")
            .with_children(items)
    });

    Element::new("doi_data").with_children([
        Some(text_element("doi", data.doi.as_str())),
        data.resource
            .as_deref()
            .map(|r| text_element("resource", r).with_attribute("content_version", "vor")),
        collection,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_normalize_doi_variants() {
        for input in [
            "10.25080/majora-212e5952-000",
            " 10.25080/majora-212e5952-000 ",
            "doi:10.25080/majora-212e5952-000",
            "DOI: 10.25080/majora-212e5952-000",
            "https://doi.org/10.25080/majora-212e5952-000",
            "http://dx.doi.org/10.25080/majora-212e5952-000",
            "doi.org/10.25080/majora-212e5952-000",
        ] {
            assert_eq!(
                normalize_doi(input).as_deref(),
                Some("10.25080/majora-212e5952-000"),
                "failed for {input}"
            );
        }
    }

    #[test]
    fn test_normalize_doi_rejects_non_dois() {
        assert_eq!(normalize_doi(""), None);
        assert_eq!(normalize_doi("https://example.com/10.1234/x"), None);
        assert_eq!(normalize_doi("10.12/short-prefix"), None);
    }

    #[test]
    fn test_generate_doi_shape() {
        let pattern = Regex::new(r"^10\.62329/[ACDEFGHJKMNPRTUVWXY]{4}[0-9]{4}$").unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let doi = generate_doi("10.62329", &mut rng);
            assert!(pattern.is_match(&doi), "unexpected DOI {doi}");
        }
    }

    #[test]
    fn test_doi_data_minimal() {
        let data = DoiData::new("10.1234/abc", "https://example.com/abc");
        assert_eq!(
            doi_data_xml(&data).to_xml().unwrap(),
            r#"<doi_data><doi>10.1234/abc</doi><resource content_version="vor">https://example.com/abc</resource></doi_data>"#
        );
    }

    #[test]
    fn test_doi_data_with_variants() {
        let data = DoiData::new("10.1234/abc", "https://example.com/abc")
            .with_pdf("https://example.com/abc.pdf")
            .with_xml("https://example.com/abc.xml");
        let el = doi_data_xml(&data);
        let collection = el.child("collection").unwrap();
        assert_eq!(collection.attribute("property"), Some("text-mining"));

        let mimes: Vec<_> = collection
            .elements()
            .map(|item| item.child("resource").unwrap().attribute("mime_type").unwrap())
            .collect();
        assert_eq!(mimes, vec!["text/xml", "application/pdf"]);
    }

    #[test]
    fn test_doi_data_without_resource() {
        let data = DoiData {
            doi: "10.1234/abc".to_string(),
            ..DoiData::default()
        };
        assert_eq!(
            doi_data_xml(&data).to_xml().unwrap(),
            "<doi_data><doi>10.1234/abc</doi></doi_data>"
        );
    }
}
