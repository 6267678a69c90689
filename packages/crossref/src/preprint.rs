//! Posted content (preprint) encoding.

use crate::citations::{citation_list_xml, Citations};
use crate::common::{license_from_frontmatter, license_xml, titles_xml, DocumentInput, EncodeOptions, Titles};
use crate::contributors::authors_from_frontmatter;
use crate::dates::{date_xml, PublicationDate};
use crate::doi::{doi_data_xml, DoiData};
use crate::error::{DepositError, Result};
use crate::funding::{fundref_from_frontmatter, fundref_xml, Fundref};
use crate::schema::SchemaVersion;
use crate::tree::Element;

/// Fields of a `<posted_content>` record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preprint {
    pub contributors: Option<Element>,
    pub titles: Titles,
    pub abstract_xml: Option<Element>,
    /// Posted date.
    pub date: Option<PublicationDate>,
    pub funding: Vec<Fundref>,
    /// Open license URL.
    pub license: Option<String>,
    pub doi_data: Option<DoiData>,
    pub citations: Citations,
}

/// Build `<posted_content type="preprint">`.
///
/// Required: title, posted date, DOI.
///
/// # Errors
/// `DepositError::MissingField` naming `title`, `date` or `doi`, or any
/// error from the date and funding encoders.
pub fn preprint_xml(preprint: &Preprint, version: SchemaVersion) -> Result<Element> {
    preprint.titles.require_title()?;
    let posted_date = date_xml("posted_date", preprint.date.as_ref())?
        .ok_or_else(|| DepositError::missing("date"))?;
    let doi_data = preprint
        .doi_data
        .as_ref()
        .filter(|data| !data.doi.is_empty())
        .ok_or_else(|| DepositError::missing("doi"))?;

    Ok(Element::new("posted_content")
        .with_attribute("type", "preprint")
        .with_child(preprint.contributors.clone())
        .with_child(titles_xml(&preprint.titles))
        .with_child(posted_date)
        .with_child(preprint.abstract_xml.clone())
        .with_child(fundref_xml(&preprint.funding, version)?)
        .with_child(preprint.license.as_deref().map(license_xml))
        .with_child(doi_data_xml(doi_data))
        .with_child(citation_list_xml(&preprint.citations)))
}

/// Extract preprint fields from frontmatter.
///
/// # Errors
/// Affiliation and funding resolution errors.
pub fn preprint_from_frontmatter(input: &DocumentInput<'_>, opts: &EncodeOptions) -> Result<Preprint> {
    let fm = input.frontmatter;
    Ok(Preprint {
        contributors: authors_from_frontmatter(fm, opts.version)?,
        titles: Titles::from_frontmatter(fm),
        abstract_xml: input.abstract_element(),
        date: fm.publication_date(),
        funding: fundref_from_frontmatter(fm)?,
        license: license_from_frontmatter(fm),
        doi_data: opts.doi_data(fm.doi.as_deref()),
        citations: input.citations.clone(),
    })
}

/// Encode a preprint straight from frontmatter.
pub fn preprint_xml_from_frontmatter(input: &DocumentInput<'_>, opts: &EncodeOptions) -> Result<Element> {
    preprint_xml(&preprint_from_frontmatter(input, opts)?, opts.version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::citations::CitationRecord;
    use crate::frontmatter::Frontmatter;
    use pretty_assertions::assert_eq;

    fn minimal() -> Preprint {
        Preprint {
            titles: Titles::new("A preprint"),
            date: Some(PublicationDate::ymd(2023, 12, 5)),
            doi_data: Some(DoiData::new("10.62329/ABCD1234", "https://doi.curvenote.com/10.62329/ABCD1234")),
            ..Preprint::default()
        }
    }

    #[test]
    fn test_minimal_preprint() {
        let xml = preprint_xml(&minimal(), SchemaVersion::V5_3_1).unwrap().to_xml().unwrap();
        assert_eq!(
            xml,
            concat!(
                r#"<posted_content type="preprint"><titles><title>A preprint</title></titles>"#,
                r#"<posted_date media_type="online"><month>12</month><day>05</day><year>2023</year></posted_date>"#,
                r#"<doi_data><doi>10.62329/ABCD1234</doi>"#,
                r#"<resource content_version="vor">https://doi.curvenote.com/10.62329/ABCD1234</resource></doi_data>"#,
                "</posted_content>"
            )
        );
    }

    #[test]
    fn test_required_fields() {
        let no_title = Preprint { titles: Titles::default(), ..minimal() };
        assert_eq!(
            preprint_xml(&no_title, SchemaVersion::V5_3_1).unwrap_err().to_string(),
            "Missing required field: title"
        );

        let no_date = Preprint { date: None, ..minimal() };
        assert_eq!(
            preprint_xml(&no_date, SchemaVersion::V5_3_1).unwrap_err().to_string(),
            "Missing required field: date"
        );

        let no_doi = Preprint { doi_data: None, ..minimal() };
        assert_eq!(
            preprint_xml(&no_doi, SchemaVersion::V5_3_1).unwrap_err().to_string(),
            "Missing required field: doi"
        );
    }

    #[test]
    fn test_from_frontmatter() {
        let fm = Frontmatter::from_yaml(
            r"
title: Preprint Title
subtitle: With a subtitle
authors:
  - name: Jane Doe
license: CC-BY-4.0
doi: 10.62329/ABCD1234
date: 2024-02-01
abstract: Short summary.
",
        )
        .unwrap();
        let citations = Citations::from_source(&vec![CitationRecord::new("ref1", Some("10.1000/ref"))]);
        let input = DocumentInput::new(&fm).with_citations(citations);
        let el = preprint_xml_from_frontmatter(&input, &EncodeOptions::default()).unwrap();

        let order: Vec<_> = el.elements().map(|c| c.name.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "contributors",
                "titles",
                "posted_date",
                "jats:abstract",
                "ai:program",
                "doi_data",
                "citation_list"
            ]
        );
        assert_eq!(el.find("subtitle").unwrap().text_content(), "With a subtitle");
        assert_eq!(
            el.find("resource").unwrap().text_content(),
            "https://doi.curvenote.com/10.62329/ABCD1234"
        );
    }

    #[test]
    fn test_non_cc_license_is_not_deposited() {
        let fm = Frontmatter::from_yaml(
            "title: T\nlicense: MIT\ndoi: 10.62329/ABCD1234\ndate: '2024'\n",
        )
        .unwrap();
        let el = preprint_xml_from_frontmatter(&DocumentInput::new(&fm), &EncodeOptions::default()).unwrap();
        assert!(el.child("ai:program").is_none());
    }
}
