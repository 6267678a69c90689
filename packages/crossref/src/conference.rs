//! Conference encoding: event, proceedings (optionally in a series) and papers.

use serde::{Deserialize, Deserializer};

use crate::citations::{citation_list_xml, Citations};
use crate::common::{
    agree, license_from_frontmatter, license_xml, pages_xml, present, titles_xml, DocumentInput,
    EncodeOptions, Pages, Titles,
};
use crate::contributors::authors_from_frontmatter;
use crate::dates::{publication_date_xml, publication_dates_xml, PublicationDate};
use crate::doi::{doi_data_xml, normalize_doi, DoiData};
use crate::error::{DepositError, Result};
use crate::funding::{fundref_from_frontmatter, fundref_xml, Fundref};
use crate::schema::SchemaVersion;
use crate::tree::{text_element, Element};

/// Accept a conference number given as text or as an integer.
fn number_as_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Text(String),
        Integer(u64),
    }

    Ok(Option::<Number>::deserialize(deserializer)?.map(|n| match n {
        Number::Text(text) => text,
        Number::Integer(n) => n.to_string(),
    }))
}

/// The conference event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EventMetadata {
    pub name: String,
    pub acronym: Option<String>,
    #[serde(deserialize_with = "number_as_text")]
    pub number: Option<String>,
    pub location: Option<String>,
    /// Free-form date range, e.g. `July 11 - July 17 2022`.
    pub date: Option<String>,
}

/// Build `<event_metadata>`.
///
/// Required: event name.
pub fn event_metadata_xml(event: &EventMetadata) -> Result<Element> {
    let name = present(Some(event.name.as_str()))
        .ok_or_else(|| DepositError::missing_in("name", "event_metadata"))?;
    Ok(Element::new("event_metadata").with_children([
        Some(text_element("conference_name", name)),
        present(event.acronym.as_deref()).map(|a| text_element("conference_acronym", a)),
        present(event.number.as_deref()).map(|n| text_element("conference_number", n)),
        present(event.location.as_deref()).map(|l| text_element("conference_location", l)),
        present(event.date.as_deref()).map(|d| text_element("conference_date", d)),
    ]))
}

/// A proceedings series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProceedingsSeries {
    pub title: Option<String>,
    pub original_language_title: Option<String>,
    pub issn: Option<String>,
    /// DOI of the series itself.
    pub doi: Option<String>,
    /// Landing page of the series.
    pub resource: Option<String>,
}

impl ProceedingsSeries {
    /// Build `<series_metadata>`. Title and ISSN are mandatory; a DOI must be
    /// a valid DOI in any accepted form.
    fn to_xml(&self) -> Result<Element> {
        let title = present(self.title.as_deref())
            .ok_or_else(|| DepositError::missing_in("title", "series_metadata"))?;
        let issn = present(self.issn.as_deref())
            .ok_or_else(|| DepositError::missing_in("issn", "series_metadata"))?;
        let titles = Titles {
            title: Some(title.to_string()),
            original_language_title: self.original_language_title.clone(),
            ..Titles::default()
        };
        let doi_data = present(self.doi.as_deref())
            .map(|raw| normalize_doi(raw).ok_or_else(|| DepositError::InvalidDoi(raw.to_string())))
            .transpose()?
            .map(|doi| DoiData {
                doi,
                resource: self.resource.clone(),
                ..DoiData::default()
            });
        Ok(Element::new("series_metadata").with_children([
            Some(titles_xml(&titles)),
            Some(text_element("issn", issn)),
            doi_data.as_ref().map(doi_data_xml),
        ]))
    }
}

/// The proceedings volume.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Proceedings {
    pub title: Option<String>,
    pub publisher: Option<String>,
    pub publication_date: Option<PublicationDate>,
    pub doi_data: Option<DoiData>,
    pub series: Option<ProceedingsSeries>,
}

/// Build `<proceedings_metadata>`, or `<proceedings_series_metadata>` when a
/// series is given.
///
/// Required: title, publisher and publication date. A series needs a title
/// and an ISSN, and is only available in schema versions that support it.
pub fn proceedings_xml(proceedings: &Proceedings, version: SchemaVersion) -> Result<Element> {
    let (tag, reason) = match proceedings.series {
        Some(_) => ("proceedings_series_metadata", "simple_series"),
        None => ("proceedings_metadata", "archive_volume"),
    };
    if proceedings.series.is_some() && !version.supports_proceedings_series() {
        return Err(DepositError::UnsupportedElement {
            element: tag.to_string(),
            version: version.to_string(),
        });
    }
    let title = present(proceedings.title.as_deref())
        .ok_or_else(|| DepositError::missing_in("title", tag))?;
    let publisher = present(proceedings.publisher.as_deref())
        .ok_or_else(|| DepositError::missing_in("publisher", tag))?;
    let date = publication_date_xml(proceedings.publication_date.as_ref())?
        .ok_or_else(|| DepositError::missing_in("date", tag))?;
    let series = proceedings
        .series
        .as_ref()
        .map(ProceedingsSeries::to_xml)
        .transpose()?;

    Ok(Element::new(tag).with_children([
        series,
        Some(text_element("proceedings_title", title)),
        Some(Element::new("publisher").with_child(text_element("publisher_name", publisher))),
        Some(date),
        Some(Element::new("noisbn").with_attribute("reason", reason)),
        proceedings.doi_data.as_ref().map(doi_data_xml),
    ]))
}

/// Fields of `<conference_paper>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConferencePaper {
    pub contributors: Option<Element>,
    pub titles: Titles,
    pub abstract_xml: Option<Element>,
    pub publication_dates: Vec<PublicationDate>,
    pub pages: Option<Pages>,
    pub funding: Vec<Fundref>,
    pub license: Option<String>,
    pub doi_data: Option<DoiData>,
    pub citations: Citations,
}

/// Build `<conference_paper>`.
///
/// Required: title, DOI.
pub fn conference_paper_xml(paper: &ConferencePaper, version: SchemaVersion) -> Result<Element> {
    paper.titles.require_title()?;
    let doi_data = paper
        .doi_data
        .as_ref()
        .filter(|data| !data.doi.is_empty())
        .ok_or_else(|| DepositError::missing("doi"))?;

    Ok(Element::new("conference_paper")
        .with_attribute("publication_type", "full_text")
        .with_child(paper.contributors.clone())
        .with_child(titles_xml(&paper.titles))
        .with_child(paper.abstract_xml.clone())
        .with_children(publication_dates_xml(&paper.publication_dates)?)
        .with_child(paper.pages.as_ref().map(pages_xml))
        .with_child(fundref_xml(&paper.funding, version)?)
        .with_child(paper.license.as_deref().map(license_xml))
        .with_child(doi_data_xml(doi_data))
        .with_child(citation_list_xml(&paper.citations)))
}

/// Extract conference paper fields from frontmatter.
pub fn conference_paper_from_frontmatter(
    input: &DocumentInput<'_>,
    opts: &EncodeOptions,
) -> Result<ConferencePaper> {
    let fm = input.frontmatter;
    Ok(ConferencePaper {
        contributors: authors_from_frontmatter(fm, opts.version)?,
        titles: Titles::from_frontmatter(fm),
        abstract_xml: input.abstract_element(),
        publication_dates: fm.publication_date().into_iter().collect(),
        pages: Pages::from_frontmatter(fm),
        funding: fundref_from_frontmatter(fm)?,
        license: license_from_frontmatter(fm),
        doi_data: opts.doi_data(fm.doi.as_deref()),
        citations: input.citations.clone(),
    })
}

/// A complete conference: event, proceedings and encoded papers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conference {
    pub contributors: Option<Element>,
    pub event: EventMetadata,
    pub proceedings: Proceedings,
    pub papers: Vec<Element>,
}

/// Build `<conference>`.
pub fn conference_xml(conference: &Conference, version: SchemaVersion) -> Result<Element> {
    Ok(Element::new("conference")
        .with_child(conference.contributors.clone())
        .with_child(event_metadata_xml(&conference.event)?)
        .with_child(proceedings_xml(&conference.proceedings, version)?)
        .with_children(conference.papers.iter().cloned()))
}

/// Combine several papers into one `<conference>`.
///
/// The papers' venue titles must agree. The proceedings title falls back to
/// that shared venue title when not given explicitly.
///
/// # Errors
/// `DepositError::ConflictingValues` when papers name different venues,
/// plus any encoding error of the parts.
pub fn conference_from_frontmatters(
    event: &EventMetadata,
    proceedings: &Proceedings,
    papers: &[DocumentInput<'_>],
    opts: &EncodeOptions,
) -> Result<Element> {
    let venue_title = agree(
        "venue.title",
        papers.iter().map(|input| {
            input
                .frontmatter
                .venue
                .as_ref()
                .and_then(|venue| venue.title.as_deref())
        }),
    )?;
    let proceedings = Proceedings {
        title: present(proceedings.title.as_deref())
            .or(venue_title)
            .map(str::to_string),
        ..proceedings.clone()
    };
    let encoded = papers
        .iter()
        .map(|input| {
            conference_paper_from_frontmatter(input, opts)
                .and_then(|paper| conference_paper_xml(&paper, opts.version))
        })
        .collect::<Result<Vec<_>>>()?;

    conference_xml(
        &Conference {
            contributors: None,
            event: event.clone(),
            proceedings,
            papers: encoded,
        },
        opts.version,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::Frontmatter;
    use pretty_assertions::assert_eq;

    fn scipy_event() -> EventMetadata {
        EventMetadata {
            name: "Python in Science Conference".to_string(),
            acronym: Some("SciPy".to_string()),
            number: Some("21st".to_string()),
            location: Some("Austin, Texas".to_string()),
            date: Some("July 11 - July 17 2022".to_string()),
        }
    }

    fn proceedings() -> Proceedings {
        Proceedings {
            title: Some("Proceedings of the 21st Python in Science Conference".to_string()),
            publisher: Some("SciPy".to_string()),
            publication_date: Some(PublicationDate::year(2022)),
            doi_data: Some(DoiData::new(
                "10.25080/majora-212e5952-046",
                "https://conference.scipy.org/proceedings/scipy2022",
            )),
            series: None,
        }
    }

    #[test]
    fn test_event_metadata_order() {
        assert_eq!(
            event_metadata_xml(&scipy_event()).unwrap().to_xml().unwrap(),
            concat!(
                "<event_metadata><conference_name>Python in Science Conference</conference_name>",
                "<conference_acronym>SciPy</conference_acronym>",
                "<conference_number>21st</conference_number>",
                "<conference_location>Austin, Texas</conference_location>",
                "<conference_date>July 11 - July 17 2022</conference_date></event_metadata>"
            )
        );
        assert!(event_metadata_xml(&EventMetadata::default()).is_err());
    }

    #[test]
    fn test_proceedings_metadata() {
        let el = proceedings_xml(&proceedings(), SchemaVersion::V4_4_2).unwrap();
        let order: Vec<_> = el.elements().map(|c| c.name.as_str()).collect();
        assert_eq!(
            order,
            vec!["proceedings_title", "publisher", "publication_date", "noisbn", "doi_data"]
        );
        assert_eq!(el.child("noisbn").unwrap().attribute("reason"), Some("archive_volume"));
    }

    #[test]
    fn test_proceedings_required_fields() {
        for (broken, field) in [
            (Proceedings { title: None, ..proceedings() }, "title"),
            (Proceedings { publisher: None, ..proceedings() }, "publisher"),
            (Proceedings { publication_date: None, ..proceedings() }, "date"),
        ] {
            assert!(matches!(
                proceedings_xml(&broken, SchemaVersion::V5_3_1),
                Err(DepositError::MissingField { field: ref f, .. }) if f == field
            ));
        }
    }

    #[test]
    fn test_proceedings_series() {
        let series = ProceedingsSeries {
            title: Some("Proceedings of the Python in Science Conference".to_string()),
            issn: Some("2575-9752".to_string()),
            doi: Some("https://doi.org/10.25080/issn.2575-9752".to_string()),
            resource: Some("https://conference.scipy.org/proceedings".to_string()),
            ..ProceedingsSeries::default()
        };
        let with_series = Proceedings {
            series: Some(series.clone()),
            ..proceedings()
        };
        let el = proceedings_xml(&with_series, SchemaVersion::V5_3_1).unwrap();
        assert_eq!(el.name, "proceedings_series_metadata");
        assert_eq!(el.find("issn").unwrap().text_content(), "2575-9752");
        assert_eq!(el.find("doi").unwrap().text_content(), "10.25080/issn.2575-9752");
        assert_eq!(el.child("noisbn").unwrap().attribute("reason"), Some("simple_series"));

        assert!(matches!(
            proceedings_xml(&with_series, SchemaVersion::V4_4_2),
            Err(DepositError::UnsupportedElement { .. })
        ));

        let bad_doi = Proceedings {
            series: Some(ProceedingsSeries {
                doi: Some("issn.2575-9752".to_string()),
                ..series.clone()
            }),
            ..proceedings()
        };
        assert!(matches!(
            proceedings_xml(&bad_doi, SchemaVersion::V5_3_1),
            Err(DepositError::InvalidDoi(ref raw)) if raw == "issn.2575-9752"
        ));

        let no_issn = Proceedings {
            series: Some(ProceedingsSeries { issn: None, ..series }),
            ..proceedings()
        };
        assert!(matches!(
            proceedings_xml(&no_issn, SchemaVersion::V5_3_1),
            Err(DepositError::MissingField { ref field, .. }) if field == "issn"
        ));
    }

    #[test]
    fn test_conference_paper_required_fields() {
        let paper = ConferencePaper::default();
        assert!(matches!(
            conference_paper_xml(&paper, SchemaVersion::V5_3_1),
            Err(DepositError::MissingField { ref field, .. }) if field == "title"
        ));
        let paper = ConferencePaper {
            titles: Titles::new("Paper"),
            ..ConferencePaper::default()
        };
        assert!(matches!(
            conference_paper_xml(&paper, SchemaVersion::V5_3_1),
            Err(DepositError::MissingField { ref field, .. }) if field == "doi"
        ));
    }

    #[test]
    fn test_conference_from_frontmatters() {
        let fm = Frontmatter::from_yaml(
            r"
title: Roman Numerals
authors:
  - name: Perry Greenfield
doi: 10.25080/majora-212e5952-000
date: 2022-07-11
biblio:
  first_page: 1
  last_page: 6
venue:
  title: Proceedings of SciPy 2022
",
        )
        .unwrap();
        let inputs = [DocumentInput::new(&fm)];
        let explicit = Proceedings { title: None, ..proceedings() };
        let el = conference_from_frontmatters(&scipy_event(), &explicit, &inputs, &EncodeOptions::default())
            .unwrap();

        let order: Vec<_> = el.elements().map(|c| c.name.as_str()).collect();
        assert_eq!(order, vec!["event_metadata", "proceedings_metadata", "conference_paper"]);
        assert_eq!(
            el.find("proceedings_title").unwrap().text_content(),
            "Proceedings of SciPy 2022"
        );
        let paper = el.child("conference_paper").unwrap();
        assert_eq!(paper.find("first_page").unwrap().text_content(), "1");
        assert_eq!(paper.find("last_page").unwrap().text_content(), "6");
    }

    #[test]
    fn test_conference_from_frontmatters_conflicting_venues() {
        let first = Frontmatter::from_yaml(
            "title: One\ndoi: 10.25080/aaaa0001\nvenue:\n  title: SciPy 2022\n",
        )
        .unwrap();
        let second = Frontmatter::from_yaml(
            "title: Two\ndoi: 10.25080/aaaa0002\nvenue:\n  title: SciPy 2023\n",
        )
        .unwrap();
        let inputs = [DocumentInput::new(&first), DocumentInput::new(&second)];
        let err = conference_from_frontmatters(
            &scipy_event(),
            &proceedings(),
            &inputs,
            &EncodeOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, DepositError::ConflictingValues { ref field, .. } if field == "venue.title"));
        let message = err.to_string();
        assert!(message.contains("SciPy 2022"), "{message}");
        assert!(message.contains("SciPy 2023"), "{message}");
    }

    #[test]
    fn test_event_from_yaml_accepts_numeric_number() {
        let event: EventMetadata = serde_yaml_ng::from_str("name: SciPy\nnumber: 21\n").unwrap();
        assert_eq!(event.number.as_deref(), Some("21"));
    }
}
