//! Dataset and database encoding.

use serde::{Deserialize, Serialize};

use crate::citations::{citation_list_xml, Citations};
use crate::common::{present, titles_xml, DocumentInput, EncodeOptions, Titles};
use crate::contributors::authors_from_frontmatter;
use crate::dates::{date_xml, PublicationDate};
use crate::doi::{doi_data_xml, normalize_doi, DoiData};
use crate::error::{DepositError, Result};
use crate::schema::REL_NAMESPACE;
use crate::tree::{text_element, Element};

/// Kind of dataset record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetType {
    Record,
    Collection,
    Crossmark,
    Component,
    #[default]
    Other,
}

impl DatasetType {
    /// Attribute value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Record => "record",
            Self::Collection => "collection",
            Self::Crossmark => "crossmark",
            Self::Component => "component",
            Self::Other => "other",
        }
    }
}

/// Creation, publication and update dates of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetDates {
    pub created: Option<PublicationDate>,
    pub published: Option<PublicationDate>,
    pub updated: Option<PublicationDate>,
}

/// Build `<database_date>`, or `None` when no date is set.
fn database_date_xml(dates: &DatasetDates) -> Result<Option<Element>> {
    let children = [
        date_xml("creation_date", dates.created.as_ref())?,
        date_xml("publication_date", dates.published.as_ref())?,
        date_xml("update_date", dates.updated.as_ref())?,
    ];
    if children.iter().all(Option::is_none) {
        return Ok(None);
    }
    Ok(Some(Element::new("database_date").with_children(children)))
}

/// Whether a relation points at another work or another form of this work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    Inter,
    Intra,
}

/// A typed link to a related work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub kind: RelationKind,
    /// e.g. `isPartOf`, `isSupplementTo`.
    pub relationship: String,
    pub id: String,
    /// e.g. `doi`, `uri`.
    pub id_type: String,
}

impl Relation {
    /// An inter-work relation to a DOI.
    #[must_use]
    pub fn inter_doi(relationship: impl Into<String>, doi: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::Inter,
            relationship: relationship.into(),
            id: doi.into(),
            id_type: "doi".to_string(),
        }
    }
}

/// Build the relations `<program>`, or `None` without relations.
#[must_use]
pub fn relations_xml(relations: &[Relation]) -> Option<Element> {
    if relations.is_empty() {
        return None;
    }
    Some(
        Element::new("program")
            .with_attribute("name", "relations")
            .with_attribute("xmlns", REL_NAMESPACE)
            .with_children(relations.iter().map(|relation| {
                let tag = match relation.kind {
                    RelationKind::Inter => "inter_work_relation",
                    RelationKind::Intra => "intra_work_relation",
                };
                Element::new("related_item").with_child(
                    text_element(tag, relation.id.as_str())
                        .with_attribute("relationship-type", relation.relationship.as_str())
                        .with_attribute("identifier-type", relation.id_type.as_str()),
                )
            })),
    )
}

/// Fields of `<dataset>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub dataset_type: DatasetType,
    pub contributors: Option<Element>,
    pub titles: Titles,
    pub dates: DatasetDates,
    pub description: Option<String>,
    pub relations: Vec<Relation>,
    pub doi_data: Option<DoiData>,
    pub citations: Citations,
}

/// Build `<dataset>`.
///
/// Required: title, DOI.
pub fn dataset_xml(dataset: &Dataset) -> Result<Element> {
    dataset.titles.require_title()?;
    let doi_data = dataset
        .doi_data
        .as_ref()
        .filter(|data| !data.doi.is_empty())
        .ok_or_else(|| DepositError::missing("doi"))?;

    Ok(Element::new("dataset")
        .with_attribute("dataset_type", dataset.dataset_type.as_str())
        .with_child(dataset.contributors.clone())
        .with_child(titles_xml(&dataset.titles))
        .with_child(database_date_xml(&dataset.dates)?)
        .with_child(present(dataset.description.as_deref()).map(|d| text_element("description", d)))
        .with_child(relations_xml(&dataset.relations))
        .with_child(doi_data_xml(doi_data))
        .with_child(citation_list_xml(&dataset.citations)))
}

/// Extract dataset fields from frontmatter.
///
/// The venue DOI, when present, becomes an `isPartOf` relation. The
/// plain-text abstract becomes the description.
pub fn dataset_from_frontmatter(input: &DocumentInput<'_>, opts: &EncodeOptions) -> Result<Dataset> {
    let fm = input.frontmatter;
    let relations = fm
        .venue
        .as_ref()
        .and_then(|venue| venue.doi.as_deref())
        .and_then(normalize_doi)
        .map(|doi| Relation::inter_doi("isPartOf", doi))
        .into_iter()
        .collect();
    let description = fm
        .abstract_text
        .as_deref()
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "));

    Ok(Dataset {
        dataset_type: DatasetType::default(),
        contributors: authors_from_frontmatter(fm, opts.version)?,
        titles: Titles::from_frontmatter(fm),
        dates: DatasetDates {
            created: fm.publication_date(),
            ..DatasetDates::default()
        },
        description,
        relations,
        doi_data: opts.doi_data(fm.doi.as_deref()),
        citations: input.citations.clone(),
    })
}

/// Fields of `<database>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Database {
    pub contributors: Option<Element>,
    pub titles: Titles,
    pub description: Option<String>,
    pub doi_data: Option<DoiData>,
    pub datasets: Vec<Element>,
}

/// Build `<database>` with its `<database_metadata>` and datasets.
///
/// Required: title.
pub fn database_xml(database: &Database) -> Result<Element> {
    database.titles.require_title()?;
    let metadata = Element::new("database_metadata")
        .with_attribute("language", "en")
        .with_child(database.contributors.clone())
        .with_child(titles_xml(&database.titles))
        .with_child(present(database.description.as_deref()).map(|d| text_element("description", d)))
        .with_child(database.doi_data.as_ref().map(doi_data_xml));
    Ok(Element::new("database")
        .with_child(metadata)
        .with_children(database.datasets.iter().cloned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::Frontmatter;
    use pretty_assertions::assert_eq;

    fn dataset() -> Dataset {
        Dataset {
            titles: Titles::new("Survey data"),
            doi_data: Some(DoiData::new("10.62329/DATA0001", "https://example.com/data")),
            ..Dataset::default()
        }
    }

    #[test]
    fn test_minimal_dataset() {
        assert_eq!(
            dataset_xml(&dataset()).unwrap().to_xml().unwrap(),
            concat!(
                r#"<dataset dataset_type="other"><titles><title>Survey data</title></titles>"#,
                r#"<doi_data><doi>10.62329/DATA0001</doi><resource content_version="vor">https://example.com/data</resource></doi_data>"#,
                "</dataset>"
            )
        );
    }

    #[test]
    fn test_dataset_required_fields() {
        let no_title = Dataset { titles: Titles::default(), ..dataset() };
        assert_eq!(dataset_xml(&no_title).unwrap_err().to_string(), "Missing required field: title");
        let no_doi = Dataset { doi_data: None, ..dataset() };
        assert_eq!(dataset_xml(&no_doi).unwrap_err().to_string(), "Missing required field: doi");
    }

    #[test]
    fn test_dataset_dates_and_relations() {
        let full = Dataset {
            dataset_type: DatasetType::Record,
            dates: DatasetDates {
                created: Some(PublicationDate::ymd(2021, 1, 2)),
                updated: Some(PublicationDate::year(2023)),
                ..DatasetDates::default()
            },
            description: Some("Raw measurements".to_string()),
            relations: vec![Relation::inter_doi("isPartOf", "10.62329/PARENT01")],
            ..dataset()
        };
        let el = dataset_xml(&full).unwrap();
        assert_eq!(el.attribute("dataset_type"), Some("record"));
        let dates: Vec<_> = el
            .child("database_date")
            .unwrap()
            .elements()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(dates, vec!["creation_date", "update_date"]);
        assert_eq!(
            relations_xml(&full.relations).unwrap().to_xml().unwrap(),
            concat!(
                r#"<program name="relations" xmlns="http://www.crossref.org/relations.xsd"><related_item>"#,
                r#"<inter_work_relation identifier-type="doi" relationship-type="isPartOf">10.62329/PARENT01</inter_work_relation>"#,
                "</related_item></program>"
            )
        );
    }

    #[test]
    fn test_empty_dates_are_omitted() {
        assert!(database_date_xml(&DatasetDates::default()).unwrap().is_none());
    }

    #[test]
    fn test_database() {
        let database = Database {
            titles: Titles::new("Data repository"),
            description: Some("All the data".to_string()),
            datasets: vec![dataset_xml(&dataset()).unwrap()],
            ..Database::default()
        };
        let el = database_xml(&database).unwrap();
        let metadata = el.child("database_metadata").unwrap();
        assert_eq!(metadata.attribute("language"), Some("en"));
        assert_eq!(metadata.child("description").unwrap().text_content(), "All the data");
        assert_eq!(el.elements().count(), 2);
        assert!(database_xml(&Database::default()).is_err());
    }

    #[test]
    fn test_dataset_from_frontmatter() {
        let fm = Frontmatter::from_yaml(
            r"
title: Measurements
doi: 10.62329/DATA0002
date: 2022-05-01
abstract: |
  Collected in
  the field.
venue:
  title: Lab notebook
  doi: https://doi.org/10.62329/NOTE0001
",
        )
        .unwrap();
        let dataset = dataset_from_frontmatter(&DocumentInput::new(&fm), &EncodeOptions::default()).unwrap();
        assert_eq!(dataset.description.as_deref(), Some("Collected in the field."));
        assert_eq!(dataset.relations, vec![Relation::inter_doi("isPartOf", "10.62329/NOTE0001")]);
        assert_eq!(dataset.dates.created, Some(PublicationDate::ymd(2022, 5, 1)));
        assert!(dataset_xml(&dataset).is_ok());
    }
}
