//! Funding (fundref) encoding.

use crate::contributors::identifier_url;
use crate::doi::normalize_doi;
use crate::error::{DepositError, Result};
use crate::frontmatter::{Affiliation, Frontmatter};
use crate::schema::{SchemaVersion, FR_NAMESPACE};
use crate::tree::{text, text_element, Element};

/// A funder with its registry identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingSource {
    pub name: String,
    /// Funder identifiers as URLs (Funder Registry DOI, ROR).
    pub identifiers: Vec<String>,
}

impl FundingSource {
    /// Source with no identifiers.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifiers: Vec::new(),
        }
    }

    /// Add an identifier.
    #[must_use]
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifiers.push(identifier.into());
        self
    }

    /// Build a source from a resolved affiliation.
    fn from_affiliation(id: &str, affiliation: &Affiliation) -> Result<Self> {
        let name = affiliation
            .display_name()
            .ok_or_else(|| DepositError::MissingAwardSourceName(id.to_string()))?;
        let mut identifiers = Vec::new();
        if let Some(doi) = affiliation.doi.as_deref() {
            match normalize_doi(doi) {
                Some(doi) => identifiers.push(format!("https://doi.org/{doi}")),
                None => tracing::warn!(id = %id, doi = %doi, "Funder DOI is not a DOI and was ignored"),
            }
        }
        if let Some(ror) = affiliation.ror.as_deref() {
            identifiers.push(identifier_url("https://ror.org/", ror));
        }
        Ok(Self {
            name: name.to_string(),
            identifiers,
        })
    }
}

/// One funded award: its funders and award numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fundref {
    pub sources: Vec<FundingSource>,
    pub award_numbers: Vec<String>,
}

/// Resolve every award in the frontmatter funding section.
///
/// An award without any source is excluded with a warning. A source id that
/// is not in the affiliations table, or that resolves to an affiliation with
/// no name, is an error.
///
/// # Errors
/// `DepositError::UnresolvedAffiliation` or `DepositError::MissingAwardSourceName`.
pub fn fundref_from_frontmatter(frontmatter: &Frontmatter) -> Result<Vec<Fundref>> {
    let mut records = Vec::new();
    for award in frontmatter.funding.iter().flat_map(|funding| &funding.awards) {
        if award.sources.is_empty() {
            tracing::warn!(
                award = award.id.as_deref().unwrap_or("<no id>"),
                "Funding award without a source excluded from deposit"
            );
            continue;
        }
        let sources = award
            .sources
            .iter()
            .map(|id| {
                let affiliation = frontmatter
                    .affiliation(id)
                    .ok_or_else(|| DepositError::UnresolvedAffiliation(id.clone()))?;
                FundingSource::from_affiliation(id, affiliation)
            })
            .collect::<Result<Vec<_>>>()?;
        records.push(Fundref {
            sources,
            award_numbers: award.id.iter().cloned().collect(),
        });
    }
    Ok(records)
}

/// Build one `fundgroup` assertion.
fn fundgroup_xml(record: &Fundref) -> Result<Element> {
    if record.sources.is_empty() {
        return Err(DepositError::EmptyFundingSources);
    }
    let funders = record.sources.iter().map(|source| {
        Element::new("fr:assertion")
            .with_attribute("name", "funder_name")
            .with_child(text(source.name.as_str()))
            .with_children(source.identifiers.iter().map(|id| {
                text_element("fr:assertion", id.as_str()).with_attribute("name", "funder_identifier")
            }))
    });
    let awards = record.award_numbers.iter().map(|number| {
        text_element("fr:assertion", number.as_str()).with_attribute("name", "award_number")
    });
    Ok(Element::new("fr:assertion")
        .with_attribute("name", "fundgroup")
        .with_children(funders)
        .with_children(awards))
}

/// Build `<fr:program name="fundref">`, or `None` when there is no funding.
///
/// Schema versions that do not declare the `fr` prefix on the batch get a
/// local namespace declaration on the program element.
///
/// # Errors
/// `DepositError::EmptyFundingSources` when a record has no source.
pub fn fundref_xml(records: &[Fundref], version: SchemaVersion) -> Result<Option<Element>> {
    if records.is_empty() {
        return Ok(None);
    }
    let mut program = Element::new("fr:program").with_attribute("name", "fundref");
    if !version.declares_prefix("fr") {
        program = program.with_attribute("xmlns:fr", FR_NAMESPACE);
    }
    for record in records {
        program.push(fundgroup_xml(record)?);
    }
    Ok(Some(program))
}
