//! Contributor encoding.
//!
//! Each person becomes one `<person_name>` carrying a `sequence` and a
//! `contributor_role`. The affiliation substructure depends on the schema
//! version; see [`AffiliationStyle`].

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::frontmatter::{Affiliation, Frontmatter, ParsedName, Person};
use crate::schema::{AffiliationStyle, SchemaVersion};
use crate::tree::{text_element, Element};

/// Role of a contributor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContributorRole {
    #[default]
    Author,
    Editor,
    Chair,
    Reviewer,
    ReviewAssistant,
    StatsReviewer,
    ReviewerExternal,
    Reader,
    Translator,
}

impl ContributorRole {
    /// Attribute value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Editor => "editor",
            Self::Chair => "chair",
            Self::Reviewer => "reviewer",
            Self::ReviewAssistant => "review-assistant",
            Self::StatsReviewer => "stats-reviewer",
            Self::ReviewerExternal => "reviewer-external",
            Self::Reader => "reader",
            Self::Translator => "translator",
        }
    }
}

/// Position of a contributor in the author list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence {
    First,
    Additional,
}

impl Sequence {
    /// Attribute value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Additional => "additional",
        }
    }
}

/// Assign `first`/`additional` from equal-contributor flags.
///
/// The first position is always `first`. A later position is `first` when
/// it is flagged as an equal contributor and the previous position is `first`.
///
/// # Examples
/// ```
/// use crossref_deposit::contributors::{assign_sequence, Sequence};
///
/// assert_eq!(
///     assign_sequence([true, true, false]),
///     vec![Sequence::First, Sequence::First, Sequence::Additional]
/// );
/// ```
pub fn assign_sequence(equal_contributor: impl IntoIterator<Item = bool>) -> Vec<Sequence> {
    let mut still_first = true;
    equal_contributor
        .into_iter()
        .enumerate()
        .map(|(index, equal)| {
            still_first = index == 0 || (still_first && equal);
            if still_first {
                Sequence::First
            } else {
                Sequence::Additional
            }
        })
        .collect()
}

/// A person ready for encoding, with affiliations already resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contributor {
    pub name: ParsedName,
    pub affiliations: Vec<Affiliation>,
    pub orcid: Option<String>,
    pub role: ContributorRole,
    pub equal_contributor: bool,
}

impl Contributor {
    /// Contributor from a display name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: ParsedName::from_literal(name),
            ..Self::default()
        }
    }

    /// Resolve a frontmatter person against the frontmatter affiliation table.
    ///
    /// # Errors
    /// `DepositError::UnresolvedAffiliation` when an affiliation id is unknown.
    pub fn from_person(
        person: &Person,
        frontmatter: &Frontmatter,
        role: ContributorRole,
    ) -> Result<Self> {
        Ok(Self {
            name: person.name.parsed(),
            affiliations: frontmatter.resolve_affiliations(person)?,
            orcid: person.orcid.clone(),
            role,
            equal_contributor: person.equal_contributor,
        })
    }

    /// Set the role.
    #[must_use]
    pub fn with_role(mut self, role: ContributorRole) -> Self {
        self.role = role;
        self
    }

    /// Add an affiliation.
    #[must_use]
    pub fn with_affiliation(mut self, affiliation: Affiliation) -> Self {
        self.affiliations.push(affiliation);
        self
    }

    /// Set the ORCID, bare or as a URL.
    #[must_use]
    pub fn with_orcid(mut self, orcid: impl Into<String>) -> Self {
        self.orcid = Some(orcid.into());
        self
    }

    /// Mark as an equal contributor.
    #[must_use]
    pub fn with_equal_contribution(mut self) -> Self {
        self.equal_contributor = true;
        self
    }
}

/// Prefix `base` unless the identifier is already a URL.
pub(crate) fn identifier_url(base: &str, id: &str) -> String {
    let id = id.trim();
    if id.starts_with("http://") || id.starts_with("https://") {
        id.to_string()
    } else {
        format!("{base}{id}")
    }
}

/// ORCID as an absolute URL.
#[must_use]
pub fn orcid_url(orcid: &str) -> String {
    identifier_url("https://orcid.org/", orcid)
}

/// Institution identifiers as `(type, value)` pairs.
fn institution_ids(affiliation: &Affiliation) -> Vec<(&'static str, String)> {
    let mut ids = Vec::new();
    if let Some(ror) = affiliation.ror.as_deref() {
        ids.push(("ror", identifier_url("https://ror.org/", ror)));
    }
    if let Some(isni) = affiliation.isni.as_deref() {
        let compact: String = isni.chars().filter(|c| !c.is_whitespace()).collect();
        ids.push(("isni", identifier_url("https://isni.org/isni/", &compact)));
    }
    if let Some(ringgold) = affiliation.ringgold.as_deref() {
        ids.push(("ringgold", ringgold.trim().to_string()));
    }
    ids
}

/// Build `<institution>`.
fn institution_xml(affiliation: &Affiliation) -> Element {
    let name = affiliation
        .institution
        .as_deref()
        .or(affiliation.name.as_deref());
    Element::new("institution")
        .with_child(name.map(|n| text_element("institution_name", n)))
        .with_children(
            institution_ids(affiliation)
                .into_iter()
                .map(|(kind, id)| text_element("institution_id", id).with_attribute("type", kind)),
        )
        .with_child(affiliation.place().map(|p| text_element("institution_place", p)))
        .with_child(
            affiliation
                .department
                .as_deref()
                .map(|d| text_element("institution_department", d)),
        )
}

/// Affiliation children of `<person_name>` for the given schema version.
fn affiliations_xml(affiliations: &[Affiliation], version: SchemaVersion) -> Vec<Element> {
    match version.affiliation_style() {
        AffiliationStyle::Flat => affiliations
            .iter()
            .filter_map(|aff| aff.display_name().map(|n| text_element("affiliation", n)))
            .collect(),
        AffiliationStyle::Institutions if affiliations.is_empty() => Vec::new(),
        AffiliationStyle::Institutions => vec![Element::new("affiliations")
            .with_children(affiliations.iter().map(institution_xml))],
    }
}

/// Build `<person_name>` for one contributor.
#[must_use]
pub fn contributor_xml(
    contributor: &Contributor,
    sequence: Sequence,
    version: SchemaVersion,
) -> Element {
    let name = contributor.name.completed();
    // A lone name is a surname.
    let (given, surname) = match name.family.as_deref() {
        Some(family) => (name.given.as_deref(), family),
        None => (
            None,
            name.given
                .as_deref()
                .or(name.literal.as_deref())
                .unwrap_or_default(),
        ),
    };

    Element::new("person_name")
        .with_attribute("sequence", sequence.as_str())
        .with_attribute("contributor_role", contributor.role.as_str())
        .with_child(given.map(|g| text_element("given_name", g)))
        .with_child(text_element("surname", surname))
        .with_children(affiliations_xml(&contributor.affiliations, version))
        .with_child(
            contributor
                .orcid
                .as_deref()
                .map(|orcid| text_element("ORCID", orcid_url(orcid))),
        )
        .with_child(
            name.literal
                .as_deref()
                .map(|literal| Element::new("alt-name").with_child(text_element("string-name", literal))),
        )
}

/// Build `<contributors>`, or `None` for an empty list.
#[must_use]
pub fn contributors_xml(contributors: &[Contributor], version: SchemaVersion) -> Option<Element> {
    if contributors.is_empty() {
        return None;
    }
    let sequences = assign_sequence(contributors.iter().map(|c| c.equal_contributor));
    Some(Element::new("contributors").with_children(
        contributors
            .iter()
            .zip(sequences)
            .map(|(contributor, sequence)| contributor_xml(contributor, sequence, version)),
    ))
}

/// Build the author `<contributors>` block from frontmatter.
///
/// # Errors
/// `DepositError::UnresolvedAffiliation` when an author references an
/// unknown affiliation id.
pub fn authors_from_frontmatter(
    frontmatter: &Frontmatter,
    version: SchemaVersion,
) -> Result<Option<Element>> {
    let authors = frontmatter
        .authors
        .iter()
        .map(|person| Contributor::from_person(person, frontmatter, ContributorRole::Author))
        .collect::<Result<Vec<_>>>()?;
    Ok(contributors_xml(&authors, version))
}

/// Build an editor-only `<contributors>` block from the `editors` id list.
///
/// # Errors
/// When an editor id matches no contributor, or an editor references an
/// unknown affiliation id.
pub fn editors_from_frontmatter(
    frontmatter: &Frontmatter,
    version: SchemaVersion,
) -> Result<Option<Element>> {
    let editors = frontmatter
        .editors()?
        .into_iter()
        .map(|person| Contributor::from_person(person, frontmatter, ContributorRole::Editor))
        .collect::<Result<Vec<_>>>()?;
    Ok(contributors_xml(&editors, version))
}
