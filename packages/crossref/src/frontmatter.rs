//! Document frontmatter supplied by the document loader.
//!
//! The loader hands over an already-structured record (YAML or JSON); this
//! module only models it and offers a few lookups used by the encoders.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer};

use crate::dates::PublicationDate;
use crate::error::{DepositError, Result};

/// Matches Creative Commons SPDX identifiers such as `CC-BY-NC-SA-4.0`.
/// Captures: (1) license elements, (2) version.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static CC_SPDX_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^CC-(BY(?:-NC)?(?:-ND|-SA)?)-(\d\.\d)$").expect("valid regex")
});

/// Accept a string or a number and keep it as text.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Text(text) => text,
        Scalar::Integer(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
    }))
}

/// A name split into its parts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParsedName {
    pub given: Option<String>,
    pub family: Option<String>,
    pub literal: Option<String>,
}

impl ParsedName {
    /// Split a display name into given and family parts.
    ///
    /// `"Family, Given"` is honoured; otherwise the last word is the family name.
    ///
    /// # Examples
    /// ```
    /// use crossref_deposit::frontmatter::ParsedName;
    ///
    /// let name = ParsedName::from_literal("Nadia Dencheva");
    /// assert_eq!(name.given.as_deref(), Some("Nadia"));
    /// assert_eq!(name.family.as_deref(), Some("Dencheva"));
    /// ```
    #[must_use]
    pub fn from_literal(literal: &str) -> Self {
        let literal = literal.trim();
        let (given, family) = match literal.split_once(',') {
            Some((family, given)) => (given.trim(), family.trim()),
            None => match literal.rsplit_once(char::is_whitespace) {
                Some((given, family)) => (given.trim(), family.trim()),
                None => ("", literal),
            },
        };
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            given: non_empty(given),
            family: non_empty(family),
            literal: non_empty(literal),
        }
    }

    /// Fill in whichever of literal/given/family can be derived from the others.
    #[must_use]
    pub fn completed(&self) -> Self {
        match (&self.given, &self.family, &self.literal) {
            (None, None, Some(literal)) => Self::from_literal(literal),
            (given, family, literal) => {
                let joined = [given.as_deref(), family.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ");
                Self {
                    given: given.clone(),
                    family: family.clone(),
                    literal: literal
                        .clone()
                        .or_else(|| (!joined.is_empty()).then_some(joined)),
                }
            }
        }
    }
}

/// A person's name as written in frontmatter: a plain string or its parts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PersonName {
    Literal(String),
    Parsed(ParsedName),
}

impl Default for PersonName {
    fn default() -> Self {
        Self::Parsed(ParsedName::default())
    }
}

impl PersonName {
    /// Name with given, family and literal parts filled in where possible.
    #[must_use]
    pub fn parsed(&self) -> ParsedName {
        match self {
            Self::Literal(literal) => ParsedName::from_literal(literal),
            Self::Parsed(parts) => parts.completed(),
        }
    }
}

/// An author, editor or other contributor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Person {
    pub id: Option<String>,
    pub name: PersonName,
    /// Affiliation ids, resolved against [`Frontmatter::affiliations`].
    pub affiliations: Vec<String>,
    pub orcid: Option<String>,
    pub equal_contributor: bool,
    pub roles: Vec<String>,
    pub email: Option<String>,
}

/// An institution referenced by people and funding awards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Affiliation {
    pub id: String,
    pub name: Option<String>,
    pub institution: Option<String>,
    pub department: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub ror: Option<String>,
    pub isni: Option<String>,
    pub ringgold: Option<String>,
    /// Funder registry DOI.
    pub doi: Option<String>,
}

impl Affiliation {
    /// Display name: the affiliation name, else the institution name.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or(self.institution.as_deref())
            .filter(|name| !name.trim().is_empty())
    }

    /// City, state and country joined with commas.
    #[must_use]
    pub fn place(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.city, &self.state, &self.country]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .filter(|part| !part.trim().is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

/// License details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LicenseContent {
    pub id: Option<String>,
    pub name: Option<String>,
    pub url: Option<String>,
    #[serde(alias = "CC")]
    pub cc: bool,
}

/// A license: a bare SPDX id or a detailed record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum License {
    Spdx(String),
    Detailed {
        #[serde(default)]
        content: Option<LicenseContent>,
    },
}

impl License {
    /// License URL, only for Creative Commons licenses.
    ///
    /// # Examples
    /// ```
    /// use crossref_deposit::frontmatter::License;
    ///
    /// let license = License::Spdx("CC-BY-4.0".to_string());
    /// assert_eq!(license.cc_url().as_deref(), Some("https://creativecommons.org/licenses/by/4.0/"));
    /// assert_eq!(License::Spdx("MIT".to_string()).cc_url(), None);
    /// ```
    #[must_use]
    pub fn cc_url(&self) -> Option<String> {
        match self {
            Self::Spdx(id) => cc_url_from_spdx(id),
            Self::Detailed { content } => {
                let content = content.as_ref()?;
                let from_id = content.id.as_deref().and_then(cc_url_from_spdx);
                if content.cc {
                    content.url.clone().or(from_id)
                } else {
                    from_id
                }
            }
        }
    }
}

/// Canonical URL for a Creative Commons SPDX id.
fn cc_url_from_spdx(id: &str) -> Option<String> {
    let id = id.trim();
    if id.eq_ignore_ascii_case("CC0-1.0") {
        return Some("https://creativecommons.org/publicdomain/zero/1.0/".to_string());
    }
    let caps = CC_SPDX_PATTERN.captures(id)?;
    Some(format!(
        "https://creativecommons.org/licenses/{}/{}/",
        caps[1].to_lowercase(),
        &caps[2]
    ))
}

/// Volume, issue and page information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Biblio {
    #[serde(deserialize_with = "string_or_number")]
    pub volume: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub issue: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub first_page: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub last_page: Option<String>,
}

/// Where the work appears: a journal, conference or collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Venue {
    pub title: Option<String>,
    pub short_title: Option<String>,
    pub doi: Option<String>,
    pub issn: Option<String>,
    pub url: Option<String>,
}

/// A funding award.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Award {
    /// Award number.
    pub id: Option<String>,
    pub name: Option<String>,
    /// Affiliation ids of the funders.
    pub sources: Vec<String>,
    pub recipients: Vec<String>,
}

/// A funding statement with its awards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Funding {
    pub statement: Option<String>,
    pub awards: Vec<Award>,
}

/// Frontmatter of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Frontmatter {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub short_title: Option<String>,
    pub authors: Vec<Person>,
    /// Ids of editors, resolved against `contributors` then `authors`.
    pub editors: Vec<String>,
    pub contributors: Vec<Person>,
    pub affiliations: Vec<Affiliation>,
    pub license: Option<License>,
    pub doi: Option<String>,
    /// `YYYY`, `YYYY-MM`, `YYYY-MM-DD` or an RFC 3339 timestamp.
    #[serde(deserialize_with = "string_or_number")]
    pub date: Option<String>,
    pub biblio: Option<Biblio>,
    pub venue: Option<Venue>,
    pub funding: Vec<Funding>,
    /// Plain-text abstract; paragraphs separated by blank lines.
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
}

impl Frontmatter {
    /// Parse frontmatter from YAML.
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Parse frontmatter from JSON.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load frontmatter from a `.json`, `.yml` or `.yaml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&text),
            _ => Self::from_yaml(&text),
        }
    }

    /// Title, ignoring blank values.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// The document date, if present and parseable.
    #[must_use]
    pub fn publication_date(&self) -> Option<PublicationDate> {
        let raw = self.date.as_deref()?;
        let parsed = PublicationDate::parse(raw);
        if parsed.is_none() {
            tracing::warn!(date = %raw, "Unrecognised frontmatter date ignored");
        }
        parsed
    }

    /// Look up an affiliation by id.
    #[must_use]
    pub fn affiliation(&self, id: &str) -> Option<&Affiliation> {
        self.affiliations.iter().find(|aff| aff.id == id)
    }

    /// Resolve a person's affiliation ids.
    ///
    /// # Errors
    /// `DepositError::UnresolvedAffiliation` for the first unknown id.
    pub fn resolve_affiliations(&self, person: &Person) -> Result<Vec<Affiliation>> {
        person
            .affiliations
            .iter()
            .map(|id| {
                self.affiliation(id)
                    .cloned()
                    .ok_or_else(|| DepositError::UnresolvedAffiliation(id.clone()))
            })
            .collect()
    }

    /// Resolve the `editors` id list.
    ///
    /// Ids are looked up in `contributors` first, then in `authors`.
    ///
    /// # Errors
    /// `DepositError::InvalidValue` when an editor id matches no person.
    pub fn editors(&self) -> Result<Vec<&Person>> {
        self.editors
            .iter()
            .map(|id| {
                self.contributors
                    .iter()
                    .chain(&self.authors)
                    .find(|person| person.id.as_deref() == Some(id.as_str()))
                    .ok_or_else(|| DepositError::InvalidValue {
                        field: "editors".to_string(),
                        message: format!("no contributor with id \"{id}\""),
                    })
            })
            .collect()
    }

    /// First and last page from `biblio`.
    #[must_use]
    pub fn pages(&self) -> Option<(String, Option<String>)> {
        let biblio = self.biblio.as_ref()?;
        let first = biblio.first_page.clone()?;
        Some((first, biblio.last_page.clone()))
    }
}
