//! Configuration constants, validation functions and deposit settings.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::conference::{EventMetadata, ProceedingsSeries};
use crate::dates::PublicationDate;
use crate::error::{DepositError, Result};
use crate::schema::SchemaVersion;

/// Registrant written to the batch head when none is configured.
pub const DEFAULT_REGISTRANT: &str = "Crossref";

/// Base URL of DOI landing pages; the DOI is appended as a path.
pub const DEFAULT_RESOURCE_BASE: &str = "https://doi.curvenote.com";

/// Prefix used for generated DOIs when none is given.
pub const DEFAULT_DOI_PREFIX: &str = "10.62329";

/// Depositor name used by the CLI when none is configured.
pub const DEFAULT_DEPOSITOR_NAME: &str = "Curvenote";

/// Depositor email used by the CLI when none is configured.
pub const DEFAULT_DEPOSITOR_EMAIL: &str = "doi@curvenote.com";

/// Email pattern: something@host.tld without whitespace.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex"));

/// DOI prefix pattern: `10.` followed by 4 to 9 digits.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DOI_PREFIX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^10\.\d{4,9}$").expect("valid regex"));

/// Validate a depositor email address.
///
/// # Examples
/// ```
/// use crossref_deposit::config::validate_email;
///
/// assert!(validate_email("doi@curvenote.com").is_ok());
/// assert!(validate_email("not an email").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<()> {
    if EMAIL_PATTERN.is_match(email) {
        Ok(())
    } else {
        Err(DepositError::InvalidEmail(email.to_string()))
    }
}

/// Validate a numeric DOI prefix such as `10.62329`.
///
/// # Examples
/// ```
/// use crossref_deposit::config::validate_doi_prefix;
///
/// assert!(validate_doi_prefix("10.25080").is_ok());
/// assert!(validate_doi_prefix("scipy").is_err());
/// ```
pub fn validate_doi_prefix(prefix: &str) -> Result<()> {
    if DOI_PREFIX_PATTERN.is_match(prefix) {
        Ok(())
    } else {
        Err(DepositError::InvalidDoi(prefix.to_string()))
    }
}

/// Immutable table of short organization keys to registrant prefixes.
///
/// The table is passed explicitly to whatever needs it; there is no
/// process-wide mutable registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoiPrefixes {
    prefixes: BTreeMap<String, String>,
}

impl Default for DoiPrefixes {
    fn default() -> Self {
        Self::from_pairs([
            ("curvenote", "10.62329"),
            ("msa", "10.69761"),
            ("scipy", "10.25080"),
            ("physiome", "10.36903"),
        ])
    }
}

impl DoiPrefixes {
    /// Build a table from `(key, prefix)` pairs.
    #[must_use]
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            prefixes: pairs
                .into_iter()
                .map(|(key, prefix)| (key.to_lowercase(), prefix.to_string()))
                .collect(),
        }
    }

    /// Resolve an organization key or a literal prefix.
    ///
    /// Keys are matched case-insensitively. Anything else must itself be a
    /// valid DOI prefix.
    ///
    /// # Examples
    /// ```
    /// use crossref_deposit::config::DoiPrefixes;
    ///
    /// let table = DoiPrefixes::default();
    /// assert_eq!(table.resolve("SciPy").unwrap(), "10.25080");
    /// assert_eq!(table.resolve("10.1234").unwrap(), "10.1234");
    /// assert!(table.resolve("unknown").is_err());
    /// ```
    pub fn resolve(&self, key_or_prefix: &str) -> Result<String> {
        let key = key_or_prefix.trim();
        if let Some(prefix) = self.prefixes.get(&key.to_lowercase()) {
            return Ok(prefix.clone());
        }
        validate_doi_prefix(key)?;
        Ok(key.to_string())
    }

    /// Iterate over `(key, prefix)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes
            .iter()
            .map(|(key, prefix)| (key.as_str(), prefix.as_str()))
    }
}

/// Depositor account details.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DepositorSettings {
    pub name: String,
    pub email: String,
}

/// Journal defaults for journal deposits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JournalSettings {
    pub title: Option<String>,
    pub abbrev_title: Option<String>,
    pub doi: Option<String>,
    pub issn: Option<String>,
}

/// Proceedings details for conference deposits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProceedingsSettings {
    pub title: String,
    pub publisher: String,
    pub publication_date: PublicationDate,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub series: Option<ProceedingsSeries>,
}

/// Event and proceedings details for conference deposits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConferenceSettings {
    pub event: EventMetadata,
    pub proceedings: ProceedingsSettings,
}

/// Settings file contents.
///
/// Every field is optional in the file; CLI flags take precedence over
/// file values, and built-in defaults apply last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DepositSettings {
    pub depositor: Option<DepositorSettings>,
    pub registrant: Option<String>,
    pub schema_version: Option<SchemaVersion>,
    pub resource_base: Option<String>,
    pub doi_prefix: Option<String>,
    pub journal: Option<JournalSettings>,
    pub conference: Option<ConferenceSettings>,
}

impl DepositSettings {
    /// Parse settings from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let settings: Self = serde_yaml_ng::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Check the values that have a fixed shape.
    pub fn validate(&self) -> Result<()> {
        if let Some(depositor) = &self.depositor {
            validate_email(&depositor.email)?;
        }
        if let Some(prefix) = &self.doi_prefix {
            validate_doi_prefix(prefix)?;
        }
        Ok(())
    }

    /// Registrant, falling back to [`DEFAULT_REGISTRANT`].
    #[must_use]
    pub fn registrant(&self) -> &str {
        self.registrant.as_deref().unwrap_or(DEFAULT_REGISTRANT)
    }

    /// Landing page base, falling back to [`DEFAULT_RESOURCE_BASE`].
    #[must_use]
    pub fn resource_base(&self) -> &str {
        self.resource_base.as_deref().unwrap_or(DEFAULT_RESOURCE_BASE)
    }

    /// Schema version, falling back to the newest supported version.
    #[must_use]
    pub fn schema_version(&self) -> SchemaVersion {
        self.schema_version.unwrap_or_default()
    }
}
