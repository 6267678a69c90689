//! Supported Crossref deposit schema versions.
//!
//! Each version fixes the namespace declarations on `doi_batch`, the
//! `xsi:schemaLocation` value, and a handful of element-level differences
//! that encoders consult instead of branching on version strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DepositError, Result};

/// XML Schema instance namespace.
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// JATS namespace used for abstracts.
pub const JATS_NAMESPACE: &str = "http://www.ncbi.nlm.nih.gov/JATS1";

/// Access indicators (license) namespace.
pub const AI_NAMESPACE: &str = "http://www.crossref.org/AccessIndicators.xsd";

/// MathML namespace.
pub const MML_NAMESPACE: &str = "http://www.w3.org/1998/Math/MathML";

/// Fundref namespace.
pub const FR_NAMESPACE: &str = "http://www.crossref.org/fundref.xsd";

/// Relations namespace, declared locally on relation programs.
pub const REL_NAMESPACE: &str = "http://www.crossref.org/relations.xsd";

/// How contributor affiliations are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AffiliationStyle {
    /// One `<affiliation>` text element per affiliation.
    Flat,
    /// `<affiliations><institution>…</institution></affiliations>`.
    Institutions,
}

/// A supported deposit schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SchemaVersion {
    /// Crossref schema 4.4.2.
    #[serde(rename = "4.4.2")]
    V4_4_2,

    /// Crossref schema 5.3.1.
    #[default]
    #[serde(rename = "5.3.1")]
    V5_3_1,
}

impl SchemaVersion {
    /// All supported versions, oldest first.
    pub const ALL: [SchemaVersion; 2] = [SchemaVersion::V4_4_2, SchemaVersion::V5_3_1];

    /// Version string used in the `version` attribute.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V4_4_2 => "4.4.2",
            Self::V5_3_1 => "5.3.1",
        }
    }

    /// Default (unprefixed) namespace of the deposit schema.
    #[must_use]
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::V4_4_2 => "http://www.crossref.org/schema/4.4.2",
            Self::V5_3_1 => "http://www.crossref.org/schema/5.3.1",
        }
    }

    /// Value of the `xsi:schemaLocation` attribute.
    #[must_use]
    pub fn schema_location(&self) -> &'static str {
        match self {
            Self::V4_4_2 => {
                "http://www.crossref.org/schema/4.4.2 http://www.crossref.org/schemas/crossref4.4.2.xsd"
            }
            Self::V5_3_1 => {
                "http://www.crossref.org/schema/5.3.1 http://www.crossref.org/schemas/crossref5.3.1.xsd"
            }
        }
    }

    /// Namespace declarations placed on `doi_batch`, as attribute pairs.
    #[must_use]
    pub fn namespaces(&self) -> Vec<(&'static str, &'static str)> {
        let mut namespaces = vec![
            ("xmlns", self.namespace()),
            ("xmlns:xsi", XSI_NAMESPACE),
            ("xmlns:jats", JATS_NAMESPACE),
            ("xmlns:ai", AI_NAMESPACE),
        ];
        if *self == Self::V5_3_1 {
            namespaces.push(("xmlns:mml", MML_NAMESPACE));
            namespaces.push(("xmlns:fr", FR_NAMESPACE));
        }
        namespaces
    }

    /// Whether `doi_batch` declares the given prefix for this version.
    #[must_use]
    pub fn declares_prefix(&self, prefix: &str) -> bool {
        let attribute = format!("xmlns:{prefix}");
        self.namespaces().iter().any(|(name, _)| *name == attribute)
    }

    /// How contributor affiliations are written.
    #[must_use]
    pub fn affiliation_style(&self) -> AffiliationStyle {
        match self {
            Self::V4_4_2 => AffiliationStyle::Flat,
            Self::V5_3_1 => AffiliationStyle::Institutions,
        }
    }

    /// Whether `proceedings_series_metadata` may be emitted.
    #[must_use]
    pub fn supports_proceedings_series(&self) -> bool {
        matches!(self, Self::V5_3_1)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaVersion {
    type Err = DepositError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|version| version.as_str() == s.trim())
            .ok_or_else(|| DepositError::UnknownSchemaVersion(s.to_string()))
    }
}
