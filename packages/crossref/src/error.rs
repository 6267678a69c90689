//! Error types for deposit encoding and decoding.
//!
//! Encoders fail fast with a `DepositError` describing the offending field;
//! the decoder never returns these and degrades to empty values instead.

use thiserror::Error;

/// Main error type for the deposit library.
#[derive(Debug, Error)]
pub enum DepositError {
    /// A field required by the deposit schema was absent.
    #[error("Missing required field: {field}{}", .context.as_ref().map(|c| format!(" in {c}")).unwrap_or_default())]
    MissingField {
        field: String,
        context: Option<String>,
    },

    /// A date component could not be encoded.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// A value has the wrong shape for its field.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// An affiliation or funding source id was not found in the affiliations table.
    #[error("Unable to find affiliation for id \"{0}\"")]
    UnresolvedAffiliation(String),

    /// A resolved award source has neither a name nor an institution.
    #[error("All award sources must have a name; no name for id \"{0}\"")]
    MissingAwardSourceName(String),

    /// A fundref record was built without any funding source.
    #[error("Fundref entry must have at least one source")]
    EmptyFundingSources,

    /// Two records being combined disagree on a shared value.
    #[error("Conflicting values for {field}: \"{first}\" and \"{second}\"")]
    ConflictingValues {
        field: String,
        first: String,
        second: String,
    },

    /// The element is not available in the selected schema version.
    #[error("<{element}> is not supported by schema version {version}")]
    UnsupportedElement { element: String, version: String },

    /// Unknown schema version string.
    #[error("Unknown schema version: '{0}'. Expected one of 4.4.2, 5.3.1")]
    UnknownSchemaVersion(String),

    /// A DOI or DOI prefix could not be recognised.
    #[error("Invalid DOI: '{0}'")]
    InvalidDoi(String),

    /// Invalid depositor email address.
    #[error("Invalid email address: '{0}'")]
    InvalidEmail(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (de)serialization error.
    #[error("YAML parsing failed: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON (de)serialization error.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl DepositError {
    /// Shorthand for a missing field without extra context.
    #[must_use]
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
            context: None,
        }
    }

    /// Shorthand for a missing field inside a named element.
    #[must_use]
    pub fn missing_in(field: impl Into<String>, context: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
            context: Some(context.into()),
        }
    }
}

/// Result type alias for deposit operations.
pub type Result<T> = std::result::Result<T, DepositError>;
