//! Publication date encoding.
//!
//! Dates are written as optional `<month>`, optional `<day>` and a mandatory
//! `<year>`, each zero-padded, under an element carrying `media_type`.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DepositError, Result};
use crate::tree::{text_element, Element};

/// Media type attribute on date elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Published online (default).
    #[default]
    Online,
    /// Published in print.
    Print,
    /// Any other medium.
    Other,
}

impl MediaType {
    /// Attribute value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Print => "print",
            Self::Other => "other",
        }
    }
}

/// A date component supplied either as a number or as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DatePart {
    /// Numeric component, e.g. `5`.
    Number(i64),
    /// Textual component, e.g. `"05"` or `"Nov"`.
    Text(String),
}

impl fmt::Display for DatePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for DatePart {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for DatePart {
    fn from(value: i32) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<u32> for DatePart {
    fn from(value: u32) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<&str> for DatePart {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A possibly partial publication date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationDate {
    /// Four character year.
    pub year: DatePart,

    /// Month, 1-12.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<DatePart>,

    /// Day of month, 1-31.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<DatePart>,

    /// Media type, `online` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
}

impl PublicationDate {
    /// A year-only date.
    #[must_use]
    pub fn year(year: impl Into<DatePart>) -> Self {
        Self {
            year: year.into(),
            month: None,
            day: None,
            media_type: None,
        }
    }

    /// A year and month.
    #[must_use]
    pub fn year_month(year: impl Into<DatePart>, month: impl Into<DatePart>) -> Self {
        Self {
            month: Some(month.into()),
            ..Self::year(year)
        }
    }

    /// A full calendar date.
    #[must_use]
    pub fn ymd(
        year: impl Into<DatePart>,
        month: impl Into<DatePart>,
        day: impl Into<DatePart>,
    ) -> Self {
        Self {
            day: Some(day.into()),
            ..Self::year_month(year, month)
        }
    }

    /// Set the media type.
    #[must_use]
    pub fn with_media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = Some(media_type);
        self
    }

    /// Parse a frontmatter date string.
    ///
    /// Accepts `YYYY`, `YYYY-MM`, `YYYY-MM-DD` and RFC 3339 timestamps.
    /// Timestamps are reduced to their UTC calendar date.
    ///
    /// # Examples
    /// ```
    /// use crossref_deposit::dates::PublicationDate;
    ///
    /// assert_eq!(PublicationDate::parse("2022-07"), Some(PublicationDate::year_month(2022, 7)));
    /// assert_eq!(PublicationDate::parse("not a date"), None);
    /// ```
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            return Some(date.into());
        }
        if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
            return Some(timestamp.with_timezone(&Utc).into());
        }
        let mut parts = value.split('-');
        let year = parts.next().filter(|y| y.len() == 4)?.parse::<i32>().ok()?;
        match (parts.next(), parts.next()) {
            (None, _) => Some(Self::year(year)),
            (Some(month), None) => {
                let month = month.parse::<u32>().ok().filter(|m| (1..=12).contains(m))?;
                Some(Self::year_month(year, month))
            }
            _ => None,
        }
    }
}

impl From<NaiveDate> for PublicationDate {
    fn from(date: NaiveDate) -> Self {
        Self::ymd(date.year(), date.month(), date.day())
    }
}

impl From<DateTime<Utc>> for PublicationDate {
    fn from(instant: DateTime<Utc>) -> Self {
        instant.date_naive().into()
    }
}

/// Zero-pad a month or day component, rejecting anything wider than two characters.
fn padded(part: &DatePart, field: &str) -> Result<String> {
    let raw = part.to_string();
    if raw.len() > 2 {
        return Err(DepositError::InvalidDate(format!(
            "date.{field} must be a 2 digit string"
        )));
    }
    Ok(format!("{raw:0>2}"))
}

/// True when every character is an ASCII digit. Signs and spaces are rejected.
fn is_plain_decimal(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

/// Check a padded component is a plain decimal in range.
fn check_range(value: &str, field: &str, low: u32, high: u32) -> Result<()> {
    let in_range = is_plain_decimal(value)
        && value
            .parse::<u32>()
            .is_ok_and(|n| (low..=high).contains(&n));
    if in_range {
        Ok(())
    } else {
        Err(DepositError::InvalidDate(format!(
            "date.{field} must be a 2 digit string between \"{low:02}\" and \"{high:02}\""
        )))
    }
}

/// Encode a date under the given tag name.
///
/// Returns `Ok(None)` when no date is supplied so that callers can decide
/// whether absence is an error.
///
/// # Arguments
/// * `tag` - Element name, e.g. `publication_date` or `posted_date`
/// * `date` - Date to encode
///
/// # Errors
/// `DepositError::InvalidDate` when the year is not four characters, the
/// month is outside 1-12, the day is outside 1-31, or a component is not a
/// plain decimal.
pub fn date_xml(tag: &str, date: Option<&PublicationDate>) -> Result<Option<Element>> {
    let Some(date) = date else {
        return Ok(None);
    };

    let month = date.month.as_ref().map(|m| padded(m, "month")).transpose()?;
    let day = date.day.as_ref().map(|d| padded(d, "day")).transpose()?;
    let year = date.year.to_string();
    if year.len() != 4 || !is_plain_decimal(&year) {
        return Err(DepositError::InvalidDate(
            "date.year must be a 4 digit string".to_string(),
        ));
    }
    if let Some(day) = &day {
        check_range(day, "day", 1, 31)?;
    }
    // Seasons and quarters have their own codes in the schema; they are not inferred here.
    if let Some(month) = &month {
        check_range(month, "month", 1, 12)?;
    }

    let media_type = date.media_type.unwrap_or_default();
    Ok(Some(
        Element::new(tag)
            .with_attribute("media_type", media_type.as_str())
            .with_children([
                month.map(|m| text_element("month", m)),
                day.map(|d| text_element("day", d)),
                Some(text_element("year", year)),
            ]),
    ))
}

/// Encode a `<publication_date>`.
pub fn publication_date_xml(date: Option<&PublicationDate>) -> Result<Option<Element>> {
    date_xml("publication_date", date)
}

/// Encode a list of publication dates, failing on the first invalid one.
pub fn publication_dates_xml(dates: &[PublicationDate]) -> Result<Vec<Element>> {
    dates
        .iter()
        .filter_map(|date| publication_date_xml(Some(date)).transpose())
        .collect()
}
