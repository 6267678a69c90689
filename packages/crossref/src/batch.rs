//! Deposit batch envelope.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::Utc;

use crate::config::DEFAULT_REGISTRANT;
use crate::error::Result;
use crate::schema::SchemaVersion;
use crate::tree::{text_element, Element};

/// The account submitting the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Depositor {
    pub name: String,
    pub email: String,
}

impl Depositor {
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Envelope settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoiBatchOptions {
    pub id: String,
    /// Seconds since the epoch; the current time when unset.
    pub timestamp: Option<i64>,
    pub depositor: Depositor,
    /// Defaults to [`DEFAULT_REGISTRANT`].
    pub registrant: Option<String>,
    pub version: SchemaVersion,
}

impl DoiBatchOptions {
    /// Options with the default registrant, current time and newest schema.
    #[must_use]
    pub fn new(id: impl Into<String>, depositor: Depositor) -> Self {
        Self {
            id: id.into(),
            timestamp: None,
            depositor,
            registrant: None,
            version: SchemaVersion::default(),
        }
    }

    /// Set the timestamp in seconds.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the registrant.
    #[must_use]
    pub fn with_registrant(mut self, registrant: impl Into<String>) -> Self {
        self.registrant = Some(registrant.into());
        self
    }

    /// Set the schema version.
    #[must_use]
    pub fn with_version(mut self, version: SchemaVersion) -> Self {
        self.version = version;
        self
    }
}

/// An assembled `<doi_batch>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoiBatch {
    tree: Element,
}

impl DoiBatch {
    /// Assemble the envelope around one or more body records.
    ///
    /// # Examples
    /// ```
    /// use crossref_deposit::batch::{Depositor, DoiBatch, DoiBatchOptions};
    /// use crossref_deposit::tree::Element;
    ///
    /// let opts = DoiBatchOptions::new("batch-1", Depositor::new("Curve Note", "crossref@curvenote.com"))
    ///     .with_timestamp(1659353793);
    /// let batch = DoiBatch::new(&opts, [Element::new("posted_content")]);
    /// assert_eq!(batch.body().unwrap().children.len(), 1);
    /// assert!(batch.to_xml().unwrap().starts_with("<doi_batch "));
    /// ```
    #[must_use]
    pub fn new(opts: &DoiBatchOptions, body: impl IntoIterator<Item = Element>) -> Self {
        let timestamp = opts.timestamp.unwrap_or_else(|| Utc::now().timestamp());
        let registrant = opts.registrant.as_deref().unwrap_or(DEFAULT_REGISTRANT);
        let version = opts.version;

        let mut root = Element::new("doi_batch")
            .with_attribute("version", version.as_str())
            .with_attribute("xsi:schemaLocation", version.schema_location());
        for (name, uri) in version.namespaces() {
            root = root.with_attribute(name, uri);
        }

        let head = Element::new("head").with_children([
            text_element("doi_batch_id", opts.id.as_str()),
            text_element("timestamp", timestamp.to_string()),
            Element::new("depositor").with_children([
                text_element("depositor_name", opts.depositor.name.as_str()),
                text_element("email_address", opts.depositor.email.as_str()),
            ]),
            text_element("registrant", registrant),
        ]);
        let body = Element::new("body").with_children(body);
        tracing::debug!(
            id = %opts.id,
            version = %version,
            records = body.children.len(),
            "Assembled deposit batch"
        );

        Self {
            tree: root.with_children([head, body]),
        }
    }

    /// The whole `<doi_batch>` tree.
    #[must_use]
    pub fn tree(&self) -> &Element {
        &self.tree
    }

    /// The `<body>` element.
    #[must_use]
    pub fn body(&self) -> Option<&Element> {
        self.tree.child("body")
    }

    /// Serialize without any further transformation.
    pub fn to_xml(&self) -> Result<String> {
        self.tree.to_xml()
    }

    /// Write the serialized batch to `path` atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_xml()?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "deposit.xml".to_string());
        let temp_file = path.with_file_name(format!(".{file_name}.tmp"));

        // Write to temp file first, then sync and rename
        {
            let mut file = File::create(&temp_file)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }

        // On Windows, rename fails if the destination already exists
        #[cfg(target_os = "windows")]
        if path.exists() {
            fs::remove_file(path)?;
        }

        fs::rename(&temp_file, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn options() -> DoiBatchOptions {
        DoiBatchOptions::new(
            "some.id12345",
            Depositor::new("Curve Note", "crossref@curvenote.com"),
        )
        .with_timestamp(1659353793)
    }

    #[test]
    fn test_head_order_and_values() {
        let batch = DoiBatch::new(&options(), []);
        let head = batch.tree().child("head").unwrap();
        assert_eq!(
            head.to_xml().unwrap(),
            concat!(
                "<head><doi_batch_id>some.id12345</doi_batch_id><timestamp>1659353793</timestamp>",
                "<depositor><depositor_name>Curve Note</depositor_name>",
                "<email_address>crossref@curvenote.com</email_address></depositor>",
                "<registrant>Crossref</registrant></head>"
            )
        );
    }

    #[test]
    fn test_namespaces_follow_version() {
        let newer = DoiBatch::new(&options(), []);
        assert_eq!(newer.tree().attribute("version"), Some("5.3.1"));
        assert_eq!(
            newer.tree().attribute("xmlns"),
            Some("http://www.crossref.org/schema/5.3.1")
        );
        assert!(newer.tree().attribute("xmlns:fr").is_some());

        let older = DoiBatch::new(&options().with_version(SchemaVersion::V4_4_2), []);
        assert_eq!(
            older.tree().attribute("xsi:schemaLocation"),
            Some("http://www.crossref.org/schema/4.4.2 http://www.crossref.org/schemas/crossref4.4.2.xsd")
        );
        assert!(older.tree().attribute("xmlns:mml").is_none());
        assert!(older.tree().attribute("xmlns:jats").is_some());
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let body = || vec![Element::new("posted_content"), Element::new("posted_content")];
        let a = DoiBatch::new(&options(), body()).to_xml().unwrap();
        let b = DoiBatch::new(&options(), body()).to_xml().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_registrant_and_default_timestamp() {
        let opts = DoiBatchOptions::new("id", Depositor::new("N", "n@example.com")).with_registrant("Curvenote");
        let before = Utc::now().timestamp();
        let batch = DoiBatch::new(&opts, []);
        let timestamp: i64 = batch.tree().find("timestamp").unwrap().text_content().parse().unwrap();
        assert!(timestamp >= before);
        assert_eq!(batch.tree().find("registrant").unwrap().text_content(), "Curvenote");
    }

    #[test]
    fn test_body_accessor() {
        let batch = DoiBatch::new(&options(), [Element::new("journal")]);
        let body = batch.body().unwrap();
        assert_eq!(body.elements().next().unwrap().name, "journal");
    }

    #[test]
    fn test_save_writes_serialized_batch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deposit.xml");
        let batch = DoiBatch::new(&options(), [Element::new("posted_content")]);
        batch.save(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), batch.to_xml().unwrap());
        assert!(!dir.path().join(".deposit.xml.tmp").exists());
    }
}
