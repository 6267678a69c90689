//! Crossref Deposit - Encode document metadata as Crossref deposit XML.
//!
//! This crate builds `<doi_batch>` deposit documents for preprints, journal
//! articles, conference papers and datasets from structured frontmatter, and
//! reads deposit documents back into structured records.
//!
//! # Example
//!
//! ```
//! use crossref_deposit::batch::{Depositor, DoiBatch, DoiBatchOptions};
//! use crossref_deposit::common::{DocumentInput, EncodeOptions};
//! use crossref_deposit::frontmatter::Frontmatter;
//! use crossref_deposit::preprint::preprint_xml_from_frontmatter;
//! use crossref_deposit::reader::DepositReader;
//!
//! let fm = Frontmatter::from_yaml("title: A preprint\ndoi: 10.62329/ABCD1234\ndate: 2024-03-01\n").unwrap();
//! let record = preprint_xml_from_frontmatter(&DocumentInput::new(&fm), &EncodeOptions::default()).unwrap();
//!
//! let opts = DoiBatchOptions::new("batch-1", Depositor::new("Curvenote", "doi@curvenote.com"));
//! let xml = DoiBatch::new(&opts, [record]).to_xml().unwrap();
//!
//! let entries = DepositReader::new(&xml).entries();
//! assert_eq!(entries[0].kind(), "posted_content");
//! ```
//!
//! # Architecture
//!
//! - [`tree`]: Element tree and serialization
//! - [`schema`]: Supported schema versions and their namespaces
//! - [`dates`], [`doi`]: Publication dates, DOI normalization and generation
//! - [`contributors`], [`funding`], [`citations`], [`common`]: Shared blocks
//! - [`preprint`], [`journal`], [`conference`], [`dataset`]: Record encoders
//! - [`batch`]: The `<doi_batch>` envelope
//! - [`reader`], [`xml`]: Decoding deposits
//! - [`frontmatter`]: Input metadata model
//! - [`config`]: Constants, validation and the settings file
//! - [`error`]: Error types and Result alias
//! - [`cli`]: Command-line interface

pub mod batch;
pub mod citations;
pub mod cli;
pub mod common;
pub mod conference;
pub mod config;
pub mod contributors;
pub mod dataset;
pub mod dates;
pub mod doi;
pub mod error;
pub mod frontmatter;
pub mod funding;
pub mod journal;
pub mod preprint;
pub mod reader;
pub mod schema;
pub mod tree;
pub mod xml;

// Re-export commonly used items
pub use batch::{Depositor, DoiBatch, DoiBatchOptions};
pub use common::{DocumentInput, EncodeOptions};
pub use error::{DepositError, Result};
pub use frontmatter::Frontmatter;
pub use reader::{DecodedDeposit, DecodedEntry, DecodedHead, DepositReader};
pub use schema::SchemaVersion;
pub use tree::{Element, Node};
