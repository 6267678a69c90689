//! Minimal tagged tree used by every encoder.
//!
//! Encoders build [`Element`] values and attach optional children without
//! branching: children are passed as an iterator of anything implementing
//! [`IntoChild`], and `None` entries are dropped before attachment.
//!
//! # Example
//!
//! ```
//! use crossref_deposit::tree::{element, text_element};
//!
//! let month: Option<&str> = None;
//! let date = element(
//!     "publication_date",
//!     [("media_type", "online")],
//!     [month.map(|m| text_element("month", m)), Some(text_element("year", "2023"))],
//! );
//! assert_eq!(
//!     date.to_xml().unwrap(),
//!     r#"<publication_date media_type="online"><year>2023</year></publication_date>"#
//! );
//! ```

use std::collections::BTreeMap;
use std::io::{self, Write};

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::Result;

/// A child of an element: either text or a nested element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Character data.
    Text(String),
    /// Nested element.
    Element(Element),
}

impl Node {
    /// Return the element if this node is one.
    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            Self::Text(_) => None,
        }
    }
}

/// A tagged tree node with attributes and ordered children.
///
/// Attributes are kept sorted by name so that serialization is
/// deterministic regardless of insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Qualified tag name, e.g. `doi_data` or `jats:abstract`.
    pub name: String,

    /// Attribute name to value.
    pub attributes: BTreeMap<String, String>,

    /// Ordered children.
    pub children: Vec<Node>,
}

/// Conversion into an optional child node.
///
/// Implemented for elements, nodes and `Option`s of either so that call
/// sites can pass conditional children directly.
pub trait IntoChild {
    /// Convert into a child, or `None` to skip it.
    fn into_child(self) -> Option<Node>;
}

impl IntoChild for Node {
    fn into_child(self) -> Option<Node> {
        Some(self)
    }
}

impl IntoChild for Element {
    fn into_child(self) -> Option<Node> {
        Some(Node::Element(self))
    }
}

impl<T: IntoChild> IntoChild for Option<T> {
    fn into_child(self) -> Option<Node> {
        self.and_then(IntoChild::into_child)
    }
}

impl Element {
    /// Create an element with no attributes or children.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Append a text child.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Append a single child if present.
    #[must_use]
    pub fn with_child(mut self, child: impl IntoChild) -> Self {
        self.push(child);
        self
    }

    /// Append children, skipping absent ones.
    #[must_use]
    pub fn with_children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoChild,
    {
        self.extend(children);
        self
    }

    /// Append a child in place if present.
    pub fn push(&mut self, child: impl IntoChild) {
        if let Some(node) = child.into_child() {
            self.children.push(node);
        }
    }

    /// Append children in place, skipping absent ones.
    pub fn extend<I>(&mut self, children: I)
    where
        I: IntoIterator,
        I::Item: IntoChild,
    {
        self.children
            .extend(children.into_iter().filter_map(IntoChild::into_child));
    }

    /// Get an attribute value.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Iterate over element children (text nodes excluded).
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Find the first direct child element with the given name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|child| child.name == name)
    }

    /// Find the first descendant element with the given name (depth-first,
    /// document order). The element itself is not considered.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Element> {
        let mut stack: Vec<&Element> = self.elements().collect();
        stack.reverse();
        while let Some(current) = stack.pop() {
            if current.name == name {
                return Some(current);
            }
            let before = stack.len();
            stack.extend(current.elements());
            stack[before..].reverse();
        }
        None
    }

    /// Concatenate all descendant text nodes.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Serialize to compact XML text.
    ///
    /// No declaration, indentation or other transformation is applied.
    /// Elements without children are written self-closing.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::with_capacity(1024));
        write_element(&mut writer, self)?;
        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }
}

fn collect_text(element: &Element, out: &mut String) {
    for child in &element.children {
        match child {
            Node::Text(text) => out.push_str(text),
            Node::Element(nested) => collect_text(nested, out),
        }
    }
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &Element) -> io::Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (name, value) in &element.attributes {
        start.push_attribute((name.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        match child {
            Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
            Node::Element(nested) => write_element(writer, nested)?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}

/// Build an element from a name, attribute pairs and optional children.
///
/// # Arguments
/// * `name` - Tag name
/// * `attributes` - Attribute name/value pairs
/// * `children` - Children; `None` entries are dropped
#[must_use]
pub fn element<'a, A, C>(name: &str, attributes: A, children: C) -> Element
where
    A: IntoIterator<Item = (&'a str, &'a str)>,
    C: IntoIterator,
    C::Item: IntoChild,
{
    let mut el = Element::new(name);
    for (key, value) in attributes {
        el.attributes.insert(key.to_string(), value.to_string());
    }
    el.with_children(children)
}

/// Build an element with a single text child.
///
/// # Examples
/// ```
/// use crossref_deposit::tree::text_element;
///
/// let doi = text_element("doi", "10.1234/abcd");
/// assert_eq!(doi.to_xml().unwrap(), "<doi>10.1234/abcd</doi>");
/// ```
#[must_use]
pub fn text_element(name: &str, text: impl Into<String>) -> Element {
    Element::new(name).with_text(text)
}

/// Build a text node.
#[must_use]
pub fn text(value: impl Into<String>) -> Node {
    Node::Text(value.into())
}
