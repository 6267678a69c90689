//! XML utility functions for navigating and extracting data from parsed deposits.

use roxmltree::Node;

/// Get the tag name without namespace prefix.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use crossref_deposit::xml::get_tag_name;
///
/// let xml = r#"<doi_batch xmlns="http://www.crossref.org/schema/5.3.1"><head/></doi_batch>"#;
/// let doc = Document::parse(xml).unwrap();
/// let head = doc.root_element().first_element_child().unwrap();
/// assert_eq!(get_tag_name(head), "head");
/// ```
pub fn get_tag_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Check if a node is an element with a specific tag name.
pub fn has_tag(node: Node<'_, '_>, tag: &str) -> bool {
    node.is_element() && get_tag_name(node) == tag
}

/// Find the first child element with the given tag name.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use crossref_deposit::xml::find_child;
///
/// let xml = r#"<head><doi_batch_id>1</doi_batch_id><timestamp>2</timestamp></head>"#;
/// let doc = Document::parse(xml).unwrap();
/// let root = doc.root_element();
///
/// assert!(find_child(root, "timestamp").is_some());
/// assert!(find_child(root, "registrant").is_none());
/// ```
pub fn find_child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| has_tag(*child, tag))
}

/// Find the first descendant element with the given tag name, in document
/// order. The node itself is not considered.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use crossref_deposit::xml::find_descendant;
///
/// let xml = r#"<paper><titles><title>A</title></titles><title>B</title></paper>"#;
/// let doc = Document::parse(xml).unwrap();
/// let title = find_descendant(doc.root_element(), "title").unwrap();
/// assert_eq!(title.text(), Some("A"));
/// ```
pub fn find_descendant<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.descendants()
        .skip(1)
        .find(|child| has_tag(*child, tag))
}

/// Find all descendant elements with the given tag name, in document order.
pub fn find_descendants<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.descendants()
        .skip(1)
        .filter(move |child| has_tag(*child, tag))
}

/// Join all descendant text nodes with a single space.
///
/// Whitespace-only text nodes (indentation between elements) are skipped.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use crossref_deposit::xml::text_content;
///
/// let xml = "<person_name>\n  <given_name>Nadia</given_name>\n  <surname>Dencheva</surname>\n</person_name>";
/// let doc = Document::parse(xml).unwrap();
/// assert_eq!(text_content(doc.root_element()), "Nadia Dencheva");
/// ```
pub fn text_content(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .filter(|text| !text.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first descendant with the given tag, or an empty string.
pub fn descendant_text(node: Node<'_, '_>, tag: &str) -> String {
    find_descendant(node, tag)
        .map(text_content)
        .unwrap_or_default()
}

/// Get all element children of a node.
///
/// # Returns
/// Iterator over element children (excludes text nodes, comments, etc.)
pub fn element_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|child| child.is_element())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roxmltree::Document;

    #[test]
    fn test_find_descendant_skips_self() {
        let doc = Document::parse("<doi><x><doi>inner</doi></x></doi>").unwrap();
        let found = find_descendant(doc.root_element(), "doi").unwrap();
        assert_eq!(text_content(found), "inner");
    }

    #[test]
    fn test_text_content_nested() {
        let doc = Document::parse("<title>Fast <i>and</i> <b>loose</b></title>").unwrap();
        assert_eq!(text_content(doc.root_element()), "Fast  and loose");
    }

    #[test]
    fn test_descendant_text_missing_is_empty() {
        let doc = Document::parse("<entry/>").unwrap();
        assert_eq!(descendant_text(doc.root_element(), "year"), "");
    }

    #[test]
    fn test_find_descendants_and_children() {
        let doc = Document::parse(
            "<contributors><person_name/><!-- c --><person_name/>text</contributors>",
        )
        .unwrap();
        let root = doc.root_element();
        assert_eq!(find_descendants(root, "person_name").count(), 2);
        assert_eq!(element_children(root).count(), 2);
    }

    #[test]
    fn test_namespaced_tags_match_local_name() {
        let doc = Document::parse(
            r#"<doi_batch xmlns="http://www.crossref.org/schema/5.3.1"><head/></doi_batch>"#,
        )
        .unwrap();
        assert!(find_child(doc.root_element(), "head").is_some());
    }
}
