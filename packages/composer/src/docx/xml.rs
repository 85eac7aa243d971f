//! XML helpers for navigating WordprocessingML trees.

use roxmltree::Node;

/// WordprocessingML main namespace.
pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Office document relationships namespace (`r:` prefix).
pub const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Package relationships namespace.
pub const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Content types namespace.
pub const CT_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

/// Get the tag name without namespace prefix.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use docx_composer::docx::xml::get_tag_name;
///
/// let xml = r#"<w:body xmlns:w="urn:w"><w:p/></w:body>"#;
/// let doc = Document::parse(xml).unwrap();
/// let p = doc.root_element().first_element_child().unwrap();
/// assert_eq!(get_tag_name(p), "p");
/// ```
pub fn get_tag_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Check if a node is an element with the given local name.
pub fn has_tag(node: Node<'_, '_>, tag: &str) -> bool {
    node.is_element() && get_tag_name(node) == tag
}

/// Find the first child element with the given local name.
pub fn find_child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| has_tag(*child, tag))
}

/// Find all child elements with the given local name.
pub fn find_children<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |child| has_tag(*child, tag))
}

/// Get all element children of a node.
pub fn element_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|child| child.is_element())
}

/// Read an attribute by local name, whatever its namespace.
///
/// WordprocessingML qualifies almost every attribute (`w:val`, `w:styleId`),
/// while package parts (`Relationship`, `Default`) use unqualified ones.
pub fn attribute_value<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attributes()
        .find(|attr| attr.name() == name)
        .map(|attr| attr.value())
}

/// `w:val` of the first child with the given local name.
pub fn child_val<'a>(node: Node<'a, '_>, tag: &str) -> Option<&'a str> {
    find_child(node, tag).and_then(|child| attribute_value(child, "val"))
}

/// Raw source text of a node.
pub fn node_source<'input>(source: &'input str, node: Node<'_, 'input>) -> &'input str {
    &source[node.range()]
}

/// Visible text of a paragraph-like element.
///
/// Concatenates `w:t` text, renders `w:tab` as a tab and `w:br`/`w:cr`
/// as a newline. Deleted text (`w:delText`) is skipped.
pub fn paragraph_text(node: Node<'_, '_>) -> String {
    let mut text = String::new();
    for child in node.descendants().filter(|n| n.is_element()) {
        match get_tag_name(child) {
            "t" => text.push_str(child.text().unwrap_or_default()),
            "tab" if !has_tag_parent(child, "tabs") => text.push('\t'),
            "br" | "cr" => text.push('\n'),
            _ => {}
        }
    }
    text
}

fn has_tag_parent(node: Node<'_, '_>, tag: &str) -> bool {
    node.parent().is_some_and(|parent| has_tag(parent, tag))
}

/// Escape text content for XML.
pub fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape an attribute value for XML (double-quoted).
pub fn escape_attr(value: &str) -> String {
    escape_text(value)
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
