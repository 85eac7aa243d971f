//! Style table lookups and style import between documents.

use std::collections::{HashMap, HashSet};

use roxmltree::Document;

use super::package::insert_before_close;
use super::xml::{attribute_value, child_val, element_children, find_children, node_source};
use crate::error::Result;

/// A `w:style` definition copied from a styles part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleDefinition {
    pub xml: String,
    /// Styles this one needs: `basedOn`, `next` and `link` targets.
    pub dependencies: Vec<String>,
}

/// Map of style id to display name (`w:name`).
pub fn style_names(styles_xml: &str) -> Result<HashMap<String, String>> {
    let doc = Document::parse(styles_xml)?;
    let mut names = HashMap::new();
    for style in find_children(doc.root_element(), "style") {
        let Some(id) = attribute_value(style, "styleId") else {
            continue;
        };
        if let Some(name) = child_val(style, "name") {
            names.insert(id.to_string(), name.to_string());
        }
    }
    Ok(names)
}

/// All style definitions of a styles part, keyed by style id.
pub fn style_definitions(styles_xml: &str) -> Result<HashMap<String, StyleDefinition>> {
    let doc = Document::parse(styles_xml)?;
    let mut definitions = HashMap::new();
    for style in find_children(doc.root_element(), "style") {
        let Some(id) = attribute_value(style, "styleId") else {
            continue;
        };
        let dependencies = element_children(style)
            .filter(|child| matches!(child.tag_name().name(), "basedOn" | "next" | "link"))
            .filter_map(|child| attribute_value(child, "val"))
            .filter(|value| !value.is_empty() && *value != id)
            .map(str::to_string)
            .collect();
        definitions.insert(
            id.to_string(),
            StyleDefinition {
                xml: node_source(styles_xml, style).to_string(),
                dependencies,
            },
        );
    }
    Ok(definitions)
}

/// Requested ids plus their transitive dependencies, dependencies first.
fn with_dependencies(
    requested: &[String],
    definitions: &HashMap<String, StyleDefinition>,
) -> Vec<String> {
    fn visit(
        id: &str,
        definitions: &HashMap<String, StyleDefinition>,
        seen: &mut HashSet<String>,
        ordered: &mut Vec<String>,
    ) {
        if !seen.insert(id.to_string()) {
            return;
        }
        if let Some(definition) = definitions.get(id) {
            for dependency in &definition.dependencies {
                visit(dependency, definitions, seen, ordered);
            }
            ordered.push(id.to_string());
        }
    }

    let mut seen = HashSet::new();
    let mut ordered = Vec::new();
    for id in requested {
        visit(id, definitions, &mut seen, &mut ordered);
    }
    ordered
}

/// Definitions of the requested styles, and their dependencies, that
/// `target_xml` does not define yet.
///
/// Styles already defined in the target win; the source definition is
/// only used when the id is unknown to the target. Dependencies come first.
pub fn missing_styles(target_xml: &str, source_xml: &str, requested: &[String]) -> Result<Vec<String>> {
    if requested.is_empty() {
        return Ok(Vec::new());
    }
    let source = style_definitions(source_xml)?;
    let existing: HashSet<String> = style_definitions(target_xml)?.into_keys().collect();

    Ok(with_dependencies(requested, &source)
        .into_iter()
        .filter(|id| !existing.contains(id))
        .filter_map(|id| source.get(&id).map(|definition| definition.xml.clone()))
        .collect())
}

/// Append raw style definitions to a styles part.
pub fn insert_styles(target_xml: &str, definitions: &[String]) -> String {
    if definitions.is_empty() {
        return target_xml.to_string();
    }
    insert_before_close(target_xml, "</w:styles>", &definitions.concat())
}
