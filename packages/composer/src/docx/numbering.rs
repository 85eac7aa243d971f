//! List numbering import.
//!
//! A list instance (`w:num`) points at an abstract definition
//! (`w:abstractNum`). Imported lists get fresh ids on both levels so they
//! never collide with, or continue, lists already in the target.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use roxmltree::{Document, Node};

use super::package::insert_before_close;
use super::xml::{attribute_value, child_val, element_children, find_children, get_tag_name, node_source, W_NS};
use crate::error::Result;

pub const NUMBERING_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml";

/// `<w:numId w:val="N"/>` references inside paragraph properties.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static NUM_ID_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(<w:numId\s+w:val=")([0-9]+)(")"#).expect("valid regex")
});

/// Result of importing numbering definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberingImport {
    /// Updated target numbering part.
    pub numbering_xml: String,
    /// Source `numId` to target `numId`.
    pub remap: HashMap<String, String>,
}

/// An empty numbering part.
pub fn empty_numbering_xml() -> String {
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<w:numbering xmlns:w=\"{W_NS}\"></w:numbering>")
}

/// List ids referenced from body XML. `0` (numbering removed) is excluded.
pub fn referenced_num_ids(xml: &str) -> BTreeSet<String> {
    NUM_ID_REF
        .captures_iter(xml)
        .map(|caps| caps[2].to_string())
        .filter(|id| id != "0")
        .collect()
}

/// Rewrite `w:numId` references.
pub fn remap_num_ids(xml: &str, remap: &HashMap<String, String>) -> String {
    if remap.is_empty() {
        return xml.to_string();
    }
    NUM_ID_REF
        .replace_all(xml, |caps: &Captures<'_>| match remap.get(&caps[2]) {
            Some(new_id) => format!("{}{new_id}{}", &caps[1], &caps[3]),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn highest_id(root: Node<'_, '_>, tag: &str, attribute: &str) -> u64 {
    find_children(root, tag)
        .filter_map(|node| attribute_value(node, attribute)?.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
}

/// Copy the requested list definitions from `source_xml` into `target_xml`.
pub fn import_numbering(
    target_xml: &str,
    source_xml: &str,
    requested: &BTreeSet<String>,
) -> Result<NumberingImport> {
    let source = Document::parse(source_xml)?;
    let source_root = source.root_element();
    let abstracts: HashMap<&str, Node<'_, '_>> = find_children(source_root, "abstractNum")
        .filter_map(|node| Some((attribute_value(node, "abstractNumId")?, node)))
        .collect();
    let nums: HashMap<&str, Node<'_, '_>> = find_children(source_root, "num")
        .filter_map(|node| Some((attribute_value(node, "numId")?, node)))
        .collect();

    let (mut next_num, mut next_abstract) = {
        let target = Document::parse(target_xml)?;
        let root = target.root_element();
        (
            highest_id(root, "num", "numId") + 1,
            highest_id(root, "abstractNum", "abstractNumId") + 1,
        )
    };

    let mut remap = HashMap::new();
    let mut abstract_remap: HashMap<&str, String> = HashMap::new();
    let mut new_abstracts = String::new();
    let mut new_nums = String::new();

    for num_id in requested {
        let Some(num) = nums.get(num_id.as_str()) else {
            tracing::debug!(num_id = %num_id, "Referenced list has no definition");
            continue;
        };
        let Some(abstract_id) = child_val(*num, "abstractNumId") else {
            continue;
        };
        let Some(abstract_node) = abstracts.get(abstract_id) else {
            continue;
        };

        let new_abstract_id = match abstract_remap.get(abstract_id) {
            Some(id) => id.clone(),
            None => {
                let id = next_abstract.to_string();
                next_abstract += 1;
                let xml = node_source(source_xml, *abstract_node).replacen(
                    &format!("w:abstractNumId=\"{abstract_id}\""),
                    &format!("w:abstractNumId=\"{id}\""),
                    1,
                );
                new_abstracts.push_str(&xml);
                abstract_remap.insert(abstract_id, id.clone());
                id
            }
        };

        let new_num_id = next_num.to_string();
        next_num += 1;
        let overrides: String = element_children(*num)
            .filter(|child| get_tag_name(*child) != "abstractNumId")
            .map(|child| node_source(source_xml, child))
            .collect();
        new_nums.push_str(&format!(
            "<w:num w:numId=\"{new_num_id}\"><w:abstractNumId w:val=\"{new_abstract_id}\"/>{overrides}</w:num>"
        ));
        remap.insert(num_id.clone(), new_num_id);
    }

    if remap.is_empty() {
        return Ok(NumberingImport {
            numbering_xml: target_xml.to_string(),
            remap,
        });
    }

    // Abstract definitions must precede every list instance.
    let with_abstracts = insert_before_first(target_xml, &["num", "numIdMacAtCleanup"], &new_abstracts)?;
    let numbering_xml = insert_before_first(&with_abstracts, &["numIdMacAtCleanup"], &new_nums)?;
    Ok(NumberingImport {
        numbering_xml,
        remap,
    })
}

/// Insert `fragment` before the first root child named in `tags`, or at the end.
fn insert_before_first(xml: &str, tags: &[&str], fragment: &str) -> Result<String> {
    let doc = Document::parse(xml)?;
    let anchor = element_children(doc.root_element())
        .find(|child| tags.contains(&get_tag_name(*child)))
        .map(|child| child.range().start);
    Ok(match anchor {
        Some(at) => format!("{}{fragment}{}", &xml[..at], &xml[at..]),
        None => insert_before_close(xml, "</w:numbering>", fragment),
    })
}
