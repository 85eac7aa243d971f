//! Package relationships of the main document part.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use roxmltree::Document;

use super::xml::{attribute_value, escape_attr, find_children, PKG_REL_NS};
use crate::error::Result;

pub const STYLES_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
pub const NUMBERING_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering";

/// Relationship-id attributes used inside body content.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static REL_ID_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(r:(?:id|embed|link|pict|dm|lo|qs|cs))="([^"]*)""#).expect("valid regex")
});

/// One `Relationship` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub target_mode: Option<String>,
}

impl Relationship {
    /// Whether the target lives outside the package (hyperlinks, linked files).
    pub fn is_external(&self) -> bool {
        self.target_mode
            .as_deref()
            .is_some_and(|mode| mode.eq_ignore_ascii_case("External"))
    }

    /// Same relationship apart from the id.
    pub fn same_target(&self, other: &Self) -> bool {
        self.rel_type == other.rel_type
            && self.target == other.target
            && self.target_mode == other.target_mode
    }

    pub fn to_xml(&self) -> String {
        let mut xml = format!(
            "<Relationship Id=\"{}\" Type=\"{}\" Target=\"{}\"",
            escape_attr(&self.id),
            escape_attr(&self.rel_type),
            escape_attr(&self.target)
        );
        if let Some(mode) = &self.target_mode {
            xml.push_str(&format!(" TargetMode=\"{}\"", escape_attr(mode)));
        }
        xml.push_str("/>");
        xml
    }
}

/// Parse a relationships part.
pub fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let doc = Document::parse(xml)?;
    let relationships = find_children(doc.root_element(), "Relationship")
        .filter_map(|node| {
            Some(Relationship {
                id: attribute_value(node, "Id")?.to_string(),
                rel_type: attribute_value(node, "Type")?.to_string(),
                target: attribute_value(node, "Target")?.to_string(),
                target_mode: attribute_value(node, "TargetMode").map(str::to_string),
            })
        })
        .collect();
    Ok(relationships)
}

/// An empty relationships part.
pub fn empty_relationships_xml() -> String {
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<Relationships xmlns=\"{PKG_REL_NS}\"></Relationships>")
}

/// First `rIdN` id not in `existing`, above the highest numeric one.
pub fn next_relationship_id(existing: &HashSet<String>) -> String {
    let highest = existing
        .iter()
        .filter_map(|id| id.strip_prefix("rId")?.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    let mut next = highest + 1;
    loop {
        let candidate = format!("rId{next}");
        if !existing.contains(&candidate) {
            return candidate;
        }
        next += 1;
    }
}

/// Relationship ids referenced by a fragment of body XML.
pub fn referenced_ids(xml: &str) -> BTreeSet<String> {
    REL_ID_ATTR
        .captures_iter(xml)
        .map(|caps| caps[2].to_string())
        .collect()
}

/// Rewrite relationship ids in one pass, so chained renames cannot collide.
pub fn remap_ids(xml: &str, remap: &HashMap<String, String>) -> String {
    if remap.is_empty() {
        return xml.to_string();
    }
    REL_ID_ATTR
        .replace_all(xml, |caps: &Captures<'_>| match remap.get(&caps[2]) {
            Some(new_id) => format!("{}=\"{new_id}\"", &caps[1]),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Part name a relationship target of `word/document.xml` points to.
///
/// `media/image1.png` → `word/media/image1.png`,
/// `../customXml/item1.xml` → `customXml/item1.xml`,
/// `/word/media/a.png` → `word/media/a.png`.
pub fn resolve_target(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = vec!["word"];
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Target of a part, relative to `word/document.xml`.
pub fn relative_target(part_name: &str) -> String {
    match part_name.strip_prefix("word/") {
        Some(inside) => inside.to_string(),
        None => format!("../{part_name}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RELS: &str = r#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="urn:styles" Target="styles.xml"/>
  <Relationship Id="rId7" Type="urn:hyperlink" Target="https://example.org/" TargetMode="External"/>
</Relationships>"#;

    #[test]
    fn test_parse_relationships() {
        let rels = parse_relationships(RELS).unwrap();
        assert_eq!(rels.len(), 2);
        assert!(!rels[0].is_external());
        assert!(rels[1].is_external());
        assert_eq!(rels[1].target, "https://example.org/");
    }

    #[test]
    fn test_next_relationship_id() {
        let existing: HashSet<String> = ["rId1", "rId7", "custom"].map(String::from).into();
        assert_eq!(next_relationship_id(&existing), "rId8");
        assert_eq!(next_relationship_id(&HashSet::new()), "rId1");
    }

    #[test]
    fn test_referenced_ids() {
        let xml = r#"<w:p><w:hyperlink r:id="rId7"><w:r><a:blip r:embed="rId5"/></w:r></w:hyperlink></w:p>"#;
        let ids: Vec<String> = referenced_ids(xml).into_iter().collect();
        assert_eq!(ids, vec!["rId5".to_string(), "rId7".to_string()]);
    }

    #[test]
    fn test_remap_ids_single_pass() {
        let remap: HashMap<String, String> = [("rId1", "rId2"), ("rId2", "rId3")]
            .into_iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();
        let xml = r#"<a r:embed="rId1"/><b r:id="rId2"/><c r:id="rId9"/>"#;
        assert_eq!(
            remap_ids(xml, &remap),
            r#"<a r:embed="rId2"/><b r:id="rId3"/><c r:id="rId9"/>"#
        );
    }

    #[test]
    fn test_resolve_and_relative_target() {
        assert_eq!(resolve_target("media/image1.png"), "word/media/image1.png");
        assert_eq!(resolve_target("../customXml/item1.xml"), "customXml/item1.xml");
        assert_eq!(resolve_target("/word/media/a.png"), "word/media/a.png");
        assert_eq!(relative_target("word/media/image1_2.png"), "media/image1_2.png");
        assert_eq!(relative_target("customXml/item1.xml"), "../customXml/item1.xml");
    }
}
