//! Structural append of one document onto another.
//!
//! Blocks are carried as raw XML. Everything they point at outside the
//! main part travels with them: styles, list numbering, images and other
//! related parts. Ids that would collide in the target are renamed and the
//! references inside the appended blocks rewritten.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::document::{Block, Document};
use super::numbering::{
    empty_numbering_xml, import_numbering, referenced_num_ids, remap_num_ids,
    NUMBERING_CONTENT_TYPE,
};
use super::package::{
    extension_of, insert_before_close, DocxPackage, DOCUMENT_RELS_PART, NUMBERING_PART, STYLES_PART,
};
use super::relationships::{
    empty_relationships_xml, next_relationship_id, parse_relationships, referenced_ids,
    relative_target, remap_ids, resolve_target, Relationship, NUMBERING_REL_TYPE,
};
use super::styles::{insert_styles, missing_styles};
use crate::error::Result;

/// Style references inside body content.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static STYLE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<w:(?:pStyle|rStyle|tblStyle)\s+w:val="([^"]+)""#).expect("valid regex")
});

/// Builds a composed document by appending whole documents in order.
#[derive(Debug)]
pub struct Composer {
    base: Document,
    appended: usize,
}

impl Composer {
    pub fn new(base: Document) -> Self {
        Self { base, appended: 0 }
    }

    /// Number of documents appended so far.
    pub fn appended(&self) -> usize {
        self.appended
    }

    pub fn document(&self) -> &Document {
        &self.base
    }

    pub fn into_document(self) -> Document {
        self.base
    }

    /// Write the composed document.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.base.save(path)
    }

    /// Append every block of `source` after the current content.
    ///
    /// The source's trailing section properties are not carried: the
    /// composed document keeps the page setup of its base.
    pub fn append(&mut self, source: &Document) -> Result<()> {
        let mut blocks: Vec<Block> = source.blocks().to_vec();
        let body_xml: String = blocks.iter().map(Block::xml).collect();

        self.base.declare_namespaces(&source.namespace_declarations());
        let new_styles = self.styles_to_import(source, &body_xml)?;
        // Styles may carry list numbering of their own.
        let numbered_xml = format!("{body_xml}{}", new_styles.concat());
        let num_remap = self.import_numbering(source, &numbered_xml)?;
        self.import_styles(&new_styles, &num_remap)?;
        let rel_remap = self.import_relationships(source, &body_xml)?;

        for block in &mut blocks {
            if !num_remap.is_empty() {
                block.map_xml(|xml| remap_num_ids(xml, &num_remap));
            }
            if !rel_remap.is_empty() {
                block.map_xml(|xml| remap_ids(xml, &rel_remap));
            }
        }

        let count = blocks.len();
        for block in blocks {
            self.base.push_block(block);
        }
        self.appended += 1;
        tracing::debug!(
            source = %source.origin().display(),
            blocks = count,
            lists = num_remap.len(),
            relationships = rel_remap.len(),
            "Appended document"
        );
        Ok(())
    }

    /// Source style definitions referenced by `body_xml` that the base lacks.
    fn styles_to_import(&self, source: &Document, body_xml: &str) -> Result<Vec<String>> {
        let requested: Vec<String> = STYLE_REF
            .captures_iter(body_xml)
            .map(|caps| caps[1].to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if requested.is_empty() {
            return Ok(Vec::new());
        }
        let Some(source_styles) = source.package().part_str(STYLES_PART)? else {
            return Ok(Vec::new());
        };
        let Some(target_styles) = self.base.package().part_str(STYLES_PART)? else {
            tracing::warn!("Base document has no styles part; appended styles fall back to defaults");
            return Ok(Vec::new());
        };
        missing_styles(&target_styles, &source_styles, &requested)
    }

    fn import_styles(&mut self, definitions: &[String], num_remap: &HashMap<String, String>) -> Result<()> {
        if definitions.is_empty() {
            return Ok(());
        }
        let Some(target_styles) = self.base.package().part_str(STYLES_PART)? else {
            return Ok(());
        };
        let remapped: Vec<String> = definitions
            .iter()
            .map(|xml| remap_num_ids(xml, num_remap))
            .collect();
        tracing::debug!(count = remapped.len(), "Imported styles");
        self.base.set_styles_xml(insert_styles(&target_styles, &remapped))
    }

    fn import_numbering(&mut self, source: &Document, body_xml: &str) -> Result<HashMap<String, String>> {
        let requested = referenced_num_ids(body_xml);
        if requested.is_empty() {
            return Ok(HashMap::new());
        }
        let Some(source_numbering) = source.package().part_str(NUMBERING_PART)? else {
            return Ok(HashMap::new());
        };

        let package = self.base.package_mut();
        let existing = package.part_str(NUMBERING_PART)?;
        let target_numbering = existing.clone().unwrap_or_else(empty_numbering_xml);
        let import = import_numbering(&target_numbering, &source_numbering, &requested)?;
        if import.remap.is_empty() {
            return Ok(import.remap);
        }

        package.set_part(NUMBERING_PART, import.numbering_xml.into_bytes());
        if existing.is_none() {
            register_part(package, NUMBERING_PART, NUMBERING_REL_TYPE, NUMBERING_CONTENT_TYPE)?;
        }
        Ok(import.remap)
    }

    fn import_relationships(&mut self, source: &Document, body_xml: &str) -> Result<HashMap<String, String>> {
        let requested = referenced_ids(body_xml);
        if requested.is_empty() {
            return Ok(HashMap::new());
        }
        let Some(source_rels_xml) = source.package().part_str(DOCUMENT_RELS_PART)? else {
            return Ok(HashMap::new());
        };
        let source_rels = parse_relationships(&source_rels_xml)?;

        let package = self.base.package_mut();
        let target_rels_xml = package
            .part_str(DOCUMENT_RELS_PART)?
            .unwrap_or_else(empty_relationships_xml);
        let mut target_rels = parse_relationships(&target_rels_xml)?;
        let mut existing_ids: HashSet<String> = target_rels.iter().map(|rel| rel.id.clone()).collect();

        let mut remap = HashMap::new();
        let mut added = String::new();
        for id in &requested {
            let Some(source_rel) = source_rels.iter().find(|rel| &rel.id == id) else {
                continue;
            };

            let target = if source_rel.is_external() {
                source_rel.target.clone()
            } else {
                match copy_part(source.package(), package, &source_rel.target)? {
                    Some(target) => target,
                    None => continue,
                }
            };
            let candidate = Relationship {
                id: String::new(),
                rel_type: source_rel.rel_type.clone(),
                target,
                target_mode: source_rel.target_mode.clone(),
            };

            if let Some(same) = target_rels.iter().find(|rel| rel.same_target(&candidate)) {
                remap.insert(id.clone(), same.id.clone());
                continue;
            }
            let new_id = next_relationship_id(&existing_ids);
            existing_ids.insert(new_id.clone());
            let relationship = Relationship { id: new_id.clone(), ..candidate };
            added.push_str(&relationship.to_xml());
            target_rels.push(relationship);
            remap.insert(id.clone(), new_id);
        }

        if !added.is_empty() {
            let updated = insert_before_close(&target_rels_xml, "</Relationships>", &added);
            package.set_part(DOCUMENT_RELS_PART, updated.into_bytes());
        }
        Ok(remap)
    }
}

/// Copy an internal part of `source` into `target` under a free name.
///
/// Returns the new relationship target, or `None` when the source part is
/// missing.
fn copy_part(source: &DocxPackage, target: &mut DocxPackage, rel_target: &str) -> Result<Option<String>> {
    let source_name = resolve_target(rel_target);
    let Some(data) = source.part(&source_name) else {
        tracing::warn!(part = %source_name, "Related part missing from source document; skipped");
        return Ok(None);
    };
    let new_name = target.unique_part_name(&source_name);
    target.set_part(&new_name, data.to_vec());

    if let Some(content_type) = source.content_type_of(&source_name)? {
        if target.content_type_of(&new_name)?.as_deref() != Some(content_type.as_str()) {
            let extension = extension_of(&new_name);
            if extension.is_empty() || target.content_type_of(&format!("x.{extension}"))?.is_some() {
                target.ensure_override_content_type(&new_name, &content_type)?;
            } else {
                target.ensure_default_content_type(extension, &content_type)?;
            }
        }
    }
    Ok(Some(relative_target(&new_name)))
}

/// Add the document relationship and content type override of a new part.
fn register_part(package: &mut DocxPackage, part_name: &str, rel_type: &str, content_type: &str) -> Result<()> {
    let rels_xml = package
        .part_str(DOCUMENT_RELS_PART)?
        .unwrap_or_else(empty_relationships_xml);
    let rels = parse_relationships(&rels_xml)?;
    let target = relative_target(part_name);
    if !rels.iter().any(|rel| rel.rel_type == rel_type && rel.target == target) {
        let existing: HashSet<String> = rels.into_iter().map(|rel| rel.id).collect();
        let relationship = Relationship {
            id: next_relationship_id(&existing),
            rel_type: rel_type.to_string(),
            target,
            target_mode: None,
        };
        let updated = insert_before_close(&rels_xml, "</Relationships>", &relationship.to_xml());
        package.set_part(DOCUMENT_RELS_PART, updated.into_bytes());
    }
    package.ensure_override_content_type(part_name, content_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::package::CONTENT_TYPES_PART;
    use crate::docx::xml::W_NS;

    fn source_with_image() -> Document {
        let mut doc = Document::blank();
        let package = doc.package_mut();
        package.set_part("word/media/image1.png", vec![0x89, 0x50, 0x4e, 0x47]);
        let rels = package.part_str(DOCUMENT_RELS_PART).unwrap().unwrap();
        let rels = insert_before_close(
            &rels,
            "</Relationships>",
            r#"<Relationship Id="rId5" Type="urn:image" Target="media/image1.png"/><Relationship Id="rId6" Type="urn:hyperlink" Target="https://example.org/" TargetMode="External"/>"#,
        );
        package.set_part(DOCUMENT_RELS_PART, rels.into_bytes());
        package.ensure_default_content_type("png", "image/png").unwrap();
        doc.push_block(
            Block::from_xml(
                r#"<w:p><w:r><w:drawing><a:blip xmlns:a="urn:a" r:embed="rId5"/></w:drawing></w:r><w:hyperlink r:id="rId6"><w:r><w:t>link</w:t></w:r></w:hyperlink></w:p>"#,
                &HashMap::new(),
            )
            .unwrap(),
        );
        doc
    }

    #[test]
    fn test_append_keeps_order_and_section_props() {
        let mut first = Document::blank();
        first.push_paragraph(Some("Heading3"), "one");
        let mut second = Document::blank();
        second.push_paragraph(None, "two");

        let mut composer = Composer::new(Document::blank());
        composer.append(&first).unwrap();
        composer.append(&second).unwrap();

        let doc = composer.document();
        let texts: Vec<&str> = doc.blocks().iter().map(Block::text).collect();
        assert_eq!(texts, vec!["one", "two"]);
        assert_eq!(composer.appended(), 2);
        let xml = doc.to_xml();
        assert!(xml.find("two").unwrap() < xml.find("<w:sectPr>").unwrap());
    }

    #[test]
    fn test_append_copies_related_parts() {
        let mut base = Document::blank();
        base.package_mut().set_part("word/media/image1.png", vec![1, 2, 3]);
        let mut composer = Composer::new(base);
        composer.append(&source_with_image()).unwrap();

        let doc = composer.document();
        assert_eq!(doc.package().part("word/media/image1.png"), Some(&[1, 2, 3][..]));
        assert_eq!(
            doc.package().part("word/media/image1_2.png"),
            Some(&[0x89, 0x50, 0x4e, 0x47][..])
        );

        let rels = parse_relationships(&doc.package().part_str(DOCUMENT_RELS_PART).unwrap().unwrap()).unwrap();
        let image = rels.iter().find(|rel| rel.target == "media/image1_2.png").unwrap();
        let link = rels.iter().find(|rel| rel.is_external()).unwrap();
        let block_xml = doc.blocks()[0].xml();
        assert!(block_xml.contains(&format!("r:embed=\"{}\"", image.id)));
        assert!(block_xml.contains(&format!("r:id=\"{}\"", link.id)));
        assert_eq!(rels.len(), 3);

        let content_types = doc.package().part_str(CONTENT_TYPES_PART).unwrap().unwrap();
        assert!(content_types.contains("Extension=\"png\""));
    }

    #[test]
    fn test_append_imports_styles() {
        let mut source = Document::blank();
        let styles = source.package().part_str(STYLES_PART).unwrap().unwrap();
        let styles = insert_before_close(
            &styles,
            "</w:styles>",
            r#"<w:style w:type="paragraph" w:styleId="Ttulo3"><w:name w:val="Título 3"/><w:basedOn w:val="Normal"/></w:style>"#,
        );
        source.set_styles_xml(styles).unwrap();
        source.push_paragraph(Some("Ttulo3"), "PPT001 Hormigón");

        let mut composer = Composer::new(Document::blank());
        composer.append(&source).unwrap();

        let doc = composer.document();
        assert_eq!(doc.style_name("Ttulo3"), Some("Título 3"));
        assert_eq!(
            doc.blocks()[0].as_paragraph().and_then(|p| p.style_name.as_deref()),
            Some("Título 3")
        );
    }

    #[test]
    fn test_append_creates_numbering_part() {
        let mut source = Document::blank();
        let numbering = format!(
            "<w:numbering xmlns:w=\"{W_NS}\"><w:abstractNum w:abstractNumId=\"0\"/><w:num w:numId=\"5\"><w:abstractNumId w:val=\"0\"/></w:num></w:numbering>"
        );
        source.package_mut().set_part(NUMBERING_PART, numbering.into_bytes());
        source.push_block(
            Block::from_xml(
                r#"<w:p><w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="5"/></w:numPr></w:pPr><w:r><w:t>item</w:t></w:r></w:p>"#,
                &HashMap::new(),
            )
            .unwrap(),
        );

        let mut composer = Composer::new(Document::blank());
        composer.append(&source).unwrap();

        let doc = composer.document();
        let package = doc.package();
        assert!(package.part_str(NUMBERING_PART).unwrap().unwrap().contains("w:numId=\"1\""));
        assert!(doc.blocks()[0].xml().contains("<w:numId w:val=\"1\"/>"));
        assert!(package
            .part_str(DOCUMENT_RELS_PART)
            .unwrap()
            .unwrap()
            .contains("Target=\"numbering.xml\""));
        assert_eq!(
            package.content_type_of(NUMBERING_PART).unwrap().as_deref(),
            Some(NUMBERING_CONTENT_TYPE)
        );
    }

    #[test]
    fn test_append_imports_numbering_of_styles() {
        let mut source = Document::blank();
        let styles = source.package().part_str(STYLES_PART).unwrap().unwrap();
        let list_head = concat!(
            r#"<w:style w:type="paragraph" w:styleId="ListHead"><w:name w:val="List Head"/>"#,
            r#"<w:pPr><w:numPr><w:numId w:val="5"/></w:numPr></w:pPr></w:style>"#,
        );
        source
            .set_styles_xml(insert_styles(&styles, &[list_head.to_string()]))
            .unwrap();
        let numbering = format!(
            "<w:numbering xmlns:w=\"{W_NS}\"><w:abstractNum w:abstractNumId=\"0\"/><w:num w:numId=\"5\"><w:abstractNumId w:val=\"0\"/></w:num></w:numbering>"
        );
        source.package_mut().set_part(NUMBERING_PART, numbering.into_bytes());
        source.push_paragraph(Some("ListHead"), "heading with a number");

        let mut composer = Composer::new(Document::blank());
        composer.append(&source).unwrap();

        let package = composer.document().package();
        let numbering = package.part_str(NUMBERING_PART).unwrap().unwrap();
        assert!(numbering.contains("w:numId=\"1\""));
        let styles = package.part_str(STYLES_PART).unwrap().unwrap();
        assert!(styles.contains("w:styleId=\"ListHead\""));
        assert!(styles.contains("<w:numId w:val=\"1\"/>"));
        assert!(!styles.contains("<w:numId w:val=\"5\"/>"));
    }
}
