//! Value-semantics model of a word-processing document body.
//!
//! `word/document.xml` is cut into three pieces: the text up to and
//! including the body start tag, the ordered top-level blocks, and the
//! closing text. The trailing body section properties (`w:sectPr`) are
//! kept apart from the blocks, so range deletions never remove page setup.
//!
//! Every block keeps its raw XML, which is what makes relocation between
//! documents lossless: runs, fonts, tables and drawings travel untouched.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use roxmltree::Node;

use super::package::{DocxPackage, Part, CONTENT_TYPES_PART, DOCUMENT_PART, DOCUMENT_RELS_PART, STYLES_PART};
use super::styles::style_names;
use super::xml::{
    child_val, element_children, escape_attr, escape_text, find_child, get_tag_name, has_tag,
    node_source, paragraph_text, R_NS, W_NS,
};
use crate::error::{ComposerError, Result};

/// `xmlns:prefix="uri"` declarations.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static XMLNS_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"xmlns:([A-Za-z_][A-Za-z0-9_.\-]*)\s*=\s*"([^"]*)""#).expect("valid regex")
});

/// Structural role of a block, as far as this crate cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph(Paragraph),
    Table,
    /// Any other body-level element (`w:sdt`, bookmarks, ...), by local name.
    Other(String),
}

/// Paragraph metadata needed for heading detection and relabeling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    /// `w:pStyle` value.
    pub style_id: Option<String>,
    /// Display name of the style, resolved through the styles part.
    pub style_name: Option<String>,
    /// Raw `w:pPr` element.
    pub properties: Option<String>,
}

impl Paragraph {
    /// The label used for classification: the style name, else the id.
    pub fn style_label(&self) -> Option<&str> {
        self.style_name.as_deref().or(self.style_id.as_deref())
    }
}

/// A top-level element of the document body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    text: String,
    xml: String,
}

impl Block {
    fn from_node(node: Node<'_, '_>, xml: String, names: &HashMap<String, String>) -> Self {
        let kind = match get_tag_name(node) {
            "p" => {
                let properties = find_child(node, "pPr");
                let style_id = properties
                    .and_then(|ppr| child_val(ppr, "pStyle"))
                    .map(str::to_string);
                let style_name = style_id.as_ref().and_then(|id| names.get(id)).cloned();
                BlockKind::Paragraph(Paragraph {
                    style_id,
                    style_name,
                    properties: properties.map(|ppr| xml_of(&xml, node, ppr)),
                })
            }
            "tbl" => BlockKind::Table,
            other => BlockKind::Other(other.to_string()),
        };
        let text = match &kind {
            BlockKind::Paragraph(_) => paragraph_text(node),
            _ => node
                .descendants()
                .filter(|n| has_tag(*n, "p"))
                .map(paragraph_text)
                .collect::<Vec<_>>()
                .join("\n"),
        };
        Self { kind, text, xml }
    }

    /// Parse a single body element from an XML fragment.
    ///
    /// The fragment may use the `w:` and `r:` prefixes without declaring them.
    pub fn from_xml(fragment: &str, names: &HashMap<String, String>) -> Result<Self> {
        let wrapped = format!("<w:body xmlns:w=\"{W_NS}\" xmlns:r=\"{R_NS}\">{}</w:body>", fragment.trim());
        let doc = roxmltree::Document::parse(&wrapped)?;
        let node = element_children(doc.root_element())
            .next()
            .ok_or_else(|| ComposerError::malformed("<fragment>", "fragment has no element"))?;
        let xml = node_source(&wrapped, node).to_string();
        Ok(Self::from_node(node, xml, names))
    }

    /// A paragraph with one plain run.
    pub fn paragraph(style_id: Option<&str>, text: &str) -> Self {
        let properties = style_id.map(|id| format!("<w:pPr><w:pStyle w:val=\"{}\"/></w:pPr>", escape_attr(id)));
        let run = format!(
            "<w:r><w:t xml:space=\"preserve\">{}</w:t></w:r>",
            escape_text(text)
        );
        Self::paragraph_with_runs(properties, style_id.map(str::to_string), &run, text)
    }

    /// A paragraph made of raw properties and run XML.
    ///
    /// `style_id` is the style referenced by `properties`, and `text` the
    /// visible text of `runs`.
    pub fn paragraph_with_runs(
        properties: Option<String>,
        style_id: Option<String>,
        runs: &str,
        text: &str,
    ) -> Self {
        let xml = format!("<w:p>{}{runs}</w:p>", properties.as_deref().unwrap_or_default());
        Self {
            kind: BlockKind::Paragraph(Paragraph {
                style_id,
                style_name: None,
                properties,
            }),
            text: text.to_string(),
            xml,
        }
    }

    pub fn xml(&self) -> &str {
        &self.xml
    }

    /// Visible text; for tables, the text of every cell paragraph, one per line.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match &self.kind {
            BlockKind::Paragraph(paragraph) => Some(paragraph),
            _ => None,
        }
    }

    pub fn is_paragraph(&self) -> bool {
        matches!(self.kind, BlockKind::Paragraph(_))
    }

    /// Rewrite the raw XML, keeping kind and text.
    pub fn map_xml(&mut self, f: impl FnOnce(&str) -> String) {
        self.xml = f(&self.xml);
    }

    fn resolve_style_name(&mut self, names: &HashMap<String, String>) {
        if let BlockKind::Paragraph(paragraph) = &mut self.kind {
            if let Some(id) = &paragraph.style_id {
                paragraph.style_name = names.get(id).cloned();
            }
        }
    }
}

/// Source text of `child`, given the source text of its ancestor `parent`.
fn xml_of(parent_xml: &str, parent: Node<'_, '_>, child: Node<'_, '_>) -> String {
    let offset = parent.range().start;
    let range = child.range();
    parent_xml[range.start - offset..range.end - offset].to_string()
}

/// An in-memory document. `Clone` yields an independent working copy.
#[derive(Debug, Clone)]
pub struct Document {
    origin: PathBuf,
    package: DocxPackage,
    head: String,
    blocks: Vec<Block>,
    section_props: Option<String>,
    tail: String,
    style_names: HashMap<String, String>,
}

impl Document {
    /// Load a document from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let package = DocxPackage::open(path)?;
        Self::from_package(package, path)
    }

    /// Parse the main part of a package.
    pub fn from_package(package: DocxPackage, origin: &Path) -> Result<Self> {
        let xml = package
            .part_str(DOCUMENT_PART)?
            .ok_or_else(|| ComposerError::MissingPart {
                part: DOCUMENT_PART.to_string(),
                path: origin.to_path_buf(),
            })?;
        let style_names = match package.part_str(STYLES_PART)? {
            Some(styles) => style_names(&styles)?,
            None => HashMap::new(),
        };

        let doc = roxmltree::Document::parse(&xml)?;
        let body = element_children(doc.root_element())
            .find(|node| has_tag(*node, "body"))
            .ok_or_else(|| ComposerError::malformed(origin, "document has no body"))?;
        let (head, tail) = split_around_body(&xml, body)
            .ok_or_else(|| ComposerError::malformed(origin, "cannot locate body tags"))?;

        let children: Vec<Node<'_, '_>> = element_children(body).collect();
        let mut blocks = Vec::with_capacity(children.len());
        let mut section_props = None;
        for (index, child) in children.iter().enumerate() {
            let raw = node_source(&xml, *child).to_string();
            if has_tag(*child, "sectPr") && index + 1 == children.len() {
                section_props = Some(raw);
                continue;
            }
            blocks.push(Block::from_node(*child, raw, &style_names));
        }

        tracing::debug!(
            path = %origin.display(),
            blocks = blocks.len(),
            "Parsed document body"
        );

        Ok(Self {
            origin: origin.to_path_buf(),
            package,
            head,
            blocks,
            section_props,
            tail,
            style_names,
        })
    }

    /// A minimal empty document with Normal and Heading 1-3 styles.
    pub fn blank() -> Self {
        let parts = vec![
            part(CONTENT_TYPES_PART, BLANK_CONTENT_TYPES),
            part("_rels/.rels", BLANK_PACKAGE_RELS),
            part(DOCUMENT_PART, ""),
            part(DOCUMENT_RELS_PART, BLANK_DOCUMENT_RELS),
            part(STYLES_PART, BLANK_STYLES),
        ];
        let style_names = [
            ("Normal", "Normal"),
            ("Heading1", "heading 1"),
            ("Heading2", "heading 2"),
            ("Heading3", "heading 3"),
        ]
        .into_iter()
        .map(|(id, name)| (id.to_string(), name.to_string()))
        .collect();
        Self {
            origin: PathBuf::from("<blank>"),
            package: DocxPackage::from_parts(parts),
            head: format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<w:document xmlns:w=\"{W_NS}\" xmlns:r=\"{R_NS}\"><w:body>"
            ),
            blocks: Vec::new(),
            section_props: Some(BLANK_SECT_PR.to_string()),
            tail: "</w:body></w:document>".to_string(),
            style_names,
        }
    }

    /// Serialize `word/document.xml`.
    pub fn to_xml(&self) -> String {
        let capacity = self.head.len()
            + self.tail.len()
            + self.blocks.iter().map(|b| b.xml.len()).sum::<usize>()
            + self.section_props.as_ref().map_or(0, String::len);
        let mut xml = String::with_capacity(capacity);
        xml.push_str(&self.head);
        for block in &self.blocks {
            xml.push_str(&block.xml);
        }
        if let Some(sect_pr) = &self.section_props {
            xml.push_str(sect_pr);
        }
        xml.push_str(&self.tail);
        xml
    }

    /// Write the document to disk.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.package.set_part(DOCUMENT_PART, self.to_xml().into_bytes());
        self.package.save(path)?;
        tracing::debug!(path = %path.display(), blocks = self.blocks.len(), "Saved document");
        Ok(())
    }

    /// Where the document was loaded from.
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    pub fn package(&self) -> &DocxPackage {
        &self.package
    }

    pub fn package_mut(&mut self) -> &mut DocxPackage {
        &mut self.package
    }

    /// Top-level blocks in reading order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }

    /// Paragraph blocks with their body positions, in reading order.
    pub fn paragraphs(&self) -> impl Iterator<Item = (usize, &Block)> {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, block)| block.is_paragraph())
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs().count()
    }

    /// Trailing body section properties.
    pub fn section_props(&self) -> Option<&str> {
        self.section_props.as_deref()
    }

    /// Append a block, resolving its style name against this document.
    pub fn push_block(&mut self, mut block: Block) {
        block.resolve_style_name(&self.style_names);
        self.blocks.push(block);
    }

    /// Replace the block at `index`, returning the old one.
    pub fn replace_block(&mut self, index: usize, mut block: Block) -> Option<Block> {
        block.resolve_style_name(&self.style_names);
        let slot = self.blocks.get_mut(index)?;
        Some(std::mem::replace(slot, block))
    }

    /// Append a paragraph with one plain run.
    pub fn push_paragraph(&mut self, style_id: Option<&str>, text: &str) {
        self.push_block(Block::paragraph(style_id, text));
    }

    /// Display name of a style id.
    pub fn style_name(&self, style_id: &str) -> Option<&str> {
        self.style_names.get(style_id).map(String::as_str)
    }

    /// Replace the styles part and refresh style names.
    pub fn set_styles_xml(&mut self, styles_xml: String) -> Result<()> {
        self.style_names = style_names(&styles_xml)?;
        self.package.set_part(STYLES_PART, styles_xml.into_bytes());
        let names = self.style_names.clone();
        for block in &mut self.blocks {
            block.resolve_style_name(&names);
        }
        Ok(())
    }

    /// Namespace declarations (`prefix`, `uri`) on the root element.
    pub fn namespace_declarations(&self) -> Vec<(String, String)> {
        let Some((start, end)) = root_start_tag(&self.head) else {
            return Vec::new();
        };
        XMLNS_DECL
            .captures_iter(&self.head[start..end])
            .map(|caps| (caps[1].to_string(), caps[2].to_string()))
            .collect()
    }

    /// Declare namespaces on the root element, skipping known prefixes.
    pub fn declare_namespaces(&mut self, declarations: &[(String, String)]) {
        let existing = self.namespace_declarations();
        let missing: String = declarations
            .iter()
            .filter(|(prefix, _)| !existing.iter().any(|(known, _)| known == prefix))
            .map(|(prefix, uri)| format!(" xmlns:{prefix}=\"{}\"", escape_attr(uri)))
            .collect();
        if missing.is_empty() {
            return;
        }
        if let Some((_, end)) = root_start_tag(&self.head) {
            // `end` points just past '>'
            self.head.insert_str(end - 1, &missing);
        }
    }
}

fn part(name: &str, data: &str) -> Part {
    Part {
        name: name.to_string(),
        data: data.as_bytes().to_vec(),
    }
}

/// Split the document XML into (through body start tag, from body end tag).
fn split_around_body(xml: &str, body: Node<'_, '_>) -> Option<(String, String)> {
    let range = body.range();
    let source = &xml[range.clone()];
    let name_end = source[1..]
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .map(|i| i + 1)?;
    let qname = &source[1..name_end];

    if source.ends_with("/>") {
        let head = format!("{}<{qname}>", &xml[..range.start]);
        let tail = format!("</{qname}>{}", &xml[range.end..]);
        return Some((head, tail));
    }

    let open_end = range.start + source.find('>')? + 1;
    let close_start = range.start + source.rfind("</")?;
    Some((xml[..open_end].to_string(), xml[close_start..].to_string()))
}

/// Byte span of the root element's start tag within `head`.
fn root_start_tag(head: &str) -> Option<(usize, usize)> {
    let mut search = 0;
    loop {
        let start = search + head[search..].find('<')?;
        let rest = &head[start + 1..];
        if rest.starts_with('?') || rest.starts_with('!') {
            search = start + 1;
            continue;
        }
        let end = start + head[start..].find('>')? + 1;
        return Some((start, end));
    }
}

const BLANK_CONTENT_TYPES: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
    "<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">",
    "<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>",
    "<Default Extension=\"xml\" ContentType=\"application/xml\"/>",
    "<Override PartName=\"/word/document.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>",
    "<Override PartName=\"/word/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml\"/>",
    "</Types>"
);

const BLANK_PACKAGE_RELS: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
    "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    "<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"word/document.xml\"/>",
    "</Relationships>"
);

const BLANK_DOCUMENT_RELS: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
    "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    "<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>",
    "</Relationships>"
);

const BLANK_STYLES: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
    "<w:styles xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">",
    "<w:style w:type=\"paragraph\" w:default=\"1\" w:styleId=\"Normal\"><w:name w:val=\"Normal\"/><w:qFormat/></w:style>",
    "<w:style w:type=\"paragraph\" w:styleId=\"Heading1\"><w:name w:val=\"heading 1\"/><w:basedOn w:val=\"Normal\"/><w:next w:val=\"Normal\"/><w:qFormat/>",
    "<w:pPr><w:keepNext/><w:outlineLvl w:val=\"0\"/></w:pPr><w:rPr><w:b/><w:sz w:val=\"32\"/></w:rPr></w:style>",
    "<w:style w:type=\"paragraph\" w:styleId=\"Heading2\"><w:name w:val=\"heading 2\"/><w:basedOn w:val=\"Normal\"/><w:next w:val=\"Normal\"/><w:qFormat/>",
    "<w:pPr><w:keepNext/><w:outlineLvl w:val=\"1\"/></w:pPr><w:rPr><w:b/><w:sz w:val=\"28\"/></w:rPr></w:style>",
    "<w:style w:type=\"paragraph\" w:styleId=\"Heading3\"><w:name w:val=\"heading 3\"/><w:basedOn w:val=\"Normal\"/><w:next w:val=\"Normal\"/><w:qFormat/>",
    "<w:pPr><w:keepNext/><w:outlineLvl w:val=\"2\"/></w:pPr><w:rPr><w:b/><w:sz w:val=\"24\"/></w:rPr></w:style>",
    "</w:styles>"
);

const BLANK_SECT_PR: &str = concat!(
    "<w:sectPr><w:pgSz w:w=\"11906\" w:h=\"16838\"/>",
    "<w:pgMar w:top=\"1417\" w:right=\"1701\" w:bottom=\"1417\" w:left=\"1701\" w:header=\"708\" w:footer=\"708\" w:gutter=\"0\"/>",
    "</w:sectPr>"
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reparse(doc: &mut Document) -> Document {
        let xml = doc.to_xml();
        doc.package_mut().set_part(DOCUMENT_PART, xml.into_bytes());
        let mut bytes = Cursor::new(Vec::new());
        doc.package().write(&mut bytes).unwrap();
        let package = DocxPackage::read(Cursor::new(bytes.into_inner())).unwrap();
        Document::from_package(package, Path::new("mem.docx")).unwrap()
    }

    #[test]
    fn test_blank_round_trip() {
        let mut doc = Document::blank();
        doc.push_paragraph(Some("Heading3"), "PPT001 Hormigón");
        doc.push_paragraph(None, "Body & text");

        let parsed = reparse(&mut doc);
        assert_eq!(parsed.blocks().len(), 2);
        assert_eq!(parsed.blocks()[0].text(), "PPT001 Hormigón");
        assert_eq!(parsed.blocks()[1].text(), "Body & text");
        assert_eq!(
            parsed.blocks()[0].as_paragraph().and_then(Paragraph::style_label),
            Some("heading 3")
        );
        assert!(parsed.section_props().is_some_and(|s| s.contains("pgSz")));
    }

    #[test]
    fn test_table_block() {
        let table = Block::from_xml(
            "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>a</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>b</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
            &HashMap::new(),
        )
        .unwrap();
        assert_eq!(table.kind, BlockKind::Table);
        assert_eq!(table.text(), "a\nb");
    }

    #[test]
    fn test_paragraph_properties_are_captured() {
        let block = Block::from_xml(
            "<w:p><w:pPr><w:pStyle w:val=\"Heading3\"/><w:jc w:val=\"center\"/></w:pPr><w:r><w:t>x</w:t></w:r></w:p>",
            &HashMap::new(),
        )
        .unwrap();
        let paragraph = block.as_paragraph().unwrap();
        assert_eq!(paragraph.style_id.as_deref(), Some("Heading3"));
        assert_eq!(
            paragraph.properties.as_deref(),
            Some("<w:pPr><w:pStyle w:val=\"Heading3\"/><w:jc w:val=\"center\"/></w:pPr>")
        );
    }

    #[test]
    fn test_paragraph_keeps_style_id() {
        let block = Block::paragraph(Some("Heading2"), "x");
        assert_eq!(
            block.as_paragraph().and_then(|p| p.style_id.as_deref()),
            Some("Heading2")
        );
    }

    #[test]
    fn test_empty_self_closing_body() {
        let xml = format!("<w:document xmlns:w=\"{W_NS}\"><w:body/></w:document>");
        let package = DocxPackage::from_parts(vec![part(DOCUMENT_PART, &xml)]);
        let mut doc = Document::from_package(package, Path::new("empty.docx")).unwrap();
        assert!(doc.blocks().is_empty());
        doc.push_paragraph(None, "added");
        assert!(doc.to_xml().contains("<w:body><w:p>"));
        assert!(doc.to_xml().ends_with("</w:body></w:document>"));
    }

    #[test]
    fn test_missing_document_part() {
        let err = Document::from_package(DocxPackage::default(), Path::new("x.docx")).unwrap_err();
        assert!(matches!(err, ComposerError::MissingPart { .. }));
    }

    #[test]
    fn test_declare_namespaces() {
        let mut doc = Document::blank();
        doc.declare_namespaces(&[
            ("w".to_string(), W_NS.to_string()),
            ("wp".to_string(), "urn:wp".to_string()),
        ]);
        let declared = doc.namespace_declarations();
        assert_eq!(declared.iter().filter(|(p, _)| p == "w").count(), 1);
        assert!(declared.contains(&("wp".to_string(), "urn:wp".to_string())));
    }
}
