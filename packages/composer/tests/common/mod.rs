//! Fixture documents built in memory and saved to temporary directories.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use docx_composer::docx::Block;
use docx_composer::{Document, HeadingClassifier, HeadingLevel};

pub const TABLE: &str =
    "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>";

/// One element of a fixture body.
pub enum Item<'a> {
    H1(&'a str),
    H2(&'a str),
    H3(&'a str),
    Body(&'a str),
    Table,
}

pub fn build(items: &[Item<'_>]) -> Document {
    let mut doc = Document::blank();
    for item in items {
        match item {
            Item::H1(text) => doc.push_paragraph(Some("Heading1"), text),
            Item::H2(text) => doc.push_paragraph(Some("Heading2"), text),
            Item::H3(text) => doc.push_paragraph(Some("Heading3"), text),
            Item::Body(text) => doc.push_paragraph(None, text),
            Item::Table => doc.push_block(
                Block::from_xml(TABLE, &Default::default()).expect("valid table fixture"),
            ),
        }
    }
    doc
}

pub fn save(items: &[Item<'_>], path: &Path) -> PathBuf {
    let mut doc = build(items);
    doc.save(path)
        .unwrap_or_else(|e| panic!("Failed to save {}: {}", path.display(), e));
    path.to_path_buf()
}

/// Four sections under two parts, with tables and an orphan body paragraph.
pub fn sample_pliego() -> Vec<Item<'static>> {
    use Item::*;
    vec![
        Body("Pliego de prescripciones"),
        H1("Parte I"),
        H2("Capítulo 1"),
        H3("PPT001 $ Hormigón en masa"),
        Body("a1"),
        Table,
        Body("a2"),
        H3("PPT002 Acero"),
        Body("b1"),
        H2("Capítulo 2"),
        H3("PPT003 Madera"),
        Body("c1"),
        Table,
        H1("Parte II"),
        H3("PPT004 Vidrio"),
        Table,
    ]
}

/// Texts of every block.
pub fn texts(doc: &Document) -> Vec<String> {
    doc.blocks().iter().map(|b| b.text().to_string()).collect()
}

/// Texts of the heading 3 paragraphs.
pub fn heading3_texts(doc: &Document) -> Vec<String> {
    let classifier = HeadingClassifier::default();
    doc.blocks()
        .iter()
        .filter(|b| classifier.classify_block(b) == HeadingLevel::H3)
        .map(|b| b.text().to_string())
        .collect()
}

/// Sorted file names of a directory.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("Failed to list {}: {}", dir.display(), e))
        .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
