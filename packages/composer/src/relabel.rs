//! Numbered titles for matched sections.
//!
//! The first heading 3 of a section gets a title of the form
//! `III.07 <heading text with the code replaced by the full identifier> `,
//! written as a single run with a fixed font profile. Section files on disk
//! are never modified; the relabeled document goes to a temporary copy.

use std::path::{Path, PathBuf};

use tempfile::{Builder, TempPath};

use crate::config::{search_key, FontProfile, MergeConfig, DEFAULT_ORDINAL_PREFIX, TITLE_MARKER};
use crate::docx::xml::{escape_attr, escape_text, W_NS};
use crate::docx::{Block, Document, HeadingClassifier, HeadingLevel};
use crate::error::Result;

/// Build the relabeled title text.
///
/// # Examples
/// ```
/// use docx_composer::relabel::relabeled_title;
///
/// assert_eq!(
///     relabeled_title("PPT001 $Hormigón", "PPT001-x", "III", 1),
///     "III.01 PPT001-x Hormigón "
/// );
/// ```
pub fn relabeled_title(heading_text: &str, identifier: &str, prefix: &str, ordinal: usize) -> String {
    let stripped: String = heading_text.chars().filter(|c| *c != TITLE_MARKER).collect();
    let title = stripped.replacen(search_key(identifier), identifier, 1);
    format!("{prefix}.{ordinal:02} {title} ")
}

/// A single run carrying `text` with the given font profile.
pub fn title_run_xml(text: &str, font: &FontProfile) -> String {
    let family = escape_attr(&font.family);
    let toggle = |name: &str, on: bool| {
        if on {
            format!("<w:{name}/>")
        } else {
            format!("<w:{name} w:val=\"0\"/>")
        }
    };
    let underline = if font.underline { "single" } else { "none" };
    format!(
        concat!(
            "<w:r><w:rPr>",
            "<w:rFonts w:ascii=\"{family}\" w:hAnsi=\"{family}\" w:eastAsia=\"{family}\" w:cs=\"{family}\"/>",
            "{bold}{italic}<w:sz w:val=\"{size}\"/><w:szCs w:val=\"{size}\"/><w:u w:val=\"{underline}\"/>",
            "</w:rPr><w:t xml:space=\"preserve\">{text}</w:t></w:r>"
        ),
        family = family,
        bold = toggle("b", font.bold),
        italic = toggle("i", font.italic),
        size = font.size_half_points,
        underline = underline,
        text = escape_text(text),
    )
}

/// Rewrites section titles and writes the result to temporary copies.
#[derive(Debug, Clone)]
pub struct Relabeler {
    classifier: HeadingClassifier,
    font: FontProfile,
    prefix: String,
    temp_dir: Option<PathBuf>,
}

impl Relabeler {
    pub fn new(classifier: HeadingClassifier, font: FontProfile) -> Self {
        Self {
            classifier,
            font,
            prefix: DEFAULT_ORDINAL_PREFIX.to_string(),
            temp_dir: None,
        }
    }

    pub fn from_config(config: &MergeConfig) -> Self {
        Self {
            classifier: HeadingClassifier::new(&config.headings),
            font: config.font.clone(),
            prefix: config.ordinal_prefix.clone(),
            temp_dir: config.temp_dir.clone(),
        }
    }

    /// Relabel the first heading 3 of `doc` in place.
    ///
    /// Returns the new title, or `None` when the document has no heading 3
    /// and was left unchanged.
    pub fn relabel_document(&self, doc: &mut Document, identifier: &str, ordinal: usize) -> Option<String> {
        let (position, block) = doc
            .paragraphs()
            .find(|(_, block)| self.classifier.classify_block(block) == HeadingLevel::H3)?;

        let title = relabeled_title(block.text(), identifier, &self.prefix, ordinal);
        let paragraph = block.as_paragraph();
        let properties = paragraph.and_then(|p| p.properties.clone());
        let style_id = paragraph.and_then(|p| p.style_id.clone());
        let run = title_run_xml(&title, &self.font);

        // The new run is written with the `w` prefix.
        doc.declare_namespaces(&[("w".to_string(), W_NS.to_string())]);
        doc.replace_block(
            position,
            Block::paragraph_with_runs(properties, style_id, &run, &title),
        );
        Some(title)
    }

    /// Relabel a copy of `section_path` and return the temporary copy.
    ///
    /// The copy is deleted when the returned handle is dropped or closed.
    pub fn relabel(&self, section_path: &Path, identifier: &str, ordinal: usize) -> Result<TempPath> {
        let mut doc = Document::open(section_path)?;
        match self.relabel_document(&mut doc, identifier, ordinal) {
            Some(title) => tracing::debug!(identifier, title = %title, "Relabeled section"),
            None => tracing::warn!(
                identifier,
                path = %section_path.display(),
                "Section has no heading 3; left unchanged"
            ),
        }

        let mut builder = Builder::new();
        builder.prefix("section_").suffix(".docx");
        let temp = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        let path = temp.into_temp_path();
        doc.save(&path)?;
        Ok(path)
    }
}
