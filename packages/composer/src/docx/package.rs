//! The `.docx` zip container.
//!
//! A package is held as an ordered list of named parts. Writing is
//! deterministic: parts keep their order and every entry carries the same
//! fixed timestamp, so equal trees serialize to equal bytes.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use roxmltree::Document;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use super::xml::{attribute_value, escape_attr, find_children, CT_NS};
use crate::error::{ComposerError, Result};

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const DOCUMENT_PART: &str = "word/document.xml";
pub const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
pub const STYLES_PART: &str = "word/styles.xml";
pub const NUMBERING_PART: &str = "word/numbering.xml";

/// A named part of the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub data: Vec<u8>,
}

/// In-memory `.docx` package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocxPackage {
    parts: Vec<Part>,
}

impl DocxPackage {
    /// Create a package from parts, in order.
    pub fn from_parts(parts: Vec<Part>) -> Self {
        Self { parts }
    }

    /// Read a package from disk.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ComposerError::input_missing(path));
        }
        let file = File::open(path)?;
        Self::read(BufReader::new(file))
    }

    /// Read a package from any seekable reader.
    pub fn read<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut parts = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            if entry.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
            entry.read_to_end(&mut data)?;
            parts.push(Part {
                name: entry.name().to_string(),
                data,
            });
        }
        Ok(Self { parts })
    }

    /// Write the package to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Write the package to any seekable writer.
    pub fn write<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());
        for part in &self.parts {
            zip.start_file(part.name.as_str(), options)?;
            zip.write_all(&part.data)?;
        }
        zip.finish()?;
        Ok(())
    }

    /// Names of all parts, in order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|part| part.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.iter().any(|part| part.name == name)
    }

    /// Raw bytes of a part.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|part| part.name == name)
            .map(|part| part.data.as_slice())
    }

    /// A part decoded as UTF-8 text.
    pub fn part_str(&self, name: &str) -> Result<Option<String>> {
        match self.part(name) {
            Some(data) => Ok(Some(String::from_utf8(data.to_vec())?)),
            None => Ok(None),
        }
    }

    /// Replace a part, or append it when new.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        if let Some(part) = self.parts.iter_mut().find(|part| part.name == name) {
            part.data = data;
        } else {
            self.parts.push(Part {
                name: name.to_string(),
                data,
            });
        }
    }

    /// Pick a part name not yet used, keeping the extension of `wanted`.
    ///
    /// `word/media/image1.png` becomes `word/media/image1_2.png` when taken.
    pub fn unique_part_name(&self, wanted: &str) -> String {
        if !self.contains(wanted) {
            return wanted.to_string();
        }
        let (stem, ext) = match wanted.rfind('.') {
            Some(dot) if dot > wanted.rfind('/').map_or(0, |slash| slash + 1) => {
                (&wanted[..dot], &wanted[dot..])
            }
            _ => (wanted, ""),
        };
        let mut counter = 2;
        loop {
            let candidate = format!("{stem}_{counter}{ext}");
            if !self.contains(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }

    /// Content type declared for a part, by override or by extension default.
    pub fn content_type_of(&self, part_name: &str) -> Result<Option<String>> {
        let Some(xml) = self.part_str(CONTENT_TYPES_PART)? else {
            return Ok(None);
        };
        let doc = Document::parse(&xml)?;
        let root = doc.root_element();
        let override_name = format!("/{part_name}");
        if let Some(found) = find_children(root, "Override")
            .find(|node| attribute_value(*node, "PartName") == Some(override_name.as_str()))
        {
            return Ok(attribute_value(found, "ContentType").map(str::to_string));
        }
        let extension = extension_of(part_name);
        let found = find_children(root, "Default")
            .find(|node| {
                attribute_value(*node, "Extension")
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
            })
            .and_then(|node| attribute_value(node, "ContentType"))
            .map(str::to_string);
        Ok(found)
    }

    /// Declare a default content type for an extension, unless one exists.
    pub fn ensure_default_content_type(&mut self, extension: &str, content_type: &str) -> Result<()> {
        let xml = self.content_types_xml()?;
        let doc = Document::parse(&xml)?;
        let exists = find_children(doc.root_element(), "Default").any(|node| {
            attribute_value(node, "Extension").is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        });
        if exists {
            return Ok(());
        }
        let entry = format!(
            "<Default Extension=\"{}\" ContentType=\"{}\"/>",
            escape_attr(extension),
            escape_attr(content_type)
        );
        self.insert_content_type(&xml, &entry);
        Ok(())
    }

    /// Declare an override content type for a part, unless one exists.
    pub fn ensure_override_content_type(&mut self, part_name: &str, content_type: &str) -> Result<()> {
        let xml = self.content_types_xml()?;
        let doc = Document::parse(&xml)?;
        let override_name = format!("/{part_name}");
        let exists = find_children(doc.root_element(), "Override")
            .any(|node| attribute_value(node, "PartName") == Some(override_name.as_str()));
        if exists {
            return Ok(());
        }
        let entry = format!(
            "<Override PartName=\"{}\" ContentType=\"{}\"/>",
            escape_attr(&override_name),
            escape_attr(content_type)
        );
        self.insert_content_type(&xml, &entry);
        Ok(())
    }

    fn content_types_xml(&self) -> Result<String> {
        Ok(self.part_str(CONTENT_TYPES_PART)?.unwrap_or_else(|| {
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<Types xmlns=\"{CT_NS}\"></Types>"
            )
        }))
    }

    fn insert_content_type(&mut self, xml: &str, entry: &str) {
        let updated = insert_before_close(xml, "</Types>", entry);
        self.set_part(CONTENT_TYPES_PART, updated.into_bytes());
    }
}

/// Extension of a part name, without the dot.
pub fn extension_of(part_name: &str) -> &str {
    let file = part_name.rsplit('/').next().unwrap_or(part_name);
    file.rsplit_once('.').map_or("", |(_, ext)| ext)
}

/// Insert `fragment` before the last occurrence of `close_tag`.
///
/// Self-closing roots (`<Types .../>`) are expanded first.
pub fn insert_before_close(xml: &str, close_tag: &str, fragment: &str) -> String {
    if let Some(close) = xml.rfind(close_tag) {
        let mut updated = String::with_capacity(xml.len() + fragment.len());
        updated.push_str(&xml[..close]);
        updated.push_str(fragment);
        updated.push_str(&xml[close..]);
        return updated;
    }
    let trimmed = xml.trim_end();
    match trimmed.strip_suffix("/>") {
        Some(open) => format!("{open}>{fragment}{close_tag}"),
        None => format!("{trimmed}{fragment}{close_tag}"),
    }
}
