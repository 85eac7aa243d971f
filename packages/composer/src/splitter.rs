//! Two-phase splitting of a large document into one file per section.
//!
//! Phase 1 cuts the source into a handful of chunks at heading 3
//! boundaries. Phase 2 cuts every chunk into its sections. Each extraction
//! works on its own clone of an unmodified document, so deletions made for
//! one output never leak into the next.

use std::collections::HashSet;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::config::{chunk_file_name, code_from_slug, slugify, SplitConfig};
use crate::docx::navigator::{body_position, delete_outside_range, heading3_indices, remove_upper_headings};
use crate::docx::{Document, HeadingClassifier};
use crate::error::{ComposerError, Result};

/// A heading 3 paragraph found while scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    /// Paragraph index (not body position).
    pub paragraph_index: usize,
    pub slug: String,
}

/// Files produced by [`split`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitOutput {
    pub chunk_files: Vec<PathBuf>,
    pub section_files: Vec<PathBuf>,
    pub sections_dir: PathBuf,
}

/// Split `config.input_path` into chunk and section files under `config.output_dir`.
///
/// Fails with [`ComposerError::NoHeadingBoundaries`] before writing
/// anything when the source has no heading 3 paragraph.
pub fn split(config: &SplitConfig) -> Result<SplitOutput> {
    let classifier = HeadingClassifier::new(&config.headings);
    let source = Document::open(&config.input_path)?;

    // Phase 1: find the boundaries
    let boundaries = scan_boundaries(&source, &classifier);
    if boundaries.is_empty() {
        return Err(ComposerError::NoHeadingBoundaries {
            path: config.input_path.clone(),
        });
    }
    tracing::info!(
        path = %config.input_path.display(),
        sections = boundaries.len(),
        "Found section boundaries"
    );

    let chunks_dir = config.chunks_dir();
    let sections_dir = config.sections_dir();
    fs::create_dir_all(&chunks_dir)?;
    fs::create_dir_all(&sections_dir)?;

    let chunk_files = write_chunks(&source, &boundaries, config.chunk_count, &classifier, &chunks_dir)?;

    // Phase 2: one file per section
    let mut written = HashSet::new();
    let mut section_files = Vec::new();
    for chunk in &chunk_files {
        for path in extract_sections(chunk, &classifier, &sections_dir)? {
            if written.insert(path.clone()) {
                section_files.push(path);
            } else {
                tracing::warn!(path = %path.display(), "Duplicate section code; later section overwrote earlier one");
            }
        }
    }
    tracing::info!(
        chunks = chunk_files.len(),
        sections = section_files.len(),
        dir = %sections_dir.display(),
        "Split complete"
    );

    Ok(SplitOutput {
        chunk_files,
        section_files,
        sections_dir,
    })
}

/// Heading 3 paragraphs of a document, with their slugs.
pub fn scan_boundaries(doc: &Document, classifier: &HeadingClassifier) -> Vec<Boundary> {
    let indices = heading3_indices(doc, classifier);
    let texts: Vec<&str> = doc.paragraphs().map(|(_, block)| block.text()).collect();
    indices
        .into_iter()
        .map(|paragraph_index| Boundary {
            paragraph_index,
            slug: slugify(texts.get(paragraph_index).copied().unwrap_or_default()),
        })
        .collect()
}

/// Contiguous groups of `ceil(total / requested)` items; the last may be smaller.
///
/// # Examples
/// ```
/// use docx_composer::splitter::partition;
///
/// assert_eq!(partition(10, 3), vec![0..4, 4..8, 8..10]);
/// assert_eq!(partition(3, 10), vec![0..1, 1..2, 2..3]);
/// ```
pub fn partition(total: usize, requested: usize) -> Vec<Range<usize>> {
    if total == 0 {
        return Vec::new();
    }
    let per_group = total.div_ceil(requested.max(1));
    (0..total)
        .step_by(per_group)
        .map(|start| start..(start + per_group).min(total))
        .collect()
}

/// Body positions `[start, end]` of the content from one heading 3 up to
/// the next boundary, or to the end of the body.
///
/// Tables and other blocks between the last paragraph and the next
/// boundary belong to the section.
fn section_range(doc: &Document, start_paragraph: usize, next_paragraph: Option<usize>) -> Option<(usize, usize)> {
    let start = body_position(doc, start_paragraph)?;
    let end = match next_paragraph.and_then(|next| body_position(doc, next)) {
        Some(next_position) => next_position.checked_sub(1)?,
        None => doc.blocks().len().checked_sub(1)?,
    };
    Some((start, end))
}

/// A working copy of `source` reduced to `[start, end]`, without heading 1/2.
fn extract(source: &Document, start: usize, end: usize, classifier: &HeadingClassifier) -> Document {
    let mut working = source.clone();
    delete_outside_range(&mut working, start, end);
    remove_upper_headings(&mut working, classifier);
    working
}

fn write_chunks(
    source: &Document,
    boundaries: &[Boundary],
    chunk_count: usize,
    classifier: &HeadingClassifier,
    chunks_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let groups = partition(boundaries.len(), chunk_count);
    let mut chunk_files = Vec::with_capacity(groups.len());

    for (number, group) in groups.iter().enumerate() {
        let first = boundaries[group.start].paragraph_index;
        let next = boundaries.get(group.end).map(|b| b.paragraph_index);
        let Some((start, end)) = section_range(source, first, next) else {
            continue;
        };

        let mut chunk = extract(source, start, end, classifier);
        let path = chunks_dir.join(chunk_file_name(number + 1));
        chunk.save(&path)?;
        tracing::info!(
            chunk = number + 1,
            sections = group.len(),
            path = %path.display(),
            "Wrote chunk"
        );
        chunk_files.push(path);
    }
    Ok(chunk_files)
}

/// Write one file per heading 3 section of a chunk file.
///
/// Sections sharing a code share a file name; the later one wins.
pub fn extract_sections(
    chunk_path: &Path,
    classifier: &HeadingClassifier,
    sections_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let chunk = Document::open(chunk_path)?;
    let boundaries = scan_boundaries(&chunk, classifier);
    let mut written = Vec::with_capacity(boundaries.len());

    for (i, boundary) in boundaries.iter().enumerate() {
        let next = boundaries.get(i + 1).map(|b| b.paragraph_index);
        let Some((start, end)) = section_range(&chunk, boundary.paragraph_index, next) else {
            continue;
        };

        let mut section = extract(&chunk, start, end, classifier);
        let code = code_from_slug(&boundary.slug);
        let path = sections_dir.join(format!("{code}.docx"));
        section.save(&path)?;
        tracing::debug!(code, blocks = section.blocks().len(), "Wrote section");
        written.push(path);
    }
    Ok(written)
}
