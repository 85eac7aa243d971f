//! Position bookkeeping and range deletion over a document body.
//!
//! Paragraph indices count paragraphs only; body positions count every
//! top-level block. Tables and other blocks occupy a body position but no
//! paragraph index. Positions are computed fresh from the block list, so
//! they are only valid until the next structural mutation.

use super::document::Document;
use super::heading::{HeadingClassifier, HeadingLevel};

/// Body position of every paragraph, in reading order.
///
/// `positions(doc)[i]` is the body position of paragraph `i`.
pub fn positions(doc: &Document) -> Vec<usize> {
    doc.paragraphs().map(|(position, _)| position).collect()
}

/// Body position of paragraph `paragraph_index`, if it exists.
pub fn body_position(doc: &Document, paragraph_index: usize) -> Option<usize> {
    doc.paragraphs().nth(paragraph_index).map(|(position, _)| position)
}

/// Delete every block whose body position is outside `[keep_start, keep_end]`.
///
/// An inverted range (`keep_start > keep_end`) deletes the whole body. The
/// trailing section properties are not blocks and always survive.
pub fn delete_outside_range(doc: &mut Document, keep_start: usize, keep_end: usize) {
    let blocks = doc.blocks_mut();
    if keep_start > keep_end {
        blocks.clear();
        return;
    }
    blocks.truncate(keep_end.saturating_add(1));
    let leading = keep_start.min(blocks.len());
    blocks.drain(..leading);
}

/// Remove every heading 1 and heading 2 paragraph. Returns how many went.
pub fn remove_upper_headings(doc: &mut Document, classifier: &HeadingClassifier) -> usize {
    let blocks = doc.blocks_mut();
    let before = blocks.len();
    blocks.retain(|block| !classifier.classify_block(block).is_upper());
    before - blocks.len()
}

/// Paragraph indices (not body positions) of every heading 3 paragraph.
pub fn heading3_indices(doc: &Document, classifier: &HeadingClassifier) -> Vec<usize> {
    doc.paragraphs()
        .enumerate()
        .filter(|(_, (_, block))| classifier.classify_block(block) == HeadingLevel::H3)
        .map(|(index, _)| index)
        .collect()
}
