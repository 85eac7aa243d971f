//! Removal of sections that are not in a code list.

use std::collections::HashSet;
use std::path::Path;

use crate::config::HeadingSynonyms;
use crate::docx::{Document, HeadingClassifier};
use crate::error::Result;
use crate::outline::{Outline, SECTION_KEY_LEN};

/// Section titles kept and removed by [`filter_sections`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterReport {
    pub kept: Vec<String>,
    pub removed: Vec<String>,
}

/// Keys that a section title must start with to be kept.
pub fn allowed_keys<S: AsRef<str>>(codes: &[S]) -> HashSet<String> {
    codes
        .iter()
        .map(|code| code.as_ref().trim().chars().take(SECTION_KEY_LEN).collect())
        .collect()
}

/// Drop from `doc` every section whose key is not in `allowed`.
pub fn filter_document(doc: &mut Document, allowed: &HashSet<String>, classifier: &HeadingClassifier) -> FilterReport {
    let mut outline = Outline::build(doc, classifier);
    let mut report = FilterReport::default();
    let removed_positions = outline.retain(|section| {
        let keep = allowed.contains(&section.key());
        if keep {
            report.kept.push(section.title.clone());
        } else {
            report.removed.push(section.title.clone());
        }
        keep
    });

    let removed: HashSet<usize> = removed_positions.into_iter().collect();
    let mut position = 0;
    doc.blocks_mut().retain(|_| {
        let keep = !removed.contains(&position);
        position += 1;
        keep
    });
    report
}

/// Filter the sections of `input` and write the result to `output`.
pub fn filter_sections(
    input: &Path,
    allowed: &HashSet<String>,
    output: &Path,
    headings: &HeadingSynonyms,
) -> Result<FilterReport> {
    let classifier = HeadingClassifier::new(headings);
    let mut doc = Document::open(input)?;
    let report = filter_document(&mut doc, allowed, &classifier);
    doc.save(output)?;
    tracing::info!(
        kept = report.kept.len(),
        removed = report.removed.len(),
        path = %output.display(),
        "Filtered sections"
    );
    Ok(report)
}
