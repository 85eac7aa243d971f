//! Heading classification of paragraphs.

use crate::config::{normalize_label, HeadingSynonyms};

use super::document::{Block, Paragraph};

/// Outline role of a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
    Body,
}

impl HeadingLevel {
    /// Whether this is a part or chapter heading.
    pub fn is_upper(self) -> bool {
        matches!(self, Self::H1 | Self::H2)
    }
}

/// Classifies paragraphs by style label against configured synonyms.
#[derive(Debug, Clone)]
pub struct HeadingClassifier {
    levels: [(HeadingLevel, Vec<String>); 3],
}

impl HeadingClassifier {
    pub fn new(synonyms: &HeadingSynonyms) -> Self {
        let normalize = |labels: &[String]| -> Vec<String> {
            labels.iter().map(|label| normalize_label(label)).collect()
        };
        Self {
            levels: [
                (HeadingLevel::H1, normalize(&synonyms.level1)),
                (HeadingLevel::H2, normalize(&synonyms.level2)),
                (HeadingLevel::H3, normalize(&synonyms.level3)),
            ],
        }
    }

    /// Classify a paragraph.
    ///
    /// The style name is compared first. The style id is accepted too,
    /// against the synonyms with spaces removed, so `Heading3` is a level 3
    /// heading even when the styles part is missing.
    pub fn classify(&self, paragraph: &Paragraph) -> HeadingLevel {
        if let Some(name) = &paragraph.style_name {
            let name = normalize_label(name);
            if let Some(level) = self.level_of(|label| *label == name) {
                return level;
            }
        }
        if let Some(id) = &paragraph.style_id {
            let id = normalize_label(id);
            if let Some(level) = self.level_of(|label| label.replace(' ', "") == id) {
                return level;
            }
        }
        HeadingLevel::Body
    }

    /// Classify a block; non-paragraphs are body content.
    pub fn classify_block(&self, block: &Block) -> HeadingLevel {
        block
            .as_paragraph()
            .map_or(HeadingLevel::Body, |paragraph| self.classify(paragraph))
    }

    fn level_of(&self, matches: impl Fn(&String) -> bool) -> Option<HeadingLevel> {
        self.levels
            .iter()
            .find(|(_, labels)| labels.iter().any(&matches))
            .map(|(level, _)| *level)
    }
}

impl Default for HeadingClassifier {
    fn default() -> Self {
        Self::new(&HeadingSynonyms::default())
    }
}
