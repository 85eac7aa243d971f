//! Three-level outline of a document: parts, chapters and sections.
//!
//! A part starts at a heading 1, a chapter at a heading 2 and a section at
//! a heading 3. Each section owns its heading and every following block up
//! to the next heading of any of the three levels. Body blocks outside a
//! section (an introduction under a chapter heading, say) belong to no node.

use crate::docx::{Document, HeadingClassifier, HeadingLevel};

/// Number of leading title characters compared against catalog codes.
pub const SECTION_KEY_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    /// Body positions; the first one is the heading.
    pub blocks: Vec<usize>,
}

impl Section {
    /// First characters of the trimmed title.
    pub fn key(&self) -> String {
        self.title.trim().chars().take(SECTION_KEY_LEN).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    /// Body position of the heading 2; `None` for sections without one.
    pub heading: Option<usize>,
    pub title: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Body position of the heading 1; `None` for chapters without one.
    pub heading: Option<usize>,
    pub title: String,
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    pub parts: Vec<Part>,
}

impl Outline {
    /// Build the outline of `doc`.
    pub fn build(doc: &Document, classifier: &HeadingClassifier) -> Self {
        let mut outline = Self::default();
        let mut in_section = false;

        for (position, block) in doc.blocks().iter().enumerate() {
            let title = block.text().trim().to_string();
            match classifier.classify_block(block) {
                HeadingLevel::H1 => {
                    outline.parts.push(Part {
                        heading: Some(position),
                        title,
                        chapters: Vec::new(),
                    });
                    in_section = false;
                }
                HeadingLevel::H2 => {
                    outline.current_part().chapters.push(Chapter {
                        heading: Some(position),
                        title,
                        sections: Vec::new(),
                    });
                    in_section = false;
                }
                HeadingLevel::H3 => {
                    outline.current_chapter().sections.push(Section {
                        title,
                        blocks: vec![position],
                    });
                    in_section = true;
                }
                HeadingLevel::Body => {
                    if !in_section {
                        continue;
                    }
                    if let Some(section) = outline.current_chapter().sections.last_mut() {
                        section.blocks.push(position);
                    }
                }
            }
        }
        outline
    }

    fn current_part(&mut self) -> &mut Part {
        if self.parts.is_empty() {
            self.parts.push(Part {
                heading: None,
                title: String::new(),
                chapters: Vec::new(),
            });
        }
        let last = self.parts.len() - 1;
        &mut self.parts[last]
    }

    fn current_chapter(&mut self) -> &mut Chapter {
        let part = self.current_part();
        if part.chapters.is_empty() {
            part.chapters.push(Chapter {
                heading: None,
                title: String::new(),
                sections: Vec::new(),
            });
        }
        let last = part.chapters.len() - 1;
        &mut part.chapters[last]
    }

    /// Every section, in reading order.
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.parts
            .iter()
            .flat_map(|part| &part.chapters)
            .flat_map(|chapter| &chapter.sections)
    }

    pub fn section_count(&self) -> usize {
        self.sections().count()
    }

    /// Keep the sections accepted by `keep` and drop the rest.
    ///
    /// Chapters left without sections are dropped with their heading, and
    /// so are parts left without chapters. Returns the body positions of
    /// every dropped block, ascending.
    pub fn retain(&mut self, mut keep: impl FnMut(&Section) -> bool) -> Vec<usize> {
        let mut removed = Vec::new();
        for part in &mut self.parts {
            for chapter in &mut part.chapters {
                chapter.sections.retain(|section| {
                    let kept = keep(section);
                    if !kept {
                        removed.extend_from_slice(&section.blocks);
                    }
                    kept
                });
            }
            part.chapters.retain(|chapter| {
                if chapter.sections.is_empty() {
                    removed.extend(chapter.heading);
                    return false;
                }
                true
            });
        }
        self.parts.retain(|part| {
            if part.chapters.is_empty() {
                removed.extend(part.heading);
                return false;
            }
            true
        });
        removed.sort_unstable();
        removed
    }
}
