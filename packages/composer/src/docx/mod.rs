//! Word-processing document model.
//!
//! Packages are read and written as zip containers; the main part is kept
//! as a list of top-level blocks holding their raw XML.

pub mod compose;
pub mod document;
pub mod heading;
pub mod navigator;
pub mod numbering;
pub mod package;
pub mod relationships;
pub mod styles;
pub mod xml;

pub use compose::Composer;
pub use document::{Block, BlockKind, Document, Paragraph};
pub use heading::{HeadingClassifier, HeadingLevel};
pub use package::DocxPackage;
