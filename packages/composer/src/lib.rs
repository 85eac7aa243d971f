//! docx-composer - Split specification documents into sections and compose them by code list.
//!
//! A large `.docx` specification is split at its heading 3 paragraphs into
//! one file per section, named by the section code (three uppercase letters
//! and three digits). A code list then selects sections, which are
//! relabeled with numbered titles and appended, in order, onto a base
//! template. Codes without a section file are listed in a sidecar report.
//!
//! # Example
//!
//! ```
//! use docx_composer::config;
//!
//! assert_eq!(config::extract_code("01.02 PPT001-x"), Some("PPT001"));
//! assert_eq!(config::code_from_slug("PPT001_Hormigon"), "PPT001");
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Constants, configuration objects and naming helpers
//! - [`error`]: Error types and Result alias
//! - [`docx`]: Package, document model, heading classification and composition
//! - [`outline`]: Part / chapter / section tree of a document
//! - [`splitter`]: Two-phase split into chunk and section files
//! - [`matcher`]: Identifier to section file resolution
//! - [`relabel`]: Numbered section titles
//! - [`merge`]: Ordered composition and the unmatched-identifier report
//! - [`filter`]: Section filtering by code list
//! - [`codes`]: Identifier lists and catalog records
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod codes;
pub mod config;
pub mod docx;
pub mod error;
pub mod filter;
pub mod matcher;
pub mod merge;
pub mod outline;
pub mod relabel;
pub mod splitter;

// Re-export main operations
pub use filter::{filter_sections, FilterReport};
pub use merge::{merge_in_order, MergeReport};
pub use splitter::{split, SplitOutput};

// Re-export commonly used items
pub use config::{FontProfile, HeadingSynonyms, MergeConfig, SplitConfig};
pub use docx::{Document, HeadingClassifier, HeadingLevel};
pub use error::{ComposerError, Result};
pub use matcher::MatchResult;
