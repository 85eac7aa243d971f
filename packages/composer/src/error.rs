//! Error types for the composer.
//!
//! Fatal conditions (missing inputs, documents without heading-3
//! boundaries, unreadable packages) are `ComposerError` variants.
//! Identifiers that cannot be matched to a section file are not errors;
//! they are collected into the merge report instead.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the composer library.
#[derive(Debug, Error)]
pub enum ComposerError {
    /// An input file or directory does not exist.
    #[error("Input not found: {}", .path.display())]
    InputMissing { path: PathBuf },

    /// The source document contains no heading-3 paragraph to split on.
    #[error("No heading 3 paragraphs found in {}", .path.display())]
    NoHeadingBoundaries { path: PathBuf },

    /// A required part is missing from the document package.
    #[error("Missing part '{part}' in {}", .path.display())]
    MissingPart { part: String, path: PathBuf },

    /// The package parsed, but its content is not a usable document.
    #[error("Malformed document {}: {reason}", .path.display())]
    MalformedDocument { path: PathBuf, reason: String },

    /// The spreadsheet has no row containing the requested column heading.
    #[error("No header row containing '{heading}' in {}", .path.display())]
    HeaderNotFound { heading: String, path: PathBuf },

    /// Zip container could not be read or written.
    #[error("Zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// A part is not valid UTF-8.
    #[error("Part is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Catalog JSON could not be decoded.
    #[error("Catalog JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),

    /// Spreadsheet could not be opened or read.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ComposerError {
    /// Build an `InputMissing` error for a path.
    pub fn input_missing(path: impl Into<PathBuf>) -> Self {
        Self::InputMissing { path: path.into() }
    }

    /// Build a `MalformedDocument` error for a path.
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for composer operations.
pub type Result<T> = std::result::Result<T, ComposerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_missing_display() {
        let err = ComposerError::input_missing("ficheros/original.docx");
        assert_eq!(err.to_string(), "Input not found: ficheros/original.docx");
    }

    #[test]
    fn test_no_heading_boundaries_display() {
        let err = ComposerError::NoHeadingBoundaries {
            path: PathBuf::from("pliego.docx"),
        };
        assert!(err.to_string().contains("heading 3"));
        assert!(err.to_string().contains("pliego.docx"));
    }

    #[test]
    fn test_header_not_found_display() {
        let err = ComposerError::HeaderNotFound {
            heading: "CÓDIGO".to_string(),
            path: PathBuf::from("partidas.xlsx"),
        };
        assert_eq!(
            err.to_string(),
            "No header row containing 'CÓDIGO' in partidas.xlsx"
        );
    }
}
