//! Resolution of identifiers to section files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::search_key;
use crate::error::{ComposerError, Result};

/// Outcome of looking up one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    Found(PathBuf),
    NotFound { identifier: String, search_key: String },
}

impl MatchResult {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Found(path) => Some(path),
            Self::NotFound { .. } => None,
        }
    }
}

/// Section files of a directory, sorted by file name.
#[derive(Debug, Clone)]
pub struct SectionIndex {
    dir: PathBuf,
    files: Vec<(String, PathBuf)>,
}

impl SectionIndex {
    /// List the `.docx` files of `dir`.
    pub fn scan(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(ComposerError::input_missing(dir));
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let is_docx = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("docx"));
            if !is_docx {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|n| n.to_str()) {
                files.push((stem.to_string(), path.clone()));
            }
        }
        files.sort();
        tracing::debug!(dir = %dir.display(), files = files.len(), "Indexed section files");
        Ok(Self {
            dir: dir.to_path_buf(),
            files,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// First file, in name order, whose stem contains the identifier's key.
    ///
    /// The key is the normalized code when the identifier has one, the whole
    /// trimmed identifier otherwise. Matching is case-sensitive and an empty
    /// key matches nothing.
    pub fn find(&self, identifier: &str) -> MatchResult {
        let key = search_key(identifier).trim();
        let found = if key.is_empty() {
            None
        } else {
            self.files.iter().find(|(stem, _)| stem.contains(key))
        };
        match found {
            Some((_, path)) => MatchResult::Found(path.clone()),
            None => MatchResult::NotFound {
                identifier: identifier.to_string(),
                search_key: key.to_string(),
            },
        }
    }
}

/// Look up one identifier in `sections_dir`.
pub fn find(sections_dir: &Path, identifier: &str) -> Result<MatchResult> {
    Ok(SectionIndex::scan(sections_dir)?.find(identifier))
}
