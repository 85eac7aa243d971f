//! Ordered assembly of matched sections into one document.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempPath;

use crate::config::MergeConfig;
use crate::docx::{Composer, Document};
use crate::error::Result;
use crate::matcher::{MatchResult, SectionIndex};
use crate::relabel::Relabeler;

/// Outcome of [`merge_in_order`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub output_path: PathBuf,
    pub report_path: PathBuf,
    /// Identifiers appended, in output order.
    pub appended: Vec<String>,
    /// Identifiers without a section file, in input order.
    pub skipped: Vec<String>,
}

impl MergeReport {
    /// Human-readable summary pointing at the report file.
    pub fn summary(&self) -> String {
        format!(
            "Merged {} section(s) into {}. {} identifier(s) not found; see {}",
            self.appended.len(),
            self.output_path.display(),
            self.skipped.len(),
            self.report_path.display()
        )
    }
}

/// Append the section of every identifier, in order, onto the base template.
///
/// Identifiers without a section file are skipped and listed in the report
/// file; only matched sections consume an ordinal. Temporary relabeled
/// copies are removed whether or not the merge succeeds.
pub fn merge_in_order(config: &MergeConfig, identifiers: &[String]) -> Result<MergeReport> {
    let index = SectionIndex::scan(&config.sections_dir)?;
    let base = match &config.base_template {
        Some(path) => Document::open(path)?,
        None => Document::blank(),
    };
    let relabeler = Relabeler::from_config(config);
    let mut composer = Composer::new(base);

    // Dropping these on an early return deletes the files.
    let mut temp_files: Vec<TempPath> = Vec::new();
    let mut appended = Vec::new();
    let mut skipped = Vec::new();

    for identifier in identifiers {
        let path = match index.find(identifier) {
            MatchResult::Found(path) => path,
            MatchResult::NotFound {
                identifier,
                search_key,
            } => {
                tracing::warn!(identifier = %identifier, search_key = %search_key, "No section file found; skipping");
                skipped.push(identifier);
                continue;
            }
        };

        let ordinal = appended.len() + 1;
        let temp = relabeler.relabel(&path, identifier, ordinal)?;
        let section = Document::open(&temp)?;
        temp_files.push(temp);

        composer.append(&section)?;
        tracing::info!(identifier = %identifier, ordinal, source = %path.display(), "Appended section");
        appended.push(identifier.clone());
    }

    if let Some(parent) = non_empty_parent(&config.output_path) {
        fs::create_dir_all(parent)?;
    }
    composer.save(&config.output_path)?;
    tracing::info!(
        path = %config.output_path.display(),
        sections = appended.len(),
        "Saved composed document"
    );

    for temp in temp_files {
        let shown = temp.display().to_string();
        if let Err(e) = temp.close() {
            tracing::warn!(path = %shown, error = %e, "Failed to remove temporary file");
        }
    }

    write_report(&config.report_path, &skipped)?;

    Ok(MergeReport {
        output_path: config.output_path.clone(),
        report_path: config.report_path.clone(),
        appended,
        skipped,
    })
}

/// Write one identifier per line, UTF-8.
pub fn write_report(path: &Path, identifiers: &[String]) -> Result<()> {
    if let Some(parent) = non_empty_parent(path) {
        fs::create_dir_all(parent)?;
    }
    let mut content = String::new();
    for identifier in identifiers {
        content.push_str(identifier);
        content.push('\n');
    }
    fs::write(path, content)?;
    tracing::debug!(path = %path.display(), count = identifiers.len(), "Wrote unmatched identifier report");
    Ok(())
}

fn non_empty_parent(path: &Path) -> Option<&Path> {
    path.parent().filter(|parent| !parent.as_os_str().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_report_creates_parent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ficheros").join("unmatched.txt");
        write_report(&path, &["ZZZ999-y".to_string(), "AAA000".to_string()]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "ZZZ999-y\nAAA000\n");
    }

    #[test]
    fn test_write_empty_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("unmatched.txt");
        write_report(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_summary_mentions_report() {
        let report = MergeReport {
            output_path: PathBuf::from("out.docx"),
            report_path: PathBuf::from("unmatched_codes.txt"),
            appended: vec!["PPT001-x".to_string()],
            skipped: vec!["ZZZ999-y".to_string()],
        };
        let summary = report.summary();
        assert!(summary.contains("Merged 1 section(s) into out.docx"));
        assert!(summary.contains("1 identifier(s) not found; see unmatched_codes.txt"));
    }

    #[test]
    fn test_missing_sections_dir_is_fatal() {
        let dir = TempDir::new().unwrap();
        let config = MergeConfig::new(dir.path().join("missing"), dir.path().join("out.docx"));
        let err = merge_in_order(&config, &["PPT001".to_string()]).unwrap_err();
        assert!(matches!(err, crate::error::ComposerError::InputMissing { .. }));
        assert!(!dir.path().join("out.docx").exists());
    }
}
