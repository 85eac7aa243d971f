//! Identifier lists and catalog records.
//!
//! Identifiers come from a spreadsheet (the code column below a header
//! row), a JSON catalog, or a plain text file with one identifier per line.

use std::fs;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use serde::{Deserialize, Serialize};

use crate::error::{ComposerError, Result};
use crate::outline::SECTION_KEY_LEN;

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// One row of the work-item catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    #[serde(rename = "CÓDIGO", alias = "code")]
    pub code: String,
    #[serde(rename = "UD", alias = "unit", default)]
    pub unit: String,
    #[serde(rename = "RESUMEN", alias = "summary", default)]
    pub summary: String,
}

impl CatalogRecord {
    /// Leading characters of the code, compared against section titles.
    pub fn match_key(&self) -> String {
        self.code.chars().take(SECTION_KEY_LEN).collect()
    }
}

/// Parse a JSON array of catalog records.
pub fn parse_catalog(json: &str) -> Result<Vec<CatalogRecord>> {
    Ok(serde_json::from_str(json)?)
}

/// Load an ordered identifier list from `path`.
///
/// Spreadsheets yield the non-empty cells of the `column_heading` column,
/// sorted; catalogs yield their codes in file order; any other file yields
/// its non-empty trimmed lines.
pub fn load_identifiers(path: &Path, column_heading: &str) -> Result<Vec<String>> {
    if !path.is_file() {
        return Err(ComposerError::input_missing(path));
    }
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let identifiers = if SPREADSHEET_EXTENSIONS.contains(&extension.as_str()) {
        spreadsheet_codes(path, column_heading)?
    } else if extension == "json" {
        let records = parse_catalog(&fs::read_to_string(path)?)?;
        records.into_iter().map(|record| record.code).collect()
    } else {
        lines(&fs::read_to_string(path)?)
    };
    tracing::info!(path = %path.display(), count = identifiers.len(), "Loaded identifiers");
    Ok(identifiers)
}

/// Non-empty trimmed lines.
pub fn lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn spreadsheet_codes(path: &Path, column_heading: &str) -> Result<Vec<String>> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet_names = workbook.sheet_names().to_owned();
    let Some(first) = sheet_names.first() else {
        return Err(ComposerError::HeaderNotFound {
            heading: column_heading.to_string(),
            path: path.to_path_buf(),
        });
    };
    let range = workbook.worksheet_range(first)?;
    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    codes_from_rows(&rows, column_heading).ok_or_else(|| ComposerError::HeaderNotFound {
        heading: column_heading.to_string(),
        path: path.to_path_buf(),
    })
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

/// Codes below the first row that has a cell containing `column_heading`.
///
/// Rows above the header are dropped, empty cells skipped, and the result
/// sorted. `None` when no header row exists.
pub fn codes_from_rows(rows: &[Vec<String>], column_heading: &str) -> Option<Vec<String>> {
    let (header_index, column) = rows.iter().enumerate().find_map(|(i, row)| {
        row.iter()
            .position(|cell| cell.contains(column_heading))
            .map(|column| (i, column))
    })?;

    let mut codes: Vec<String> = rows[header_index + 1..]
        .iter()
        .filter_map(|row| row.get(column))
        .filter(|cell| !cell.is_empty())
        .cloned()
        .collect();
    codes.sort();
    Some(codes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_codes_from_rows() {
        let rows = vec![
            row(&["PRESUPUESTO", ""]),
            row(&["", ""]),
            row(&["Nº", "CÓDIGO", "UD"]),
            row(&["1", "PPT002-z", "m3"]),
            row(&["2", "", "m2"]),
            row(&["3", "PPT001-x"]),
            row(&["4"]),
        ];
        assert_eq!(
            codes_from_rows(&rows, "CÓDIGO"),
            Some(vec!["PPT001-x".to_string(), "PPT002-z".to_string()])
        );
    }

    #[test]
    fn test_codes_from_rows_without_header() {
        let rows = vec![row(&["a", "b"])];
        assert_eq!(codes_from_rows(&rows, "CÓDIGO"), None);
    }

    #[test]
    fn test_parse_catalog_with_aliases() {
        let json = r#"[
            {"CÓDIGO": "PPT001a", "UD": "m3", "RESUMEN": "Hormigón"},
            {"code": "PPT002", "unit": "kg", "summary": "Acero"}
        ]"#;
        let records = parse_catalog(json).unwrap();
        assert_eq!(records[0].match_key(), "PPT001");
        assert_eq!(records[1].unit, "kg");
    }

    #[test]
    fn test_load_identifiers_from_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("codes.txt");
        fs::write(&path, "PPT001-x\n\n  ZZZ999-y \nPPT002-z\n").unwrap();
        assert_eq!(
            load_identifiers(&path, "CÓDIGO").unwrap(),
            vec!["PPT001-x", "ZZZ999-y", "PPT002-z"]
        );
    }

    #[test]
    fn test_load_identifiers_from_json_keeps_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, r#"[{"CÓDIGO": "B"}, {"CÓDIGO": "A"}]"#).unwrap();
        assert_eq!(load_identifiers(&path, "CÓDIGO").unwrap(), vec!["B", "A"]);
    }

    #[test]
    fn test_load_identifiers_missing_file() {
        let err = load_identifiers(Path::new("/nonexistent/codes.txt"), "CÓDIGO").unwrap_err();
        assert!(matches!(err, ComposerError::InputMissing { .. }));
    }
}
