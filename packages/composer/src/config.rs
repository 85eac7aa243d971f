//! Configuration constants, configuration objects and small naming helpers.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Chunk count used when the caller does not pick one.
pub const DEFAULT_CHUNK_COUNT: usize = 10;

/// Maximum number of characters kept in a heading slug.
pub const SLUG_MAX_LEN: usize = 50;

/// Slug used for headings without any word characters.
pub const UNTITLED_SLUG: &str = "UNTITLED";

/// Separator that replaces runs of non-word characters in slugs.
pub const SLUG_SEPARATOR: char = '_';

/// Subdirectory of the split output that holds the coarse chunks.
pub const CHUNKS_DIR: &str = "chunks";

/// Subdirectory of the split output that holds one file per section.
pub const SECTIONS_DIR: &str = "sections";

/// File name of the unmatched-identifier report when none is configured.
pub const DEFAULT_REPORT_NAME: &str = "unmatched_codes.txt";

/// Ordinal prefix written in front of relabeled section titles.
pub const DEFAULT_ORDINAL_PREFIX: &str = "III";

/// Column heading that marks the identifier column in spreadsheets.
pub const DEFAULT_CODE_HEADING: &str = "CÓDIGO";

/// Marker character stripped from section titles when relabeling.
pub const TITLE_MARKER: char = '$';

/// Normalized code: three uppercase ASCII letters followed by three digits.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]{3}[0-9]{3}").expect("valid regex"));

/// Runs of non-word characters, collapsed into a single separator in slugs.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static NON_WORD_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\W+").expect("valid regex"));

/// Extract the normalized code from an identifier.
///
/// The match is case-sensitive: lowercase letters never form a code.
///
/// # Examples
/// ```
/// use docx_composer::config::extract_code;
///
/// assert_eq!(extract_code("PPT001-x"), Some("PPT001"));
/// assert_eq!(extract_code("ver PPT001a"), Some("PPT001"));
/// assert_eq!(extract_code("ppt001"), None);
/// ```
pub fn extract_code(identifier: &str) -> Option<&str> {
    CODE_PATTERN.find(identifier).map(|m| m.as_str())
}

/// Key used to search for an identifier's section file.
///
/// The normalized code when present, the whole identifier otherwise.
pub fn search_key(identifier: &str) -> &str {
    extract_code(identifier).unwrap_or(identifier)
}

/// Turn heading text into a file-system friendly slug.
///
/// # Examples
/// ```
/// use docx_composer::config::slugify;
///
/// assert_eq!(slugify("PPT001 $ Hormigón en masa"), "PPT001_Hormigón_en_masa");
/// assert_eq!(slugify("  ...  "), "UNTITLED");
/// ```
pub fn slugify(text: &str) -> String {
    let collapsed = NON_WORD_RUN.replace_all(text, SLUG_SEPARATOR.to_string().as_str());
    let trimmed = collapsed.trim_matches(SLUG_SEPARATOR);
    if trimmed.is_empty() {
        return UNTITLED_SLUG.to_string();
    }
    trimmed.chars().take(SLUG_MAX_LEN).collect()
}

/// Code part of a slug: the text before the first separator, or the whole slug.
///
/// # Examples
/// ```
/// use docx_composer::config::code_from_slug;
///
/// assert_eq!(code_from_slug("PPT001_Hormigon"), "PPT001");
/// assert_eq!(code_from_slug("PPT001"), "PPT001");
/// ```
pub fn code_from_slug(slug: &str) -> &str {
    slug.split(SLUG_SEPARATOR).next().unwrap_or(slug)
}

/// File name of the numbered chunk `index` (1-based).
pub fn chunk_file_name(index: usize) -> String {
    format!("chunk_{index:02}.docx")
}

/// Normalize a style label for comparison: NFC, trimmed, lowercase.
pub fn normalize_label(label: &str) -> String {
    label.trim().nfc().collect::<String>().to_lowercase()
}

/// Accepted style labels for each heading level.
///
/// Labels compare case-insensitively after Unicode normalization. A style
/// id such as `Heading3` also matches the label `Heading 3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingSynonyms {
    pub level1: Vec<String>,
    pub level2: Vec<String>,
    pub level3: Vec<String>,
}

impl HeadingSynonyms {
    /// Labels for all three levels, each in English and Spanish.
    fn for_levels() -> [Vec<String>; 3] {
        [1, 2, 3].map(|level| {
            ["Heading", "Título", "Titulo"]
                .iter()
                .map(|word| format!("{word} {level}"))
                .collect()
        })
    }

    /// Replace the level 3 labels.
    #[must_use]
    pub fn with_level3(mut self, labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.level3 = labels.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for HeadingSynonyms {
    fn default() -> Self {
        let [level1, level2, level3] = Self::for_levels();
        Self {
            level1,
            level2,
            level3,
        }
    }
}

/// Run formatting applied to relabeled section titles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontProfile {
    /// Font family, applied to the ASCII, high-ANSI, East Asian and complex-script slots.
    pub family: String,
    /// Size in half points (22 = 11 pt).
    pub size_half_points: u32,
    pub bold: bool,
    pub underline: bool,
    pub italic: bool,
}

impl Default for FontProfile {
    fn default() -> Self {
        Self {
            family: "Adif Fago No Regular".to_string(),
            size_half_points: 22,
            bold: true,
            underline: true,
            italic: false,
        }
    }
}

/// Inputs of the split operation.
#[derive(Debug, Clone)]
pub struct SplitConfig {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub chunk_count: usize,
    pub headings: HeadingSynonyms,
}

impl SplitConfig {
    /// Create a split configuration with default chunk count and headings.
    pub fn new(input_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_dir: output_dir.into(),
            chunk_count: DEFAULT_CHUNK_COUNT,
            headings: HeadingSynonyms::default(),
        }
    }

    /// Set the requested chunk count. Values below 1 are treated as 1.
    #[must_use]
    pub fn with_chunk_count(mut self, chunk_count: usize) -> Self {
        self.chunk_count = chunk_count.max(1);
        self
    }

    /// Set the heading synonyms.
    #[must_use]
    pub fn with_headings(mut self, headings: HeadingSynonyms) -> Self {
        self.headings = headings;
        self
    }

    /// Directory receiving the chunk files.
    pub fn chunks_dir(&self) -> PathBuf {
        self.output_dir.join(CHUNKS_DIR)
    }

    /// Directory receiving the section files.
    pub fn sections_dir(&self) -> PathBuf {
        self.output_dir.join(SECTIONS_DIR)
    }
}

/// Inputs of the merge operation.
#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Base template; `None` composes onto a blank document.
    pub base_template: Option<PathBuf>,
    pub sections_dir: PathBuf,
    pub output_path: PathBuf,
    pub report_path: PathBuf,
    /// Directory for relabeled temporary copies; the system default when `None`.
    pub temp_dir: Option<PathBuf>,
    pub headings: HeadingSynonyms,
    pub font: FontProfile,
    pub ordinal_prefix: String,
}

impl MergeConfig {
    /// Create a merge configuration. The report lands next to the output.
    pub fn new(sections_dir: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        let output_path = output_path.into();
        let report_path = default_report_path(&output_path);
        Self {
            base_template: None,
            sections_dir: sections_dir.into(),
            output_path,
            report_path,
            temp_dir: None,
            headings: HeadingSynonyms::default(),
            font: FontProfile::default(),
            ordinal_prefix: DEFAULT_ORDINAL_PREFIX.to_string(),
        }
    }

    #[must_use]
    pub fn with_base_template(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_template = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = path.into();
        self
    }

    #[must_use]
    pub fn with_temp_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_headings(mut self, headings: HeadingSynonyms) -> Self {
        self.headings = headings;
        self
    }

    #[must_use]
    pub fn with_font(mut self, font: FontProfile) -> Self {
        self.font = font;
        self
    }
}

/// Report path used when none is configured: beside the output document.
pub fn default_report_path(output_path: &Path) -> PathBuf {
    output_path
        .parent()
        .map(|dir| dir.join(DEFAULT_REPORT_NAME))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_code() {
        assert_eq!(extract_code("PPT001-x"), Some("PPT001"));
        assert_eq!(extract_code("ZZZ999-y"), Some("ZZZ999"));
        assert_eq!(extract_code("01.02 PPT002-z"), Some("PPT002"));
        assert_eq!(extract_code("PPT01"), None);
        assert_eq!(extract_code("Ppt001"), None);
    }

    #[test]
    fn test_search_key_falls_back_to_identifier() {
        assert_eq!(search_key("PPT001-x"), "PPT001");
        assert_eq!(search_key("no code here"), "no code here");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("PPT001 Hormigón"), "PPT001_Hormigón");
        assert_eq!(slugify("$PPT001$ - title"), "PPT001_title");
        assert_eq!(slugify(""), UNTITLED_SLUG);
        assert_eq!(slugify("---"), UNTITLED_SLUG);
    }

    #[test]
    fn test_slugify_truncates() {
        let long = "A".repeat(80);
        assert_eq!(slugify(&long).chars().count(), SLUG_MAX_LEN);
    }

    #[test]
    fn test_code_from_slug() {
        assert_eq!(code_from_slug("PPT001_Hormigon_en_masa"), "PPT001");
        assert_eq!(code_from_slug("UNTITLED"), "UNTITLED");
    }

    #[test]
    fn test_chunk_file_name() {
        assert_eq!(chunk_file_name(1), "chunk_01.docx");
        assert_eq!(chunk_file_name(12), "chunk_12.docx");
    }

    #[test]
    fn test_default_heading_synonyms() {
        let headings = HeadingSynonyms::default();
        assert!(headings.level3.contains(&"Heading 3".to_string()));
        assert!(headings.level3.contains(&"Título 3".to_string()));
        assert!(headings.level1.contains(&"Heading 1".to_string()));
    }

    #[test]
    fn test_split_config_clamps_chunk_count() {
        let config = SplitConfig::new("in.docx", "out").with_chunk_count(0);
        assert_eq!(config.chunk_count, 1);
        assert_eq!(config.sections_dir(), PathBuf::from("out").join("sections"));
    }

    #[test]
    fn test_merge_config_report_beside_output() {
        let config = MergeConfig::new("sections", "ficheros/output.docx");
        assert_eq!(
            config.report_path,
            PathBuf::from("ficheros").join(DEFAULT_REPORT_NAME)
        );
    }
}
