//! Tests for the `docx-composer` binary.

mod common;

use std::fs;

use assert_cmd::Command;
use common::{save, sample_pliego};
use predicates::prelude::*;
use tempfile::TempDir;

fn composer() -> Command {
    Command::cargo_bin("docx-composer").unwrap_or_else(|e| panic!("binary not built: {e}"))
}

#[test]
fn test_codes_from_text_file() {
    let dir = TempDir::new().unwrap();
    let codes = dir.path().join("codes.txt");
    fs::write(&codes, "PPT001-x\n\nPPT002-z\n").unwrap();

    composer()
        .arg("codes")
        .arg(&codes)
        .assert()
        .success()
        .stdout("PPT001-x\nPPT002-z\n");
}

#[test]
fn test_split_missing_input() {
    let dir = TempDir::new().unwrap();

    composer()
        .args(["split", "missing.docx", "--output"])
        .arg(dir.path())
        .current_dir(dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: Input not found"));
}

#[test]
fn test_split_then_merge() {
    let dir = TempDir::new().unwrap();
    let input = save(&sample_pliego(), &dir.path().join("original.docx"));
    let out = dir.path().join("out");

    composer()
        .arg("split")
        .arg(&input)
        .arg("--output")
        .arg(&out)
        .args(["--chunks", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sections: 4"));

    let codes = dir.path().join("codes.txt");
    fs::write(&codes, "PPT003-a\nZZZ999\n").unwrap();
    let output = dir.path().join("composed.docx");

    composer()
        .arg("merge")
        .arg("--sections")
        .arg(out.join("sections"))
        .arg("--codes")
        .arg(&codes)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Merged 1 section(s)"));

    assert!(output.is_file());
    assert_eq!(
        fs::read_to_string(dir.path().join("unmatched_codes.txt")).unwrap(),
        "ZZZ999\n"
    );
}

#[test]
fn test_filter_reports_counts() {
    let dir = TempDir::new().unwrap();
    let input = save(&sample_pliego(), &dir.path().join("original.docx"));
    let codes = dir.path().join("codes.txt");
    fs::write(&codes, "PPT001a\nPPT004\n").unwrap();

    composer()
        .arg("filter")
        .arg(&input)
        .arg("--codes")
        .arg(&codes)
        .arg("--output")
        .arg(dir.path().join("filtered.docx"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Kept: 2").and(predicate::str::contains("Removed: 2")));
}
