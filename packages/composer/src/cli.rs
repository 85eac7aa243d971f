//! Command-line interface for the composer.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::codes::load_identifiers;
use crate::config::{MergeConfig, SplitConfig, DEFAULT_CHUNK_COUNT, DEFAULT_CODE_HEADING};
use crate::error::Result;
use crate::filter::{allowed_keys, filter_sections};
use crate::merge::merge_in_order;
use crate::splitter::split;

/// Split specification documents into sections and compose them back by code list.
#[derive(Parser)]
#[command(name = "docx-composer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split a document into chunk files and one file per heading 3 section.
    Split {
        /// Source .docx document
        input: PathBuf,

        /// Output directory (receives chunks/ and sections/)
        #[arg(short, long)]
        output: PathBuf,

        /// Number of intermediate chunks
        #[arg(short, long, default_value_t = DEFAULT_CHUNK_COUNT)]
        chunks: usize,
    },

    /// Compose matched sections, in code-list order, into one document.
    Merge {
        /// Directory of section files
        #[arg(short, long)]
        sections: PathBuf,

        /// Code list: spreadsheet, JSON catalog or text file
        #[arg(short, long)]
        codes: PathBuf,

        /// Output .docx document
        #[arg(short, long)]
        output: PathBuf,

        /// Base template (default: a blank document)
        #[arg(short, long)]
        base: Option<PathBuf>,

        /// Unmatched-identifier report (default: next to the output)
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Column heading of the code column in spreadsheets
        #[arg(long, default_value = DEFAULT_CODE_HEADING)]
        column: String,
    },

    /// Keep only the sections whose code appears in a code list.
    Filter {
        /// Source .docx document
        input: PathBuf,

        /// Code list: spreadsheet, JSON catalog or text file
        #[arg(short, long)]
        codes: PathBuf,

        /// Output .docx document
        #[arg(short, long)]
        output: PathBuf,

        /// Column heading of the code column in spreadsheets
        #[arg(long, default_value = DEFAULT_CODE_HEADING)]
        column: String,
    },

    /// Print the identifiers read from a code list.
    Codes {
        /// Spreadsheet, JSON catalog or text file
        file: PathBuf,

        /// Column heading of the code column in spreadsheets
        #[arg(long, default_value = DEFAULT_CODE_HEADING)]
        column: String,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Split {
            input,
            output,
            chunks,
        } => split_command(&input, &output, chunks),
        Commands::Merge {
            sections,
            codes,
            output,
            base,
            report,
            column,
        } => merge_command(&sections, &codes, &output, base, report, &column),
        Commands::Filter {
            input,
            codes,
            output,
            column,
        } => filter_command(&input, &codes, &output, &column),
        Commands::Codes { file, column } => codes_command(&file, &column),
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Execute the split command.
fn split_command(input: &Path, output: &Path, chunks: usize) -> Result<()> {
    println!(
        "{} {} into {} chunk(s)",
        style("Splitting").bold(),
        style(input.display()).cyan(),
        style(chunks).green()
    );

    let config = SplitConfig::new(input, output).with_chunk_count(chunks);
    let pb = spinner("Splitting document...");
    let result = split(&config);
    pb.finish_and_clear();
    let result = result?;

    println!("  Chunks: {}", result.chunk_files.len());
    println!("  Sections: {}", result.section_files.len());
    println!();
    println!(
        "{} {}",
        style("Sections in:").green().bold(),
        result.sections_dir.display()
    );
    Ok(())
}

/// Execute the merge command.
fn merge_command(
    sections: &Path,
    codes: &Path,
    output: &Path,
    base: Option<PathBuf>,
    report: Option<PathBuf>,
    column: &str,
) -> Result<()> {
    let identifiers = load_identifiers(codes, column)?;
    println!(
        "{} {} identifier(s) from {}",
        style("Merging").bold(),
        style(identifiers.len()).cyan(),
        style(sections.display()).cyan()
    );

    let mut config = MergeConfig::new(sections, output);
    if let Some(base) = base {
        config = config.with_base_template(base);
    }
    if let Some(report) = report {
        config = config.with_report_path(report);
    }

    let pb = spinner("Composing sections...");
    let result = merge_in_order(&config, &identifiers);
    pb.finish_and_clear();
    let report = result?;

    if !report.skipped.is_empty() {
        println!("  Not found: {}", style(report.skipped.len()).yellow().bold());
    }
    println!();
    println!("{}", style(report.summary()).green());
    Ok(())
}

/// Execute the filter command.
fn filter_command(input: &Path, codes: &Path, output: &Path, column: &str) -> Result<()> {
    let identifiers = load_identifiers(codes, column)?;
    let allowed = allowed_keys(&identifiers);

    let pb = spinner("Filtering sections...");
    let result = filter_sections(input, &allowed, output, &Default::default());
    pb.finish_and_clear();
    let report = result?;

    println!("  Kept: {}", style(report.kept.len()).green());
    println!("  Removed: {}", style(report.removed.len()).yellow());
    println!();
    println!("{} {}", style("Saved to:").green().bold(), output.display());
    Ok(())
}

/// Execute the codes command.
fn codes_command(file: &Path, column: &str) -> Result<()> {
    for identifier in load_identifiers(file, column)? {
        println!("{identifier}");
    }
    Ok(())
}
