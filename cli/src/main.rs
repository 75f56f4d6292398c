//! pdfref CLI - PDF page extraction and reference indexing tool

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfref::{
    build_index, extract_to_file_with_observer, ContentArtifact, Error, ExtractOptions,
    ExtractionObserver, IndexOptions, JsonFormat, PageFailurePolicy, ReferenceArtifact,
    WriteSummary,
};

const DEFAULT_CONTENT: &str = "pdf_content.json";
const DEFAULT_REFERENCES: &str = "car_references.json";

#[derive(Parser)]
#[command(name = "pdfref")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Extract PDF pages to JSON and index reference identifiers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every page of a PDF into a content JSON file
    Extract {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file
        #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONTENT)]
        output: PathBuf,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Build the reference index from a content JSON file
    Index {
        /// Content JSON produced by `extract`
        #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONTENT)]
        input: PathBuf,

        /// Output file
        #[arg(short, long, value_name = "FILE", default_value = DEFAULT_REFERENCES)]
        output: PathBuf,

        #[command(flatten)]
        index: IndexArgs,
    },

    /// Extract a PDF and index it in one go
    Run {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Content JSON output
        #[arg(long, value_name = "FILE", default_value = DEFAULT_CONTENT)]
        content: PathBuf,

        /// Reference index output
        #[arg(short, long, value_name = "FILE", default_value = DEFAULT_REFERENCES)]
        output: PathBuf,

        #[command(flatten)]
        extract: ExtractArgs,

        #[command(flatten)]
        index: IndexArgs,
    },

    /// Show statistics and page previews of a content JSON file
    Inspect {
        /// Content JSON produced by `extract`
        #[arg(value_name = "FILE", default_value = DEFAULT_CONTENT)]
        input: PathBuf,

        /// Number of pages to preview
        #[arg(long, default_value = "3")]
        sample: usize,
    },

    /// Look up one reference in an index file
    Lookup {
        /// Reference identifier (case-insensitive)
        #[arg(value_name = "REFERENCE")]
        reference: String,

        /// Reference index produced by `index`
        #[arg(short, long, value_name = "FILE", default_value = DEFAULT_REFERENCES)]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
struct ExtractArgs {
    /// Abort once more than this many pages fail to extract
    #[arg(long, value_name = "N", conflicts_with = "max_failure_ratio")]
    max_failures: Option<u32>,

    /// Abort once failed pages exceed this fraction of the document (0.0-1.0)
    #[arg(long, value_name = "RATIO", value_parser = parse_ratio)]
    max_failure_ratio: Option<f64>,

    /// Release page buffers every N pages (0 = never)
    #[arg(long, value_name = "N", default_value = "50")]
    release_interval: u32,
}

impl ExtractArgs {
    fn options(&self) -> ExtractOptions {
        let policy = match (self.max_failures, self.max_failure_ratio) {
            (Some(count), _) => PageFailurePolicy::AbortAfter(count),
            (None, Some(ratio)) => PageFailurePolicy::AbortAboveRatio(ratio),
            (None, None) => PageFailurePolicy::Continue,
        };
        ExtractOptions::new()
            .with_failure_policy(policy)
            .with_release_interval(self.release_interval)
    }
}

fn parse_ratio(value: &str) -> Result<f64, String> {
    let ratio: f64 = value.parse().map_err(|e| format!("{}", e))?;
    if (0.0..=1.0).contains(&ratio) {
        Ok(ratio)
    } else {
        Err(format!("{} is not between 0.0 and 1.0", value))
    }
}

#[derive(Args)]
struct IndexArgs {
    /// Additional pattern families (JSON file)
    #[arg(long, value_name = "FILE")]
    patterns: Option<PathBuf>,

    /// Do not use the built-in pattern families
    #[arg(long, requires = "patterns")]
    no_default_patterns: bool,

    /// Minimum block length in characters
    #[arg(long, value_name = "N", default_value = "50")]
    min_block_len: usize,

    /// Skip Unicode normalization before segmenting
    #[arg(long)]
    no_normalize: bool,

    /// Analyze pages in parallel
    #[arg(long)]
    parallel: bool,

    /// Pages per parallel batch
    #[arg(long, value_name = "N", default_value = "64")]
    batch_size: usize,
}

impl IndexArgs {
    fn options(&self) -> pdfref::Result<IndexOptions> {
        let mut options = IndexOptions::new()
            .with_min_block_len(self.min_block_len)
            .with_unicode_normalization(!self.no_normalize)
            .with_batch_size(self.batch_size);

        if self.no_default_patterns {
            options = options.with_families(Vec::new());
        }
        if let Some(ref path) = self.patterns {
            options = options.with_patterns_file(path)?;
        }
        if self.parallel {
            options = options.with_parallel();
        }
        Ok(options)
    }
}

/// Drives a progress bar from extraction events.
struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} pages {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        Self { bar }
    }
}

impl ExtractionObserver for ProgressObserver {
    fn on_start(&mut self, total_pages: u32) {
        self.bar.set_length(total_pages as u64);
        log::info!("Total pages in source: {}", total_pages);
    }

    fn on_page(&mut self, page_number: u32) {
        self.bar.set_position(page_number as u64);
    }

    fn on_page_failed(&mut self, page_number: u32, error: &Error) {
        self.bar.println(format!(
            "{} page {}: {}",
            "Warning".yellow().bold(),
            page_number,
            error
        ));
        log::warn!("Error extracting page {}: {}", page_number, error);
    }

    fn on_buffers_released(&mut self, page_number: u32) {
        log::debug!("Released page buffers after page {}", page_number);
    }

    fn on_finish(&mut self, summary: &WriteSummary) {
        self.bar.finish_with_message("done");
        if let Some(ref warning) = summary.patch_warning {
            log::warn!("Document info left unpatched: {}", warning);
        }
    }
}

impl Drop for ProgressObserver {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.abandon();
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Extract {
            input,
            output,
            extract,
        }) => cmd_extract(&input, &output, &extract.options()),
        Some(Commands::Index {
            input,
            output,
            index,
        }) => cmd_index(&input, &output, &index),
        Some(Commands::Run {
            input,
            content,
            output,
            extract,
            index,
        }) => cmd_run(&input, &content, &output, &extract, &index),
        Some(Commands::Inspect { input, sample }) => cmd_inspect(&input, sample),
        Some(Commands::Lookup { reference, input }) => cmd_lookup(&input, &reference),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            println!("{}", "Usage: pdfref <COMMAND>".yellow());
            println!("       pdfref --help for more information");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_extract(
    input: &Path,
    output: &Path,
    options: &ExtractOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{} {}", "Extracting".cyan(), input.display());

    let summary = extract_to_file_with_observer(input, output, options, ProgressObserver::new())?;
    let stats = &summary.stats;

    println!("\n{}", "Extraction Summary".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Pages".bold(), stats.total_pages);
    println!("{}: {}", "Pages with content".bold(), stats.pages_with_content);
    println!("{}: {}", "Words".bold(), stats.total_words);
    println!("{}: {}", "Characters".bold(), stats.total_characters);
    if !summary.aggregates_patched {
        println!(
            "{} document totals could not be written to the header",
            "Warning:".yellow().bold()
        );
    }
    println!("{} {}", "Saved to".green(), output.display());
    Ok(())
}

fn cmd_index(input: &Path, output: &Path, args: &IndexArgs) -> Result<(), Box<dyn std::error::Error>> {
    let options = args.options()?;
    index_content(input, output, &options)
}

fn cmd_run(
    input: &Path,
    content: &Path,
    output: &Path,
    extract: &ExtractArgs,
    index: &IndexArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    // Bad pattern files fail before the PDF is touched.
    let options = index.options()?;
    cmd_extract(input, content, &extract.options())?;
    println!();
    index_content(content, output, &options)
}

fn index_content(
    input: &Path,
    output: &Path,
    options: &IndexOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("Indexing {}...", input.display()));
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let artifact = build_index(input, options);
    spinner.finish_and_clear();
    let artifact = artifact?;

    pdfref::render::save_json(output, &artifact, JsonFormat::Pretty)?;

    let info = &artifact.extraction_info;
    println!("{}", "Reference Index".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Reference blocks".bold(), info.total_reference_blocks);
    println!("{}: {}", "Unique references".bold(), info.unique_references);

    print_top_references(&artifact, 10);
    println!("{} {}", "Saved to".green(), output.display());
    Ok(())
}

fn print_top_references(artifact: &ReferenceArtifact, limit: usize) {
    let top = artifact.top_references(limit);
    if top.is_empty() {
        return;
    }

    println!();
    for (reference, count) in &top {
        println!("  {} {} ({} blocks)", "•".dimmed(), reference, count);
    }
    let rest = artifact.reference_index.len().saturating_sub(top.len());
    if rest > 0 {
        println!("  ... and {} more", rest);
    }
    println!();
}

fn cmd_inspect(input: &Path, sample: usize) -> Result<(), Box<dyn std::error::Error>> {
    let artifact = ContentArtifact::load(input)?;
    let info = &artifact.document_info;
    let report = artifact.report(sample);

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Source".bold(), info.source_file);
    println!("{}: {}", "Extracted".bold(), info.extraction_timestamp);
    if info.aggregates_known() {
        println!("{}: {}", "Pages".bold(), info.total_pages);
        println!("{}: {}", "Pages with content".bold(), info.pages_with_content);
        println!("{}: {}", "Words".bold(), info.total_words);
        println!("{}: {}", "Characters".bold(), info.total_characters);
    } else {
        println!(
            "{} document totals missing, recomputed from pages",
            "Warning:".yellow().bold()
        );
        println!("{}: {}", "Pages".bold(), report.stats.total_pages);
        println!("{}: {}", "Pages with content".bold(), report.stats.pages_with_content);
        println!("{}: {}", "Words".bold(), report.stats.total_words);
        println!("{}: {}", "Characters".bold(), report.stats.total_characters);
    }

    if !report.previews.is_empty() {
        println!();
        println!("{}", "Sample Pages".cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
        for preview in &report.previews {
            println!(
                "{} {} ({} words)",
                "Page".bold(),
                preview.page_number,
                preview.word_count
            );
            println!("  {}", preview.text.dimmed());
        }
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {:.1}", "Average words per page".bold(), report.average_words);
    if let Some((page, words)) = report.most_words {
        println!("{}: page {} ({} words)", "Most words".bold(), page, words);
    }
    if let Some((page, words)) = report.fewest_words {
        println!("{}: page {} ({} words)", "Fewest words".bold(), page, words);
    }
    Ok(())
}

fn cmd_lookup(input: &Path, reference: &str) -> Result<(), Box<dyn std::error::Error>> {
    let artifact = ReferenceArtifact::load(input)?;
    let blocks = artifact.blocks_for(reference);

    if blocks.is_empty() {
        println!("{} {}", "No blocks mention".yellow(), reference.trim().to_uppercase());
        return Ok(());
    }

    println!(
        "{} ({} blocks)",
        reference.trim().to_uppercase().cyan().bold(),
        blocks.len()
    );
    println!("{}", "─".repeat(40).dimmed());
    for block in blocks {
        println!("{} {}", format!("[{}]", block.block_id).bold(), block.text_block);
    }
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdfref".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF page extraction and reference indexing tool");
    println!();
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Commands {
        Cli::try_parse_from(args).unwrap().command.unwrap()
    }

    #[test]
    fn test_extract_failure_policy_flags() {
        match parse(&["pdfref", "extract", "in.pdf", "--max-failures", "3"]) {
            Commands::Extract { output, extract, .. } => {
                assert_eq!(output, PathBuf::from(DEFAULT_CONTENT));
                assert_eq!(
                    extract.options().failure_policy,
                    PageFailurePolicy::AbortAfter(3)
                );
            }
            _ => panic!("expected extract"),
        }

        assert!(Cli::try_parse_from([
            "pdfref",
            "extract",
            "in.pdf",
            "--max-failures",
            "3",
            "--max-failure-ratio",
            "0.1",
        ])
        .is_err());
    }

    #[test]
    fn test_failure_ratio_must_be_a_fraction() {
        match parse(&["pdfref", "run", "in.pdf", "--max-failure-ratio", "0.25"]) {
            Commands::Run { extract, .. } => assert_eq!(
                extract.options().failure_policy,
                PageFailurePolicy::AbortAboveRatio(0.25)
            ),
            _ => panic!("expected run"),
        }

        for bad in ["NaN", "inf", "-0.5", "1.5", "half"] {
            assert!(
                Cli::try_parse_from(["pdfref", "extract", "in.pdf", "--max-failure-ratio", bad])
                    .is_err(),
                "accepted {}",
                bad
            );
        }
    }

    #[test]
    fn test_index_patterns_replace_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let patterns = dir.path().join("patterns.json");
        std::fs::write(
            &patterns,
            r#"{"families":[{"name":"Exhibit","pattern":"\\bEXH-\\d+\\b"}]}"#,
        )
        .unwrap();
        let patterns = patterns.to_string_lossy().to_string();

        match parse(&[
            "pdfref",
            "index",
            "--patterns",
            &patterns,
            "--no-default-patterns",
            "--parallel",
        ]) {
            Commands::Index { index, .. } => {
                let options = index.options().unwrap();
                assert_eq!(options.families.len(), 1);
                assert_eq!(options.families[0].name, "Exhibit");
                assert!(options.parallel);
            }
            _ => panic!("expected index"),
        }
    }

    #[test]
    fn test_no_default_patterns_requires_file() {
        assert!(Cli::try_parse_from(["pdfref", "index", "--no-default-patterns"]).is_err());
    }
}
