//! # pdfref
//!
//! Page-by-page PDF text extraction and reference identifier indexing.
//!
//! The crate produces two JSON artifacts:
//!
//! 1. a **content artifact** holding the text of every page plus document
//!    totals, written in a single streaming pass so memory stays flat on
//!    documents with thousands of pages;
//! 2. a **reference artifact** mapping every identifier found in that text
//!    (case-record codes such as `CAR-OTP-0001-0023`, evidence numbers such
//!    as `P-100`) to the text blocks that mention it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfref::{build_index_to_file, extract_to_file, ExtractOptions, IndexOptions};
//!
//! fn main() -> pdfref::Result<()> {
//!     let written = extract_to_file("judgment.pdf", "content.json", &ExtractOptions::default())?;
//!     println!("{} pages", written.stats.total_pages);
//!
//!     let summary = build_index_to_file("content.json", "references.json", &IndexOptions::default())?;
//!     println!("{} unique references", summary.unique_references);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Failure isolation**: a page that cannot be decoded becomes an empty
//!   page instead of aborting the run
//! - **Streaming output**: aggregate totals are backfilled into the header
//!   once the last page is written
//! - **Pluggable patterns**: identifier families are plain regular
//!   expressions and can be loaded from a JSON file
//! - **Parallel indexing**: optional, with output identical to a sequential run

pub mod detect;
pub mod error;
pub mod extract;
pub mod index;
pub mod model;
pub mod render;

pub use detect::{is_pdf, sniff_bytes, sniff_path, PdfHeader};
pub use error::{Error, Result};
pub use extract::{
    ExtractOptions, ExtractionObserver, LogObserver, LopdfSource, MemorySource, NullObserver,
    PageExtractor, PageFailurePolicy, PageSource,
};
pub use index::{
    IndexOptions, IndexPipeline, PatternFamily, PatternSet, ReferenceIndexer, ReferenceMatcher,
    TextSegmenter,
};
pub use model::{
    ContentArtifact, DocumentInfo, DocumentStats, IndexSummary, PageRecord, RawPage,
    ReferenceArtifact, ReferenceBlock, ReferenceIndex,
};
pub use render::{ArtifactHeader, JsonFormat, StreamingDocumentWriter, WriteSummary};

use std::io::{Read, Seek, Write};
use std::path::Path;

use chrono::{SecondsFormat, Utc};

/// Extract a PDF into a content artifact on disk.
///
/// Progress and per-page failures are reported through the `log` facade.
///
/// # Example
///
/// ```no_run
/// use pdfref::{extract_to_file, ExtractOptions, PageFailurePolicy};
///
/// let options = ExtractOptions::new().with_failure_policy(PageFailurePolicy::AbortAfter(10));
/// let summary = extract_to_file("bundle.pdf", "content.json", &options).unwrap();
/// assert!(summary.aggregates_patched);
/// ```
pub fn extract_to_file<P, Q>(input: P, output: Q, options: &ExtractOptions) -> Result<WriteSummary>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    extract_to_file_with_observer(input, output, options, LogObserver)
}

/// Extract a PDF into a content artifact on disk, reporting to `observer`.
pub fn extract_to_file_with_observer<P, Q, O>(
    input: P,
    output: Q,
    options: &ExtractOptions,
    observer: O,
) -> Result<WriteSummary>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    O: ExtractionObserver,
{
    let source = LopdfSource::open(input)?;
    let out = render::create_artifact_file(output)?;
    extract_to_writer(source, out, options, observer)
}

/// Stream every page of `source` into `out` as a content artifact.
///
/// Per-page failures are absorbed according to the options' failure policy.
/// Any error returned here means the artifact in `out` is incomplete and must
/// not be used.
pub fn extract_to_writer<S, W, O>(
    source: S,
    out: W,
    options: &ExtractOptions,
    mut observer: O,
) -> Result<WriteSummary>
where
    S: PageSource,
    W: Read + Write + Seek,
    O: ExtractionObserver,
{
    let header = ArtifactHeader::new(source.name(), extraction_timestamp(options));
    let mut extractor = PageExtractor::with_observer(source, options.clone(), &mut observer);
    let mut writer = StreamingDocumentWriter::new(out);

    let summary = writer.write_document(&header, extractor.by_ref())?;

    let failed = extractor.failed_pages();
    let total = extractor.total_pages();
    drop(extractor);

    if failed > 0 {
        log::warn!(
            "{} of {} pages could not be extracted and were left empty",
            failed,
            total
        );
    }

    observer.on_finish(&summary);
    Ok(summary)
}

/// Build the reference artifact from a content artifact on disk.
pub fn build_index<P: AsRef<Path>>(content: P, options: &IndexOptions) -> Result<ReferenceArtifact> {
    let pipeline = IndexPipeline::new(options)?;
    let content_path = content.as_ref();
    let artifact = ContentArtifact::load(content_path)?;
    if !artifact.document_info.aggregates_known() {
        log::warn!(
            "{} has no document totals; extraction may not have finished cleanly",
            content_path.display()
        );
    }

    let timestamp = artifact.document_info.extraction_timestamp;
    let indexer = pipeline.run(artifact.pages.into_iter().map(|p| Ok(RawPage::from(p))))?;

    Ok(indexer.into_artifact(content_path.display().to_string(), timestamp))
}

/// Build the reference artifact from a content artifact and save it as JSON.
pub fn build_index_to_file<P, Q>(content: P, output: Q, options: &IndexOptions) -> Result<IndexSummary>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let artifact = build_index(content, options)?;
    render::save_json(output, &artifact, JsonFormat::Pretty)?;

    Ok(IndexSummary {
        total_blocks: artifact.extraction_info.total_reference_blocks,
        unique_references: artifact.extraction_info.unique_references,
        reference_list: artifact.extraction_info.reference_list,
    })
}

/// Index a paginated source directly, without a content artifact in between.
pub fn build_index_from_source<S, O>(
    source: S,
    extract_options: &ExtractOptions,
    index_options: &IndexOptions,
    observer: O,
) -> Result<ReferenceArtifact>
where
    S: PageSource,
    O: ExtractionObserver,
{
    let pipeline = IndexPipeline::new(index_options)?;
    let source_file = source.name();
    let timestamp = extraction_timestamp(extract_options);

    let extractor = PageExtractor::with_observer(source, extract_options.clone(), observer);
    let indexer = pipeline.run(extractor)?;

    Ok(indexer.into_artifact(source_file, timestamp))
}

fn extraction_timestamp(options: &ExtractOptions) -> String {
    options
        .timestamp
        .unwrap_or_else(Utc::now)
        .to_rfc3339_opts(SecondsFormat::Micros, true)
}
