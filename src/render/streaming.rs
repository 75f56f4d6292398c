//! Streaming writer for the content artifact.
//!
//! Pages are written one at a time as they come out of the extractor, so the
//! whole document never has to sit in memory. The header needs aggregate
//! statistics that are only known once the last page is through; the writer
//! reserves fixed-width placeholder slots for them, remembers their byte
//! offsets, and backfills exactly those bytes after the trailer is written.
//! Each slot is read back before it is overwritten; if any of them no longer
//! holds the placeholder the backfill is skipped altogether.
//!
//! The output is not written atomically: a run that dies between header and
//! trailer leaves a truncated file that does not parse.
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//! use pdfref::model::{ContentArtifact, PageRecord};
//! use pdfref::render::{ArtifactHeader, StreamingDocumentWriter};
//!
//! fn main() -> pdfref::Result<()> {
//!     let header = ArtifactHeader::new("input.pdf", "2024-01-15T10:30:45Z");
//!     let mut writer = StreamingDocumentWriter::new(Cursor::new(Vec::new()));
//!
//!     writer.begin(&header)?;
//!     writer.write_page(&PageRecord::new(1, "Hello world"))?;
//!     let summary = writer.finish()?;
//!     assert!(summary.aggregates_patched);
//!
//!     let bytes = writer.into_inner().into_inner();
//!     let artifact: ContentArtifact = serde_json::from_slice(&bytes)?;
//!     assert_eq!(artifact.document_info.total_words, 2);
//!     Ok(())
//! }
//! ```

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{DocumentStats, PageRecord, RawPage};

/// Width in bytes of every aggregate slot in the header.
///
/// Wide enough for any `u64` in decimal.
pub const SLOT_WIDTH: usize = 20;

/// Token written into the aggregate slots until they are backfilled.
///
/// No count is ever negative, so a header still holding it is recognisable.
pub const PLACEHOLDER: &str = "-1";

/// Names of the aggregate slots, in header order.
const SLOT_NAMES: [&str; 4] = [
    "total_pages",
    "pages_with_content",
    "total_words",
    "total_characters",
];

/// Fixed part of the content artifact header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactHeader {
    /// Source document name
    pub source_file: String,

    /// Extraction timestamp (RFC 3339)
    pub extraction_timestamp: String,
}

impl ArtifactHeader {
    /// Create a header.
    pub fn new(source_file: impl Into<String>, extraction_timestamp: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            extraction_timestamp: extraction_timestamp.into(),
        }
    }
}

/// Outcome of writing a content artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSummary {
    /// Aggregates computed while streaming
    pub stats: DocumentStats,

    /// Whether the header slots were backfilled
    pub aggregates_patched: bool,

    /// Why the backfill failed, if it did
    pub patch_warning: Option<String>,
}

/// Internal state for the streaming writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    /// Nothing written yet
    Initial,
    /// Header written, accepting pages
    Pages { first: bool },
    /// Trailer written
    Finished,
}

/// Writes the content artifact incrementally.
///
/// The stream must be positioned where the artifact starts; everything is
/// written from there on and the slots are patched at absolute offsets.
/// The stream has to be readable so the slots can be checked before patching.
pub struct StreamingDocumentWriter<W: Read + Write + Seek> {
    out: W,
    position: u64,
    state: WriterState,
    slots: [u64; 4],
    stats: DocumentStats,
}

impl<W: Read + Write + Seek> StreamingDocumentWriter<W> {
    /// Create a writer over `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            position: 0,
            state: WriterState::Initial,
            slots: [0; 4],
            stats: DocumentStats::new(),
        }
    }

    /// Statistics over the pages written so far.
    pub fn stats(&self) -> &DocumentStats {
        &self.stats
    }

    /// Consume the writer and return the underlying stream.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Write the header with placeholder aggregates and open the page array.
    pub fn begin(&mut self, header: &ArtifactHeader) -> Result<()> {
        if self.state != WriterState::Initial {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "content artifact header already written",
            )));
        }

        self.position = self.out.stream_position()?;

        self.emit(b"{\n  \"document_info\": {\n")?;
        self.emit_field("source_file", &serde_json::to_string(&header.source_file)?)?;
        self.emit(b",\n")?;
        self.emit_field(
            "extraction_timestamp",
            &serde_json::to_string(&header.extraction_timestamp)?,
        )?;

        let placeholder = pad_slot(PLACEHOLDER);
        for (i, name) in SLOT_NAMES.iter().enumerate() {
            self.emit(b",\n")?;
            self.emit(format!("    \"{}\": ", name).as_bytes())?;
            self.slots[i] = self.position;
            self.emit(placeholder.as_bytes())?;
        }

        self.emit(b"\n  },\n  \"pages\": [\n")?;
        self.state = WriterState::Pages { first: true };
        Ok(())
    }

    /// Append one page record.
    pub fn write_page(&mut self, page: &PageRecord) -> Result<()> {
        let first = match self.state {
            WriterState::Pages { first } => first,
            _ => {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "page written outside the page array",
                )))
            }
        };

        if !first {
            self.emit(b",\n")?;
        }
        let json = serde_json::to_vec(page)?;
        self.emit(&json)?;

        self.stats.record(page);
        self.state = WriterState::Pages { first: false };
        Ok(())
    }

    /// Close the page array and backfill the header aggregates.
    ///
    /// A failing backfill is not an error: the artifact is already complete
    /// and valid, so the failure is logged and reported in the summary.
    pub fn finish(&mut self) -> Result<WriteSummary> {
        if !matches!(self.state, WriterState::Pages { .. }) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "content artifact finished before header was written",
            )));
        }

        self.emit(b"\n  ]\n}\n")?;
        self.out.flush()?;
        self.state = WriterState::Finished;

        let (aggregates_patched, patch_warning) = match self.patch_aggregates() {
            Ok(()) => (true, None),
            Err(e) => {
                log::warn!("Could not update document info: {}", e);
                (false, Some(e.to_string()))
            }
        };

        Ok(WriteSummary {
            stats: self.stats,
            aggregates_patched,
            patch_warning,
        })
    }

    /// Stream a whole page sequence: header, every page, trailer, backfill.
    ///
    /// An `Err` item aborts the run and leaves the artifact unterminated.
    pub fn write_document<I>(&mut self, header: &ArtifactHeader, pages: I) -> Result<WriteSummary>
    where
        I: IntoIterator<Item = Result<RawPage>>,
    {
        self.begin(header)?;
        for page in pages {
            let record = PageRecord::from(page?);
            self.write_page(&record)?;
        }
        self.finish()
    }

    fn patch_aggregates(&mut self) -> Result<()> {
        let values = [
            self.stats.total_pages,
            self.stats.pages_with_content,
            self.stats.total_words,
            self.stats.total_characters,
        ];

        if let Err(e) = self.verify_slots() {
            // Leave the stream at the end of the artifact either way.
            let _ = self.out.seek(SeekFrom::Start(self.position));
            return Err(e);
        }

        let patched = (|| -> std::io::Result<()> {
            for (offset, value) in self.slots.iter().zip(values) {
                self.out.seek(SeekFrom::Start(*offset))?;
                self.out.write_all(pad_slot(&value.to_string()).as_bytes())?;
            }
            self.out.seek(SeekFrom::Start(self.position))?;
            self.out.flush()
        })();

        patched.map_err(|e| Error::AggregatePatch(e.to_string()))
    }

    /// Check that every slot still holds the placeholder.
    fn verify_slots(&mut self) -> Result<()> {
        let placeholder = pad_slot(PLACEHOLDER);
        let mut current = [0u8; SLOT_WIDTH];

        for (name, offset) in SLOT_NAMES.iter().zip(self.slots) {
            self.out
                .seek(SeekFrom::Start(offset))
                .and_then(|_| self.out.read_exact(&mut current))
                .map_err(|e| Error::AggregatePatch(e.to_string()))?;
            if &current[..] != placeholder.as_bytes() {
                return Err(Error::AggregatePatch(format!(
                    "slot '{}' at byte {} no longer holds the placeholder",
                    name, offset
                )));
            }
        }
        Ok(())
    }

    fn emit_field(&mut self, name: &str, json_value: &str) -> Result<()> {
        self.emit(format!("    \"{}\": {}", name, json_value).as_bytes())
    }

    fn emit(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }
}

/// Create (or truncate) a content artifact file opened for reading and writing.
pub fn create_artifact_file<P: AsRef<Path>>(path: P) -> Result<File> {
    let file = File::options()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    Ok(file)
}

/// Left-align a slot value and pad it with spaces to [`SLOT_WIDTH`].
fn pad_slot(value: &str) -> String {
    format!("{:<width$}", value, width = SLOT_WIDTH)
}
