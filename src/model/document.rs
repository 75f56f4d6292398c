//! Document-level types for the content artifact.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::PageRecord;
use crate::error::{Error, Result};

/// Aggregate statistics over all pages of a document.
///
/// Only known once the whole page stream has been consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    /// Number of pages seen
    pub total_pages: u64,

    /// Pages with `has_content = true`
    pub pages_with_content: u64,

    /// Sum of `word_count`
    pub total_words: u64,

    /// Sum of `content_length`
    pub total_characters: u64,
}

impl DocumentStats {
    /// Create empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one page into the running totals.
    pub fn record(&mut self, page: &PageRecord) {
        self.total_pages += 1;
        if page.has_content {
            self.pages_with_content += 1;
        }
        self.total_words += page.word_count as u64;
        self.total_characters += page.content_length as u64;
    }

    /// Compute statistics over a slice of pages.
    pub fn from_pages(pages: &[PageRecord]) -> Self {
        let mut stats = Self::new();
        for page in pages {
            stats.record(page);
        }
        stats
    }
}

/// Header of the content artifact.
///
/// Aggregates are signed: a negative value means the post-stream backfill
/// did not happen and the header still holds its placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// Path of the source document
    pub source_file: String,

    /// When extraction started (RFC 3339)
    pub extraction_timestamp: String,

    /// Number of pages
    pub total_pages: i64,

    /// Pages with any content
    pub pages_with_content: i64,

    /// Total word count
    pub total_words: i64,

    /// Total character count
    pub total_characters: i64,
}

impl DocumentInfo {
    /// Whether the aggregate fields carry real values.
    pub fn aggregates_known(&self) -> bool {
        self.total_pages >= 0
            && self.pages_with_content >= 0
            && self.total_words >= 0
            && self.total_characters >= 0
    }

    /// Aggregates as [`DocumentStats`], if they were backfilled.
    pub fn stats(&self) -> Option<DocumentStats> {
        if !self.aggregates_known() {
            return None;
        }
        Some(DocumentStats {
            total_pages: self.total_pages as u64,
            pages_with_content: self.pages_with_content as u64,
            total_words: self.total_words as u64,
            total_characters: self.total_characters as u64,
        })
    }
}

/// The content artifact: document info plus every page in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentArtifact {
    /// Document-level header
    pub document_info: DocumentInfo,

    /// Pages 1..N in order
    pub pages: Vec<PageRecord>,
}

impl ContentArtifact {
    /// Load a content artifact from disk and check its page numbering.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let artifact: Self = serde_json::from_reader(reader)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Check that pages are numbered exactly 1..N with no gaps.
    pub fn validate(&self) -> Result<()> {
        for (index, page) in self.pages.iter().enumerate() {
            let expected = index as u32 + 1;
            if page.page_number != expected {
                return Err(Error::InvalidArtifact(format!(
                    "expected page {} at position {}, found page {}",
                    expected, index, page.page_number
                )));
            }
        }
        Ok(())
    }

    /// Get the number of pages.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Get a page by number (1-indexed).
    pub fn get_page(&self, page_num: u32) -> Option<&PageRecord> {
        if page_num == 0 {
            return None;
        }
        self.pages.get((page_num - 1) as usize)
    }

    /// Summarize the artifact, previewing the first `sample_pages` pages.
    pub fn report(&self, sample_pages: usize) -> ContentReport {
        let stats = DocumentStats::from_pages(&self.pages);
        let average_words = if self.pages.is_empty() {
            0.0
        } else {
            stats.total_words as f64 / self.pages.len() as f64
        };

        let most_words = self
            .pages
            .iter()
            .rev()
            .max_by_key(|p| p.word_count)
            .map(|p| (p.page_number, p.word_count));
        let fewest_words = self
            .pages
            .iter()
            .min_by_key(|p| p.word_count)
            .map(|p| (p.page_number, p.word_count));

        let previews = self
            .pages
            .iter()
            .take(sample_pages)
            .map(PagePreview::from_page)
            .collect();

        ContentReport {
            stats,
            average_words,
            most_words,
            fewest_words,
            previews,
        }
    }
}

/// Summary of a content artifact, recomputed from its pages.
#[derive(Debug, Clone)]
pub struct ContentReport {
    /// Statistics recomputed from the page records
    pub stats: DocumentStats,

    /// Mean words per page
    pub average_words: f64,

    /// (page number, word count) of the wordiest page
    pub most_words: Option<(u32, usize)>,

    /// (page number, word count) of the sparsest page
    pub fewest_words: Option<(u32, usize)>,

    /// Previews of the leading pages
    pub previews: Vec<PagePreview>,
}

/// Short preview of one page.
#[derive(Debug, Clone)]
pub struct PagePreview {
    /// Page number (1-indexed)
    pub page_number: u32,

    /// Word count of the page
    pub word_count: usize,

    /// Content length of the page
    pub content_length: usize,

    /// Whether the page has any content
    pub has_content: bool,

    /// First characters of the page, line breaks flattened
    pub text: String,
}

/// Characters shown in a page preview.
const PREVIEW_CHARS: usize = 150;

impl PagePreview {
    fn from_page(page: &PageRecord) -> Self {
        Self {
            page_number: page.page_number,
            word_count: page.word_count,
            content_length: page.content_length,
            has_content: page.has_content,
            text: page
                .content
                .chars()
                .take(PREVIEW_CHARS)
                .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
                .collect(),
        }
    }
}
