//! Page-level types.

use serde::{Deserialize, Serialize};

/// Text pulled from one page, before any statistics are derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    /// Page number (1-indexed)
    pub page_number: u32,

    /// Extracted text, empty when extraction failed
    pub text: String,
}

impl RawPage {
    /// Create a raw page.
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
        }
    }
}

impl From<PageRecord> for RawPage {
    fn from(record: PageRecord) -> Self {
        Self {
            page_number: record.page_number,
            text: record.content,
        }
    }
}

/// A single page record of the content artifact.
///
/// Every field apart from `page_number` and `content` is derived from
/// `content` at construction and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Page number (1-indexed)
    pub page_number: u32,

    /// Raw page text
    pub content: String,

    /// Length of `content` in characters
    pub content_length: usize,

    /// Number of whitespace-separated words
    pub word_count: usize,

    /// `content` is blank after trimming
    pub is_empty: bool,

    /// `content` has at least one character
    pub has_content: bool,
}

impl PageRecord {
    /// Build a record and derive its statistics from the text.
    pub fn new(page_number: u32, content: impl Into<String>) -> Self {
        let content = content.into();
        let content_length = content.chars().count();
        let is_empty = content.trim().is_empty();
        let word_count = if is_empty {
            0
        } else {
            content.split_whitespace().count()
        };

        Self {
            page_number,
            content,
            content_length,
            word_count,
            is_empty,
            has_content: content_length > 0,
        }
    }

    /// Record for a page that yielded no text.
    pub fn blank(page_number: u32) -> Self {
        Self::new(page_number, String::new())
    }
}

impl From<RawPage> for PageRecord {
    fn from(raw: RawPage) -> Self {
        Self::new(raw.page_number, raw.text)
    }
}
