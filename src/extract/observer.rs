//! Observer hooks for extraction progress and recoverable failures.
//!
//! Extraction never touches a global logger directly. Callers hand an
//! observer to the [`PageExtractor`](super::PageExtractor); the default
//! [`LogObserver`] forwards everything to the `log` facade.
//!
//! # Example
//!
//! ```
//! use pdfref::extract::ExtractionObserver;
//! use pdfref::Error;
//!
//! #[derive(Default)]
//! struct FailureCounter {
//!     failed: Vec<u32>,
//! }
//!
//! impl ExtractionObserver for FailureCounter {
//!     fn on_page_failed(&mut self, page_number: u32, _error: &Error) {
//!         self.failed.push(page_number);
//!     }
//! }
//! ```

use crate::error::Error;
use crate::render::WriteSummary;

/// Receives extraction events.
///
/// All methods do nothing by default.
pub trait ExtractionObserver {
    /// Called once the source is open and its page count is known.
    fn on_start(&mut self, total_pages: u32) {
        let _ = total_pages;
    }

    /// Called at every progress interval, before the page is read.
    fn on_progress(&mut self, page_number: u32, total_pages: u32) {
        let _ = (page_number, total_pages);
    }

    /// Called after each page, whether or not it extracted cleanly.
    fn on_page(&mut self, page_number: u32) {
        let _ = page_number;
    }

    /// Called when a page failed and empty text was substituted.
    fn on_page_failed(&mut self, page_number: u32, error: &Error) {
        let _ = (page_number, error);
    }

    /// Called after the source released its intermediate buffers.
    fn on_buffers_released(&mut self, page_number: u32) {
        let _ = page_number;
    }

    /// Called once the content artifact has been written.
    fn on_finish(&mut self, summary: &WriteSummary) {
        let _ = summary;
    }
}

impl<T: ExtractionObserver + ?Sized> ExtractionObserver for &mut T {
    fn on_start(&mut self, total_pages: u32) {
        (**self).on_start(total_pages)
    }

    fn on_progress(&mut self, page_number: u32, total_pages: u32) {
        (**self).on_progress(page_number, total_pages)
    }

    fn on_page(&mut self, page_number: u32) {
        (**self).on_page(page_number)
    }

    fn on_page_failed(&mut self, page_number: u32, error: &Error) {
        (**self).on_page_failed(page_number, error)
    }

    fn on_buffers_released(&mut self, page_number: u32) {
        (**self).on_buffers_released(page_number)
    }

    fn on_finish(&mut self, summary: &WriteSummary) {
        (**self).on_finish(summary)
    }
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl ExtractionObserver for NullObserver {}

/// Observer that forwards events to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl ExtractionObserver for LogObserver {
    fn on_start(&mut self, total_pages: u32) {
        log::info!("Total pages in source: {}", total_pages);
    }

    fn on_progress(&mut self, page_number: u32, total_pages: u32) {
        log::info!("Processing page {}/{}", page_number, total_pages);
    }

    fn on_page_failed(&mut self, page_number: u32, error: &Error) {
        log::warn!("Error extracting page {}: {}", page_number, error);
    }

    fn on_buffers_released(&mut self, page_number: u32) {
        log::debug!("Released page buffers after page {}", page_number);
    }

    fn on_finish(&mut self, summary: &WriteSummary) {
        let stats = &summary.stats;
        log::info!(
            "Summary: {}/{} pages with content, {} total words, {} total characters",
            stats.pages_with_content,
            stats.total_pages,
            stats.total_words,
            stats.total_characters
        );
        if let Some(ref warning) = summary.patch_warning {
            log::warn!("Document info left unpatched: {}", warning);
        }
    }
}
