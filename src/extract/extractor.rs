//! Page-at-a-time extraction with per-page failure isolation.

use std::iter::FusedIterator;

use super::observer::{ExtractionObserver, LogObserver};
use super::options::ExtractOptions;
use super::source::PageSource;
use crate::error::{Error, Result};
use crate::model::RawPage;

/// Lazy, finite, non-restartable sequence of pages 1..N.
///
/// A page that fails to extract is reported to the observer and yields empty
/// text, so the sequence always has exactly N items. The only `Err` item is
/// [`Error::TooManyPageFailures`], emitted when the configured
/// [`PageFailurePolicy`](super::PageFailurePolicy) escalates; the sequence
/// ends right after it.
///
/// # Example
///
/// ```
/// use pdfref::extract::{ExtractOptions, MemorySource, PageExtractor};
///
/// let source = MemorySource::new("memory", ["first page", "second page"]).fail_page(2);
/// let pages: Vec<_> = PageExtractor::new(source, ExtractOptions::default())
///     .collect::<pdfref::Result<_>>()
///     .unwrap();
///
/// assert_eq!(pages.len(), 2);
/// assert_eq!(pages[1].text, "");
/// ```
pub struct PageExtractor<S: PageSource, O: ExtractionObserver = LogObserver> {
    source: S,
    observer: O,
    options: ExtractOptions,
    total_pages: u32,
    next_page: u32,
    failed_pages: u32,
    failure_limit: Option<u32>,
    halted: bool,
}

impl<S: PageSource> PageExtractor<S, LogObserver> {
    /// Create an extractor that reports through the `log` facade.
    pub fn new(source: S, options: ExtractOptions) -> Self {
        Self::with_observer(source, options, LogObserver)
    }
}

impl<S: PageSource, O: ExtractionObserver> PageExtractor<S, O> {
    /// Create an extractor with a custom observer.
    pub fn with_observer(source: S, options: ExtractOptions, mut observer: O) -> Self {
        let total_pages = source.page_count();
        observer.on_start(total_pages);
        let failure_limit = options.failure_policy.limit(total_pages);

        Self {
            source,
            observer,
            options,
            total_pages,
            next_page: 1,
            failed_pages: 0,
            failure_limit,
            halted: false,
        }
    }

    /// Total number of pages in the source.
    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Number of pages that failed so far.
    pub fn failed_pages(&self) -> u32 {
        self.failed_pages
    }

    /// Name of the underlying source.
    pub fn source_name(&self) -> String {
        self.source.name()
    }

    /// Borrow the underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Borrow the observer.
    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Consume the extractor and return the observer.
    pub fn into_observer(self) -> O {
        self.observer
    }

    fn remaining(&self) -> usize {
        if self.halted {
            0
        } else {
            (self.total_pages + 1).saturating_sub(self.next_page) as usize
        }
    }
}

impl<S: PageSource, O: ExtractionObserver> Iterator for PageExtractor<S, O> {
    type Item = Result<RawPage>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted || self.next_page > self.total_pages {
            return None;
        }

        let page_number = self.next_page;
        self.next_page += 1;

        let progress = self.options.progress_interval;
        if progress > 0 && (page_number - 1) % progress == 0 {
            self.observer.on_progress(page_number, self.total_pages);
        }

        let text = match self.source.page_text(page_number) {
            Ok(text) => text,
            Err(e) => {
                self.failed_pages += 1;
                self.observer.on_page_failed(page_number, &e);

                if let Some(limit) = self.failure_limit {
                    if self.failed_pages > limit {
                        self.halted = true;
                        return Some(Err(Error::TooManyPageFailures {
                            failed: self.failed_pages,
                            limit,
                        }));
                    }
                }
                String::new()
            }
        };

        self.observer.on_page(page_number);

        let release = self.options.release_interval;
        if release > 0 && page_number % release == 0 {
            self.source.release_buffers();
            self.observer.on_buffers_released(page_number);
        }

        Some(Ok(RawPage::new(page_number, text)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (0, Some(remaining))
    }
}

impl<S: PageSource, O: ExtractionObserver> FusedIterator for PageExtractor<S, O> {}
