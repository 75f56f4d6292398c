//! Page extraction.
//!
//! A [`PageSource`] gives access to the text of one page at a time. The
//! [`PageExtractor`] walks a source from page 1 to N, recovers from per-page
//! failures according to [`PageFailurePolicy`], and reports progress to an
//! [`ExtractionObserver`].

mod extractor;
mod observer;
mod options;
mod source;

pub use extractor::PageExtractor;
pub use observer::{ExtractionObserver, LogObserver, NullObserver};
pub use options::{ExtractOptions, PageFailurePolicy};
pub use source::{LopdfSource, MemorySource, PageSource};
