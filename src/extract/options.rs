//! Extraction options and configuration.

use chrono::{DateTime, Utc};

/// Options for extracting pages from a source document.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Release intermediate buffers every this many pages (0 = never)
    pub release_interval: u32,

    /// Report progress every this many pages (0 = never)
    pub progress_interval: u32,

    /// What to do when pages fail to extract
    pub failure_policy: PageFailurePolicy,

    /// Fixed extraction timestamp (defaults to the time the run starts)
    pub timestamp: Option<DateTime<Utc>>,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the buffer release interval.
    pub fn with_release_interval(mut self, pages: u32) -> Self {
        self.release_interval = pages;
        self
    }

    /// Set the progress reporting interval.
    pub fn with_progress_interval(mut self, pages: u32) -> Self {
        self.progress_interval = pages;
        self
    }

    /// Set the page failure policy.
    pub fn with_failure_policy(mut self, policy: PageFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Pin the extraction timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            release_interval: 50,
            progress_interval: 100,
            failure_policy: PageFailurePolicy::Continue,
            timestamp: None,
        }
    }
}

/// Whether per-page extraction failures may escalate to an abort.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PageFailurePolicy {
    /// Always substitute empty text and continue
    #[default]
    Continue,
    /// Abort once more than this many pages have failed
    AbortAfter(u32),
    /// Abort once failures exceed this fraction of the page count (NaN never aborts)
    AbortAboveRatio(f64),
}

impl PageFailurePolicy {
    /// Highest number of failures tolerated for a document of `total_pages`.
    ///
    /// `None` means failures never abort the run.
    pub fn limit(&self, total_pages: u32) -> Option<u32> {
        match *self {
            PageFailurePolicy::Continue => None,
            PageFailurePolicy::AbortAfter(limit) => Some(limit),
            PageFailurePolicy::AbortAboveRatio(ratio) if ratio.is_nan() => None,
            PageFailurePolicy::AbortAboveRatio(ratio) => {
                let ratio = ratio.clamp(0.0, 1.0);
                Some((ratio * total_pages as f64).floor() as u32)
            }
        }
    }
}
