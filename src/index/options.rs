//! Indexing options and configuration.

use std::path::Path;

use super::matcher::{PatternFamily, PatternSet};
use super::segmenter::DEFAULT_MIN_BLOCK_LEN;
use crate::error::Result;

/// Options for building a reference index.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Minimum block length in characters
    pub min_block_len: usize,

    /// Apply NFC normalization before segmenting
    pub normalize_unicode: bool,

    /// Identifier families to look for
    pub families: Vec<PatternFamily>,

    /// Analyze pages on the rayon thread pool
    pub parallel: bool,

    /// Pages per parallel batch
    pub batch_size: usize,
}

impl IndexOptions {
    /// Create new index options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum block length.
    pub fn with_min_block_len(mut self, chars: usize) -> Self {
        self.min_block_len = chars;
        self
    }

    /// Replace the pattern families.
    pub fn with_families(mut self, families: Vec<PatternFamily>) -> Self {
        self.families = families;
        self
    }

    /// Add one pattern family.
    pub fn add_family(mut self, family: PatternFamily) -> Self {
        self.families.push(family);
        self
    }

    /// Add the families from a patterns file.
    pub fn with_patterns_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let set = PatternSet::load(path)?;
        self.families.extend(set.families);
        Ok(self)
    }

    /// Enable or disable Unicode normalization.
    pub fn with_unicode_normalization(mut self, enabled: bool) -> Self {
        self.normalize_unicode = enabled;
        self
    }

    /// Enable parallel page analysis.
    pub fn with_parallel(mut self) -> Self {
        self.parallel = true;
        self
    }

    /// Use sequential page analysis.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set the parallel batch size (at least 1).
    pub fn with_batch_size(mut self, pages: usize) -> Self {
        self.batch_size = pages.max(1);
        self
    }
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            min_block_len: DEFAULT_MIN_BLOCK_LEN,
            normalize_unicode: true,
            families: PatternFamily::defaults(),
            parallel: false,
            batch_size: 64,
        }
    }
}
