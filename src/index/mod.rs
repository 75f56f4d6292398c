//! Reference indexing.
//!
//! Page text is cut into blocks by the [`TextSegmenter`], each block is
//! scanned by the [`ReferenceMatcher`], and blocks with at least one
//! identifier are collected by the [`ReferenceIndexer`]. [`IndexPipeline`]
//! wires the three together over a page stream.

mod indexer;
mod matcher;
mod options;
mod pipeline;
mod reorder;
mod segmenter;

pub use indexer::ReferenceIndexer;
pub use matcher::{PatternFamily, PatternSet, ReferenceMatcher};
pub use options::IndexOptions;
pub use pipeline::{IndexPipeline, PageAnalysis};
pub use reorder::ReorderBuffer;
pub use segmenter::{TextSegmenter, DEFAULT_MIN_BLOCK_LEN};
