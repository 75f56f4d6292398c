//! Data model for the two artifacts produced by pdfref.
//!
//! [`ContentArtifact`] is the page-by-page text of a source document together
//! with its aggregate statistics. [`ReferenceArtifact`] is the identifier
//! index built from that text.

mod document;
mod page;
mod reference;

pub use document::{ContentArtifact, ContentReport, DocumentInfo, DocumentStats, PagePreview};
pub use page::{PageRecord, RawPage};
pub use reference::{
    ExtractionInfo, IndexSummary, ReferenceArtifact, ReferenceBlock, ReferenceIndex,
};
