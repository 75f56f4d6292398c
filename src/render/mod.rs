//! Artifact writers.
//!
//! The content artifact is streamed page by page through
//! [`StreamingDocumentWriter`]; the reference artifact is small enough to be
//! serialized in one go with [`save_json`].

mod json;
pub mod streaming;

pub use json::{save_json, to_json, write_json, JsonFormat};
pub use streaming::{
    create_artifact_file, ArtifactHeader, StreamingDocumentWriter, WriteSummary, PLACEHOLDER,
    SLOT_WIDTH,
};
