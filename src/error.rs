//! Error types for pdfref library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pdfref operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while extracting pages or building the index.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// The source container could not be opened or parsed at all.
    #[error("Cannot open source {}: {reason}", path.display())]
    SourceOpen {
        /// Path of the source document
        path: PathBuf,
        /// Underlying cause
        reason: String,
    },

    /// Text could not be extracted from a single page.
    #[error("Text extraction failed on page {page}: {reason}")]
    PageExtract {
        /// 1-indexed page number
        page: u32,
        /// Underlying cause
        reason: String,
    },

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// The page failure policy escalated per-page failures to an abort.
    #[error("Too many page extraction failures: {failed} failed, limit is {limit}")]
    TooManyPageFailures {
        /// Pages that failed so far
        failed: u32,
        /// Highest tolerated number of failures
        limit: u32,
    },

    /// The aggregate header of the content artifact could not be backfilled.
    #[error("Could not update document info: {0}")]
    AggregatePatch(String),

    /// A pattern family failed to compile.
    #[error("Invalid pattern for family '{family}': {source}")]
    InvalidPattern {
        /// Family name
        family: String,
        /// Regex compile error
        #[source]
        source: regex::Error,
    },

    /// A content artifact read back from disk is malformed.
    #[error("Invalid content artifact: {0}")]
    InvalidArtifact(String),
}

impl Error {
    /// Whether the pipeline recovers from this error locally instead of aborting.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::PageExtract { .. } | Error::AggregatePatch(_))
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::SourceOpen {
            path: PathBuf::new(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PageExtract {
            page: 7,
            reason: "bad font".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Text extraction failed on page 7: bad font"
        );

        let err = Error::PageOutOfRange(10, 5);
        assert_eq!(
            err.to_string(),
            "Page 10 is out of range (document has 5 pages)"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(Error::AggregatePatch("seek".to_string()).is_recoverable());
        assert!(Error::PageExtract {
            page: 1,
            reason: String::new()
        }
        .is_recoverable());
        assert!(!Error::UnknownFormat.is_recoverable());
        assert!(!Error::TooManyPageFailures { failed: 3, limit: 2 }.is_recoverable());
    }

    #[test]
    fn test_invalid_pattern_display() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = Error::InvalidPattern {
            family: "Broken".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("Invalid pattern for family 'Broken'"));
    }
}
