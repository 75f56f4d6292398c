//! Paginated sources.
//!
//! Provides a trait-based interface for reading one page of text at a time,
//! isolating the concrete PDF library (lopdf) from the extraction loop.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use lopdf::{Document as LopdfDocument, ObjectId};

use crate::detect;
use crate::error::{Error, Result};

/// Abstract interface for a paginated document.
pub trait PageSource {
    /// Total number of pages.
    fn page_count(&self) -> u32;

    /// Extract the raw text of a page (1-indexed).
    fn page_text(&mut self, page_number: u32) -> Result<String>;

    /// Drop caches that grow with the number of pages read.
    ///
    /// Called periodically by the extractor to bound peak memory.
    fn release_buffers(&mut self) {}

    /// Name of the source, used as `source_file` in artifacts.
    fn name(&self) -> String;
}

impl<S: PageSource + ?Sized> PageSource for Box<S> {
    fn page_count(&self) -> u32 {
        (**self).page_count()
    }

    fn page_text(&mut self, page_number: u32) -> Result<String> {
        (**self).page_text(page_number)
    }

    fn release_buffers(&mut self) {
        (**self).release_buffers()
    }

    fn name(&self) -> String {
        (**self).name()
    }
}

// ---------------------------------------------------------------------------
// LopdfSource: concrete implementation backed by lopdf
// ---------------------------------------------------------------------------

/// [`PageSource`] backed by `lopdf::Document`.
///
/// The file is read fully on open and the handle closed again before `open`
/// returns, so no OS handle outlives a failed or interrupted run. Dropping
/// the source frees the parsed document.
pub struct LopdfSource {
    path: PathBuf,
    doc: LopdfDocument,
    pages: BTreeMap<u32, ObjectId>,
}

impl LopdfSource {
    /// Open a PDF file.
    ///
    /// Any failure here is fatal: the header check, the read, or the parse.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let header = detect::sniff_path(path)?;
        let doc = LopdfDocument::load(path).map_err(|e| Error::SourceOpen {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if doc.is_encrypted() {
            log::warn!(
                "{} is encrypted, page text may come out empty",
                path.display()
            );
        }

        let pages = doc.get_pages();
        log::debug!("Opened {} ({}, {} pages)", path.display(), header, pages.len());

        Ok(Self {
            path: path.to_path_buf(),
            doc,
            pages,
        })
    }

    /// Load a PDF from an in-memory byte slice.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        detect::sniff_bytes(data)?;
        let doc = LopdfDocument::load_mem(data)?;
        let pages = doc.get_pages();
        Ok(Self {
            path: PathBuf::from("<memory>"),
            doc,
            pages,
        })
    }

    /// Path the source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }
}

impl PageSource for LopdfSource {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_text(&mut self, page_number: u32) -> Result<String> {
        if !self.pages.contains_key(&page_number) {
            return Err(Error::PageOutOfRange(page_number, self.page_count()));
        }

        // Malformed content streams can make the decoder panic; that is still
        // a failure of this page only.
        let doc = &self.doc;
        match panic::catch_unwind(AssertUnwindSafe(|| doc.extract_text(&[page_number]))) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(Error::PageExtract {
                page: page_number,
                reason: e.to_string(),
            }),
            Err(_) => Err(Error::PageExtract {
                page: page_number,
                reason: "PDF backend panicked while decoding the page".to_string(),
            }),
        }
    }

    // lopdf decodes content streams per call and keeps nothing between pages,
    // so the default no-op release is enough here.

    fn name(&self) -> String {
        self.path.display().to_string()
    }
}

// ---------------------------------------------------------------------------
// MemorySource: pages held in memory
// ---------------------------------------------------------------------------

/// [`PageSource`] over pages already in memory.
///
/// A `None` page fails to extract, which makes it handy for exercising the
/// recovery path.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    name: String,
    pages: Vec<Option<String>>,
    releases: u32,
}

impl MemorySource {
    /// Create a source from page texts.
    pub fn new<I, T>(name: impl Into<String>, pages: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            name: name.into(),
            pages: pages.into_iter().map(|t| Some(t.into())).collect(),
            releases: 0,
        }
    }

    /// Create a source where `None` pages fail.
    pub fn with_failures(name: impl Into<String>, pages: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            pages,
            releases: 0,
        }
    }

    /// Make a page (1-indexed) fail to extract.
    pub fn fail_page(mut self, page_number: u32) -> Self {
        if let Some(slot) = page_number
            .checked_sub(1)
            .and_then(|i| self.pages.get_mut(i as usize))
        {
            *slot = None;
        }
        self
    }

    /// Number of times the extractor asked this source to release buffers.
    pub fn release_count(&self) -> u32 {
        self.releases
    }
}

impl PageSource for MemorySource {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_text(&mut self, page_number: u32) -> Result<String> {
        let total = self.page_count();
        let slot = page_number
            .checked_sub(1)
            .and_then(|i| self.pages.get(i as usize))
            .ok_or(Error::PageOutOfRange(page_number, total))?;

        slot.clone().ok_or_else(|| Error::PageExtract {
            page: page_number,
            reason: "page text unavailable".to_string(),
        })
    }

    fn release_buffers(&mut self) {
        self.releases += 1;
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_memory_source_pages() {
        let mut source = MemorySource::new("mem", ["one", "two"]).fail_page(2);
        assert_eq!(source.page_count(), 2);
        assert_eq!(source.page_text(1).unwrap(), "one");
        assert!(matches!(
            source.page_text(2),
            Err(Error::PageExtract { page: 2, .. })
        ));
        assert!(matches!(
            source.page_text(0),
            Err(Error::PageOutOfRange(0, 2))
        ));
        assert!(matches!(
            source.page_text(3),
            Err(Error::PageOutOfRange(3, 2))
        ));
    }

    #[test]
    fn test_memory_source_release_count() {
        let mut source = MemorySource::new("mem", ["a"]);
        source.release_buffers();
        source.release_buffers();
        assert_eq!(source.release_count(), 2);
        assert_eq!(source.name(), "mem");
    }

    #[test]
    fn test_lopdf_source_rejects_non_pdf() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"<!DOCTYPE html><html></html>").unwrap();
        assert!(matches!(
            LopdfSource::open(file.path()),
            Err(Error::UnknownFormat)
        ));
    }

    #[test]
    fn test_lopdf_source_missing_file() {
        assert!(matches!(
            LopdfSource::open("/nonexistent/input.pdf"),
            Err(Error::Io(_))
        ));
    }
}
