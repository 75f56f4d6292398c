//! Reference blocks and the reference index artifact.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Identifier → blocks mentioning it, in discovery order.
pub type ReferenceIndex = BTreeMap<String, Vec<ReferenceBlock>>;

/// A segment of page text containing at least one reference identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceBlock {
    /// Page the block was found on (1-indexed)
    pub page_number: u32,

    /// The block text
    pub text_block: String,

    /// Canonical identifiers found in the block
    pub references: BTreeSet<String>,

    /// Identifier unique across the whole run, `page_{page}_{occurrence}`
    pub block_id: String,
}

impl ReferenceBlock {
    /// Build the block id for the `occurrence`-th block on `page_number`.
    pub fn make_id(page_number: u32, occurrence: u32) -> String {
        format!("page_{}_{}", page_number, occurrence)
    }

    /// Check whether the block mentions a canonical identifier.
    pub fn mentions(&self, reference: &str) -> bool {
        self.references.contains(reference)
    }
}

/// Summary view over a reference index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSummary {
    /// Number of reference blocks
    pub total_blocks: usize,

    /// Number of distinct identifiers
    pub unique_references: usize,

    /// All distinct identifiers, sorted
    pub reference_list: Vec<String>,
}

/// Header of the reference artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionInfo {
    /// Input the index was built from
    pub source_file: String,

    /// Timestamp of the underlying page extraction
    pub extraction_timestamp: String,

    /// Number of reference blocks
    pub total_reference_blocks: usize,

    /// Number of distinct identifiers
    pub unique_references: usize,

    /// All distinct identifiers, sorted
    pub reference_list: Vec<String>,
}

impl ExtractionInfo {
    /// Build the header from an index summary.
    pub fn new(
        source_file: impl Into<String>,
        extraction_timestamp: impl Into<String>,
        summary: IndexSummary,
    ) -> Self {
        Self {
            source_file: source_file.into(),
            extraction_timestamp: extraction_timestamp.into(),
            total_reference_blocks: summary.total_blocks,
            unique_references: summary.unique_references,
            reference_list: summary.reference_list,
        }
    }
}

/// The reference artifact: identifier → blocks, plus the flat block list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceArtifact {
    /// Header with summary information
    pub extraction_info: ExtractionInfo,

    /// Every block in discovery order
    pub reference_blocks: Vec<ReferenceBlock>,

    /// Blocks per identifier, in discovery order
    pub reference_index: ReferenceIndex,
}

impl ReferenceArtifact {
    /// Load a reference artifact from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Blocks for an identifier, matched on its canonical (uppercase) form.
    pub fn blocks_for(&self, reference: &str) -> &[ReferenceBlock] {
        self.reference_index
            .get(&reference.trim().to_uppercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The first `limit` identifiers in sorted order with their block counts.
    pub fn top_references(&self, limit: usize) -> Vec<(&str, usize)> {
        self.reference_index
            .iter()
            .take(limit)
            .map(|(reference, blocks)| (reference.as_str(), blocks.len()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(page: u32, occurrence: u32, refs: &[&str]) -> ReferenceBlock {
        ReferenceBlock {
            page_number: page,
            text_block: format!("block {} on page {}", occurrence, page),
            references: refs.iter().map(|r| r.to_string()).collect(),
            block_id: ReferenceBlock::make_id(page, occurrence),
        }
    }

    #[test]
    fn test_block_id() {
        assert_eq!(ReferenceBlock::make_id(12, 3), "page_12_3");
    }

    #[test]
    fn test_blocks_for_normalizes_query() {
        let b = block(1, 1, &["P-100"]);
        let mut index = BTreeMap::new();
        index.insert("P-100".to_string(), vec![b.clone()]);
        let artifact = ReferenceArtifact {
            extraction_info: ExtractionInfo::new(
                "content.json",
                "2024-01-15T10:30:45Z",
                IndexSummary {
                    total_blocks: 1,
                    unique_references: 1,
                    reference_list: vec!["P-100".to_string()],
                },
            ),
            reference_blocks: vec![b],
            reference_index: index,
        };

        assert_eq!(artifact.blocks_for(" p-100 ").len(), 1);
        assert!(artifact.blocks_for("P-101").is_empty());
        assert_eq!(artifact.top_references(10), vec![("P-100", 1)]);
    }

    #[test]
    fn test_references_serialize_sorted() {
        let b = block(2, 1, &["P-2", "CAR-OTP-0001-0001", "D-9"]);
        let json = serde_json::to_value(&b).unwrap();
        assert_eq!(
            json["references"],
            serde_json::json!(["CAR-OTP-0001-0001", "D-9", "P-2"])
        );
        assert!(b.mentions("D-9"));
    }
}
