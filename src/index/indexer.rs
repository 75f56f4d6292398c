//! Building the identifier → blocks index.

use std::collections::{BTreeSet, HashMap};

use super::pipeline::PageAnalysis;
use crate::model::{
    ExtractionInfo, IndexSummary, ReferenceArtifact, ReferenceBlock, ReferenceIndex,
};

/// Accumulates reference blocks in page-traversal order.
///
/// Block ids are derived from the page number and a per-page occurrence
/// counter, so identical text on two pages gets two ids. Every block is
/// appended to the list of each identifier it mentions; lists are
/// append-only.
#[derive(Debug, Default)]
pub struct ReferenceIndexer {
    blocks: Vec<ReferenceBlock>,
    index: ReferenceIndex,
    occurrences: HashMap<u32, u32>,
}

impl ReferenceIndexer {
    /// Create an empty indexer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a block found on `page_number`.
    ///
    /// Blocks without identifiers are ignored and do not consume an
    /// occurrence number.
    pub fn add(
        &mut self,
        page_number: u32,
        text_block: impl Into<String>,
        references: BTreeSet<String>,
    ) -> Option<&ReferenceBlock> {
        if references.is_empty() {
            return None;
        }

        let occurrence = self.occurrences.entry(page_number).or_insert(0);
        *occurrence += 1;

        let block = ReferenceBlock {
            page_number,
            text_block: text_block.into(),
            block_id: ReferenceBlock::make_id(page_number, *occurrence),
            references,
        };

        for reference in &block.references {
            self.index
                .entry(reference.clone())
                .or_default()
                .push(block.clone());
        }

        self.blocks.push(block);
        self.blocks.last()
    }

    /// Record every block of an analyzed page.
    pub fn add_analysis(&mut self, analysis: PageAnalysis) {
        let page_number = analysis.page_number;
        for (text, references) in analysis.blocks {
            self.add(page_number, text, references);
        }
    }

    /// All blocks in discovery order.
    pub fn blocks(&self) -> &[ReferenceBlock] {
        &self.blocks
    }

    /// Blocks mentioning a canonical identifier.
    pub fn get(&self, reference: &str) -> &[ReferenceBlock] {
        self.index.get(reference).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The index built so far.
    pub fn index(&self) -> &ReferenceIndex {
        &self.index
    }

    /// Block count, distinct identifier count and the sorted identifier list.
    pub fn summary(&self) -> IndexSummary {
        IndexSummary {
            total_blocks: self.blocks.len(),
            unique_references: self.index.len(),
            reference_list: self.index.keys().cloned().collect(),
        }
    }

    /// Finish indexing and produce the reference artifact.
    pub fn into_artifact(
        self,
        source_file: impl Into<String>,
        extraction_timestamp: impl Into<String>,
    ) -> ReferenceArtifact {
        let extraction_info =
            ExtractionInfo::new(source_file, extraction_timestamp, self.summary());
        ReferenceArtifact {
            extraction_info,
            reference_blocks: self.blocks,
            reference_index: self.index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_occurrence_order_across_pages() {
        let mut indexer = ReferenceIndexer::new();
        indexer.add(1, "first block on page one", refs(&["CAR-D29-0001-0001"]));
        indexer.add(1, "second block on page one", refs(&["CAR-D29-0001-0001"]));
        indexer.add(3, "only block on page three", refs(&["CAR-D29-0001-0001"]));

        let ids: Vec<&str> = indexer
            .get("CAR-D29-0001-0001")
            .iter()
            .map(|b| b.block_id.as_str())
            .collect();
        assert_eq!(ids, vec!["page_1_1", "page_1_2", "page_3_1"]);
    }

    #[test]
    fn test_empty_reference_set_is_skipped() {
        let mut indexer = ReferenceIndexer::new();
        assert!(indexer.add(1, "no identifiers here", BTreeSet::new()).is_none());
        let block = indexer.add(1, "mentions P-1", refs(&["P-1"])).unwrap();
        assert_eq!(block.block_id, "page_1_1");
        assert_eq!(indexer.blocks().len(), 1);
    }

    #[test]
    fn test_same_text_on_two_pages_gets_two_ids() {
        let mut indexer = ReferenceIndexer::new();
        indexer.add(1, "repeated header P-7", refs(&["P-7"]));
        indexer.add(2, "repeated header P-7", refs(&["P-7"]));
        let ids: Vec<&str> = indexer.blocks().iter().map(|b| b.block_id.as_str()).collect();
        assert_eq!(ids, vec!["page_1_1", "page_2_1"]);
    }

    #[test]
    fn test_block_is_listed_under_each_identifier() {
        let mut indexer = ReferenceIndexer::new();
        indexer.add(4, "both P-1 and D-2", refs(&["P-1", "D-2"]));
        assert_eq!(indexer.get("P-1"), indexer.get("D-2"));
        assert!(indexer.get("V-3").is_empty());

        let summary = indexer.summary();
        assert_eq!(summary.total_blocks, 1);
        assert_eq!(summary.unique_references, 2);
        assert_eq!(summary.reference_list, vec!["D-2", "P-1"]);
    }

    #[test]
    fn test_add_analysis() {
        let mut indexer = ReferenceIndexer::new();
        indexer.add_analysis(PageAnalysis {
            page_number: 5,
            blocks: vec![
                ("block mentioning P-1".to_string(), refs(&["P-1"])),
                ("block mentioning D-2".to_string(), refs(&["D-2"])),
            ],
        });
        let artifact = indexer.into_artifact("content.json", "2024-01-15T10:30:45Z");
        assert_eq!(artifact.extraction_info.total_reference_blocks, 2);
        assert_eq!(artifact.reference_blocks[1].block_id, "page_5_2");
        assert_eq!(artifact.reference_index.len(), 2);
    }
}
