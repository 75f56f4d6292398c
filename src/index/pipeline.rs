//! Segmentation → matching → indexing over a page stream.

use std::collections::BTreeSet;

use super::indexer::ReferenceIndexer;
use super::matcher::ReferenceMatcher;
use super::options::IndexOptions;
use super::reorder::ReorderBuffer;
use super::segmenter::TextSegmenter;
use crate::error::{Error, Result};
use crate::model::RawPage;

/// The matching blocks of one page, in text order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageAnalysis {
    /// Page the blocks belong to
    pub page_number: u32,

    /// (block text, identifiers) for every block with at least one match
    pub blocks: Vec<(String, BTreeSet<String>)>,
}

/// Runs pages through the segmenter and matcher and feeds the indexer.
///
/// Pages must arrive numbered 1..N in order. In parallel mode pages are
/// analyzed in batches on the rayon pool and put back in page order before
/// they reach the indexer, so the result is identical to a sequential run.
#[derive(Debug)]
pub struct IndexPipeline {
    segmenter: TextSegmenter,
    matcher: ReferenceMatcher,
    parallel: bool,
    batch_size: usize,
}

impl IndexPipeline {
    /// Build a pipeline, compiling every pattern family up front.
    pub fn new(options: &IndexOptions) -> Result<Self> {
        let matcher = ReferenceMatcher::from_families(&options.families)?;
        let segmenter = TextSegmenter::with_min_len(options.min_block_len)
            .with_unicode_normalization(options.normalize_unicode);

        Ok(Self {
            segmenter,
            matcher,
            parallel: options.parallel,
            batch_size: options.batch_size.max(1),
        })
    }

    /// The compiled matcher.
    pub fn matcher(&self) -> &ReferenceMatcher {
        &self.matcher
    }

    /// Segment a page and match every block.
    ///
    /// Pages without any identifier are not segmented at all.
    pub fn analyze_page(&self, page: &RawPage) -> PageAnalysis {
        let mut analysis = PageAnalysis {
            page_number: page.page_number,
            blocks: Vec::new(),
        };

        let text = self.segmenter.normalize(&page.text);
        if !self.matcher.is_match(&text) {
            return analysis;
        }

        for block in self.segmenter.segment_normalized(&text) {
            let references = self.matcher.find(&block);
            if !references.is_empty() {
                analysis.blocks.push((block, references));
            }
        }

        analysis
    }

    /// Index a page stream.
    ///
    /// The first `Err` item aborts the run and is returned as is.
    pub fn run<I>(&self, pages: I) -> Result<ReferenceIndexer>
    where
        I: IntoIterator<Item = Result<RawPage>>,
    {
        let mut indexer = ReferenceIndexer::new();
        let mut expected = 1u32;
        let mut batch = Vec::with_capacity(if self.parallel { self.batch_size } else { 0 });

        for item in pages {
            let page = item?;
            check_page_number(&page, expected)?;
            expected += 1;

            if self.parallel {
                batch.push(page);
                if batch.len() >= self.batch_size {
                    self.analyze_batch(std::mem::take(&mut batch), &mut indexer);
                }
            } else {
                indexer.add_analysis(self.analyze_page(&page));
            }
        }

        if !batch.is_empty() {
            self.analyze_batch(batch, &mut indexer);
        }

        let summary = indexer.summary();
        log::info!(
            "Indexed {} pages: {} reference blocks, {} unique references",
            expected - 1,
            summary.total_blocks,
            summary.unique_references
        );

        Ok(indexer)
    }

    fn analyze_batch(&self, batch: Vec<RawPage>, indexer: &mut ReferenceIndexer) {
        let first = match batch.first() {
            Some(page) => page.page_number,
            None => return,
        };
        log::debug!("Analyzing pages {}..={}", first, first as usize + batch.len() - 1);

        let (tx, rx) = crossbeam_channel::unbounded();
        rayon::scope(|scope| {
            for page in &batch {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    // The receiver outlives the scope, so sending cannot fail.
                    let _ = tx.send(self.analyze_page(page));
                });
            }
        });
        drop(tx);

        let mut reorder = ReorderBuffer::new(first);
        for analysis in rx {
            reorder.insert(analysis.page_number, analysis);
            while let Some(ready) = reorder.pop_ready() {
                indexer.add_analysis(ready);
            }
        }
    }
}

fn check_page_number(page: &RawPage, expected: u32) -> Result<()> {
    if page.page_number == expected {
        Ok(())
    } else {
        Err(Error::InvalidArtifact(format!(
            "pages out of order: expected page {}, found page {}",
            expected, page.page_number
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_ONE: &str = "The chamber received the filing CAR-OTP-0001-0023 on Monday morning. \
                            Nothing of interest is mentioned in this second sentence at all. \
                            The defence relied on exhibit P-100 during the hearing that week.";

    fn pages(texts: &[&str]) -> Vec<Result<RawPage>> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Ok(RawPage::new(i as u32 + 1, *t)))
            .collect()
    }

    #[test]
    fn test_analyze_page_keeps_only_matching_blocks() {
        let pipeline = IndexPipeline::new(&IndexOptions::default()).unwrap();
        let analysis = pipeline.analyze_page(&RawPage::new(1, PAGE_ONE));
        assert_eq!(analysis.blocks.len(), 2);
        assert!(analysis.blocks[0].1.contains("CAR-OTP-0001-0023"));
        assert!(analysis.blocks[1].1.contains("P-100"));
    }

    #[test]
    fn test_page_without_identifiers() {
        let pipeline = IndexPipeline::new(&IndexOptions::default()).unwrap();
        let analysis =
            pipeline.analyze_page(&RawPage::new(2, "Plain text with no identifiers whatsoever."));
        assert!(analysis.blocks.is_empty());
    }

    #[test]
    fn test_run_rejects_out_of_order_pages() {
        let pipeline = IndexPipeline::new(&IndexOptions::default()).unwrap();
        let items = vec![Ok(RawPage::new(1, "a")), Ok(RawPage::new(3, "c"))];
        assert!(matches!(
            pipeline.run(items),
            Err(Error::InvalidArtifact(_))
        ));
    }

    #[test]
    fn test_run_propagates_source_errors() {
        let pipeline = IndexPipeline::new(&IndexOptions::default()).unwrap();
        let items = vec![
            Ok(RawPage::new(1, PAGE_ONE)),
            Err(Error::TooManyPageFailures { failed: 2, limit: 1 }),
        ];
        assert!(matches!(
            pipeline.run(items),
            Err(Error::TooManyPageFailures { .. })
        ));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let texts: Vec<String> = (1..=37)
            .map(|i| {
                format!(
                    "Page {} discusses the exhibit P-{} in considerable and useful detail. \
                     It also refers back to CAR-OTP-0001-{:04} for the earlier context given.",
                    i,
                    i % 5,
                    i % 3
                )
            })
            .collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();

        let sequential = IndexPipeline::new(&IndexOptions::default())
            .unwrap()
            .run(pages(&refs))
            .unwrap();
        let parallel = IndexPipeline::new(&IndexOptions::default().with_parallel().with_batch_size(4))
            .unwrap()
            .run(pages(&refs))
            .unwrap();

        assert_eq!(sequential.blocks(), parallel.blocks());
        assert_eq!(sequential.index(), parallel.index());
        assert_eq!(sequential.blocks().len(), 74);
    }

    #[test]
    fn test_invalid_family_fails_before_any_page() {
        let options = IndexOptions::default()
            .add_family(crate::index::PatternFamily::new("Broken", "P-("));
        assert!(matches!(
            IndexPipeline::new(&options),
            Err(Error::InvalidPattern { .. })
        ));
    }
}
