//! Splitting page text into blocks.

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Blocks shorter than this many characters are dropped by default.
pub const DEFAULT_MIN_BLOCK_LEN: usize = 50;

/// Splits a page's text into sentence-like blocks.
///
/// Whitespace is collapsed first, then the text is cut after sentence
/// punctuation that is followed by whitespace and an uppercase letter, then
/// again around numbered-list markers (`12.`) that follow a full stop. A
/// marker becomes a fragment of its own. Fragments shorter than the minimum
/// length are discarded.
#[derive(Debug, Clone)]
pub struct TextSegmenter {
    min_len: usize,
    normalize_unicode: bool,
    whitespace: Regex,
    sentence_break: Regex,
    list_marker: Regex,
}

impl TextSegmenter {
    /// Create a segmenter with the default minimum block length.
    pub fn new() -> Self {
        Self::with_min_len(DEFAULT_MIN_BLOCK_LEN)
    }

    /// Create a segmenter with a custom minimum block length.
    pub fn with_min_len(min_len: usize) -> Self {
        Self {
            min_len,
            normalize_unicode: true,
            whitespace: Regex::new(r"\s+").expect("hard-coded pattern"),
            sentence_break: Regex::new(r"[.!?]\s+\p{Lu}").expect("hard-coded pattern"),
            list_marker: Regex::new(r"\.\s+\d+\.").expect("hard-coded pattern"),
        }
    }

    /// Enable or disable NFC normalization before splitting.
    pub fn with_unicode_normalization(mut self, enabled: bool) -> Self {
        self.normalize_unicode = enabled;
        self
    }

    /// Minimum block length in characters.
    pub fn min_len(&self) -> usize {
        self.min_len
    }

    /// Normalize Unicode (if enabled) and collapse whitespace runs to one space.
    pub fn normalize(&self, text: &str) -> String {
        if self.normalize_unicode {
            let nfc: String = text.nfc().collect();
            self.whitespace.replace_all(&nfc, " ").into_owned()
        } else {
            self.whitespace.replace_all(text, " ").into_owned()
        }
    }

    /// Split raw page text into blocks, in text order.
    pub fn segment(&self, text: &str) -> Vec<String> {
        self.segment_normalized(&self.normalize(text))
    }

    /// Split text that already went through [`normalize`](Self::normalize).
    pub fn segment_normalized(&self, text: &str) -> Vec<String> {
        let mut blocks = Vec::new();

        for sentence in split_sentences(&self.sentence_break, text) {
            for part in split_list_markers(&self.list_marker, sentence) {
                let part = part.trim();
                if !part.is_empty() && part.chars().count() >= self.min_len {
                    blocks.push(part.to_string());
                }
            }
        }

        blocks
    }
}

impl Default for TextSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

/// Cut `text` after sentence punctuation; the uppercase letter that closes
/// each boundary starts the next part.
fn split_sentences<'t>(boundary: &Regex, text: &'t str) -> Vec<&'t str> {
    let mut parts = Vec::new();
    let mut start = 0;

    while let Some(m) = boundary.find_at(text, start) {
        // The punctuation is a single ASCII byte.
        parts.push(&text[start..m.start() + 1]);
        let last = m.as_str().chars().last().map_or(0, char::len_utf8);
        start = m.end() - last;
    }

    parts.push(&text[start..]);
    parts
}

/// Cut `text` around every list marker that follows a full stop.
///
/// The full stop stays with the text before it and the marker (`12.`) is
/// returned as a part of its own.
fn split_list_markers<'t>(marker: &Regex, text: &'t str) -> Vec<&'t str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut search = 0;

    while let Some(m) = marker.find_at(text, search) {
        parts.push(&text[start..m.start() + 1]);
        parts.push(m.as_str()[1..].trim_start());
        start = m.end();
        // The marker's own full stop may open the next boundary.
        search = m.end() - 1;
    }

    parts.push(&text[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_A: &str = "The first sentence is long enough to be kept as a block of text.";
    const LONG_B: &str = "Another sentence that also easily passes the minimum length check.";

    #[test]
    fn test_splits_on_sentence_boundaries() {
        let text = format!("{}  {}", LONG_A, LONG_B);
        let blocks = TextSegmenter::new().segment(&text);
        assert_eq!(blocks, vec![LONG_A.to_string(), LONG_B.to_string()]);
    }

    #[test]
    fn test_no_split_before_lowercase() {
        let text = "This sentence mentions approx. three items and continues in lower case here.";
        let blocks = TextSegmenter::new().segment(text);
        assert_eq!(blocks, vec![text.to_string()]);
    }

    #[test]
    fn test_collapses_line_breaks() {
        let text = "A block that was broken\nacross several\r\n   lines by the PDF text layer.";
        let blocks = TextSegmenter::new().segment(text);
        assert_eq!(
            blocks,
            vec!["A block that was broken across several lines by the PDF text layer.".to_string()]
        );
    }

    #[test]
    fn test_drops_short_fragments() {
        let text = format!("Too short. {} Tiny! {}", LONG_A, LONG_B);
        let blocks = TextSegmenter::new().segment(&text);
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|b| b.chars().count() >= DEFAULT_MIN_BLOCK_LEN));
    }

    #[test]
    fn test_splits_numbered_list_items() {
        let text = "the chamber considered the request in detail. 12. the defence replied within \
                    the time limit set. 13. the prosecution filed its observations on the matter.";
        let blocks = TextSegmenter::with_min_len(10).segment(text);
        assert_eq!(
            blocks,
            vec![
                "the chamber considered the request in detail.".to_string(),
                "the defence replied within the time limit set.".to_string(),
                "the prosecution filed its observations on the matter.".to_string(),
            ]
        );
    }

    #[test]
    fn test_list_marker_is_its_own_fragment() {
        let text = "the chamber considered the request in detail. 12. the defence replied in full";
        let blocks = TextSegmenter::with_min_len(1).segment(text);
        assert_eq!(
            blocks,
            vec![
                "the chamber considered the request in detail.",
                "12.",
                "the defence replied in full",
            ]
        );
    }

    #[test]
    fn test_list_marker_does_not_count_towards_length() {
        // 49 characters after the marker, 53 with it
        let text = "the chamber considered the request in detail. \
                    12. the defence replied within the agreed time limit.";
        let blocks = TextSegmenter::new().segment(text);
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_adjacent_list_markers() {
        let text = "items follow. 1. 2. the second item";
        let blocks = TextSegmenter::with_min_len(1).segment(text);
        assert_eq!(blocks, vec!["items follow.", "1.", "2.", "the second item"]);
    }

    #[test]
    fn test_min_len_counts_characters() {
        let segmenter = TextSegmenter::with_min_len(5);
        assert_eq!(segmenter.segment("ééééé"), vec!["ééééé".to_string()]);
        assert!(segmenter.segment("éééé").is_empty());
    }

    #[test]
    fn test_unicode_normalization() {
        // "e" + combining acute accent composes to a single "é"
        let decomposed = "Caf\u{0065}\u{0301} au lait";
        let segmenter = TextSegmenter::with_min_len(1);
        assert_eq!(segmenter.normalize(decomposed), "Café au lait");
        let raw = segmenter.clone().with_unicode_normalization(false);
        assert_eq!(raw.normalize(decomposed), decomposed);
    }

    #[test]
    fn test_non_ascii_uppercase_boundary() {
        let text = "Erste Zeile endet hier. Über die zweite Zeile wird ebenfalls berichtet.";
        let blocks = TextSegmenter::with_min_len(1).segment(text);
        assert_eq!(
            blocks,
            vec![
                "Erste Zeile endet hier.".to_string(),
                "Über die zweite Zeile wird ebenfalls berichtet.".to_string(),
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(TextSegmenter::new().segment("").is_empty());
        assert!(TextSegmenter::new().segment("   \n ").is_empty());
    }
}
