//! Document chunking
//!
//! Numbered headings (`3`, `3.2.1`, `4a`) at the start of a line split the
//! document into sections. With fewer than two headings the document is
//! treated as unstructured and cut into overlapping fixed-size token
//! windows. Sections over the token budget are windowed the same way and
//! keep their heading as label.

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::tokenizer::{LexicalTokenizer, Tokenizer};
use regex::Regex;
use ruleforge_domain::unit::GENERAL_SECTION;
use ruleforge_domain::TextUnit;
use std::sync::Arc;
use tracing::debug;

/// Line-anchored numbered heading marker
pub const HEADING_PATTERN: &str = r"(?m)^\d+(\.\d+)*[a-z]?\s+";

/// Splits document text into bounded text units
#[derive(Clone)]
pub struct Chunker {
    tokenizer: Arc<dyn Tokenizer>,
    heading: Regex,
    max_tokens: usize,
    overlap_tokens: usize,
}

impl std::fmt::Debug for Chunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunker")
            .field("max_tokens", &self.max_tokens)
            .field("overlap_tokens", &self.overlap_tokens)
            .finish()
    }
}

impl Chunker {
    /// Create a chunker with the default tokenizer
    ///
    /// # Errors
    ///
    /// `overlap_tokens` must be smaller than `max_tokens`, otherwise windows
    /// would never advance.
    pub fn new(max_tokens: usize, overlap_tokens: usize) -> Result<Self, ExtractorError> {
        if max_tokens == 0 {
            return Err(ExtractorError::Config(
                "max_tokens_per_chunk must be greater than 0".to_string(),
            ));
        }
        if overlap_tokens >= max_tokens {
            return Err(ExtractorError::Config(format!(
                "overlap_tokens ({}) must be smaller than max_tokens_per_chunk ({})",
                overlap_tokens, max_tokens
            )));
        }
        let heading = Regex::new(HEADING_PATTERN)
            .map_err(|e| ExtractorError::Config(format!("Invalid heading pattern: {}", e)))?;

        Ok(Self {
            tokenizer: Arc::new(LexicalTokenizer),
            heading,
            max_tokens,
            overlap_tokens,
        })
    }

    /// Create a chunker from the pipeline configuration
    pub fn from_config(config: &ExtractorConfig) -> Result<Self, ExtractorError> {
        Self::new(config.max_tokens_per_chunk, config.overlap_tokens)
    }

    /// Use a different tokenizer
    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// Token budget per unit
    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Tokens shared by consecutive windows
    pub fn overlap_tokens(&self) -> usize {
        self.overlap_tokens
    }

    /// Tokenizer used for budgets
    pub fn tokenizer(&self) -> &dyn Tokenizer {
        self.tokenizer.as_ref()
    }

    /// Split `text` into units, in document order
    ///
    /// Always returns at least one unit; an empty document yields a single
    /// empty `"General"` unit.
    pub fn chunk(&self, text: &str) -> Vec<TextUnit> {
        let pieces = match self.sections(text) {
            None => self.windows(text, GENERAL_SECTION),
            Some(sections) => {
                let mut pieces = Vec::with_capacity(sections.len());
                for (label, body) in sections {
                    let tokens = self.tokenizer.count(body);
                    if tokens > self.max_tokens {
                        debug!(section = %label, tokens, "Section over budget, windowing");
                        pieces.extend(self.windows(body, &label));
                    } else {
                        pieces.push((label, body, tokens));
                    }
                }
                pieces
            }
        };

        pieces
            .into_iter()
            .enumerate()
            .map(|(idx, (label, body, tokens))| TextUnit::new(idx, label, body, tokens))
            .collect()
    }

    /// Heading-bounded sections of `text`, or `None` for unstructured text
    ///
    /// Concatenating the returned bodies reproduces `text` exactly. Leading
    /// text before the first heading becomes a `"General"` section when it
    /// holds anything but whitespace, and is folded into the first section
    /// otherwise.
    pub fn sections<'a>(&self, text: &'a str) -> Option<Vec<(String, &'a str)>> {
        let mut starts: Vec<usize> = self.heading.find_iter(text).map(|m| m.start()).collect();
        if starts.len() < 2 {
            return None;
        }

        let mut sections = Vec::with_capacity(starts.len() + 1);
        let preamble = &text[..starts[0]];
        let labels: Vec<String> = starts.iter().map(|&s| heading_label(&text[s..])).collect();
        if preamble.trim().is_empty() {
            starts[0] = 0;
        } else {
            sections.push((GENERAL_SECTION.to_string(), preamble));
        }

        for (i, label) in labels.into_iter().enumerate() {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            sections.push((label, &text[starts[i]..end]));
        }
        Some(sections)
    }

    /// Fixed-size windows over `text`, advancing by `max - overlap` tokens
    fn windows<'a>(&self, text: &'a str, label: &str) -> Vec<(String, &'a str, usize)> {
        let spans = self.tokenizer.encode(text);
        if spans.is_empty() {
            return vec![(label.to_string(), text, 0)];
        }

        let step = self.max_tokens - self.overlap_tokens;
        let mut windows = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + self.max_tokens).min(spans.len());
            let body = self.tokenizer.decode(text, &spans[start..end]);
            windows.push((label.to_string(), body, end - start));
            if end == spans.len() {
                break;
            }
            start += step;
        }
        windows
    }
}

fn heading_label(section: &str) -> String {
    section.lines().next().unwrap_or_default().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chunker(max: usize, overlap: usize) -> Chunker {
        Chunker::new(max, overlap).unwrap()
    }

    #[test]
    fn test_overlap_must_be_below_budget() {
        assert!(matches!(Chunker::new(10, 10), Err(ExtractorError::Config(_))));
        assert!(matches!(Chunker::new(0, 0), Err(ExtractorError::Config(_))));
        assert!(Chunker::new(10, 9).is_ok());
    }

    #[test]
    fn test_short_unstructured_text_is_one_unit() {
        let text = "Advertising must not target minors.\nPromotions require approval.";
        let units = chunker(100, 10).chunk(text);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].section_label, "General");
        assert_eq!(units[0].body, text);
        assert_eq!(units[0].sequence_index, 0);
    }

    #[test]
    fn test_empty_text() {
        let units = chunker(100, 10).chunk("");
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].section_label, "General");
        assert_eq!(units[0].body, "");
        assert_eq!(units[0].token_count, 0);
    }

    #[test]
    fn test_single_heading_is_unstructured() {
        let text = "1 Scope\nThis policy covers ads.";
        let units = chunker(100, 10).chunk(text);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].section_label, "General");
    }

    #[test]
    fn test_heading_split() {
        let text = "1 Scope\nApplies to all ads.\n2 Rules\n2.1 No betting ads.\n2.1a Exceptions apply.\n";
        let units = chunker(100, 10).chunk(text);
        let labels: Vec<_> = units.iter().map(|u| u.section_label.as_str()).collect();
        assert_eq!(labels, vec!["1 Scope", "2 Rules", "2.1 No betting ads.", "2.1a Exceptions apply."]);
        assert_eq!(units[0].body, "1 Scope\nApplies to all ads.\n");
        let joined: String = units.iter().map(|u| u.body.as_str()).collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn test_preamble_becomes_general_section() {
        let text = "Company Policy\n\n1 Scope\nAll ads.\n2 Rules\nNo bets.";
        let units = chunker(100, 10).chunk(text);
        assert_eq!(units.len(), 3);
        assert_eq!(units[0].section_label, "General");
        assert_eq!(units[0].body, "Company Policy\n\n");
        assert_eq!(units[1].section_label, "1 Scope");
    }

    #[test]
    fn test_blank_preamble_is_folded() {
        let text = "\n\n1 Scope\nAll ads.\n2 Rules\nNo bets.";
        let units = chunker(100, 10).chunk(text);
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].section_label, "1 Scope");
        assert!(units[0].body.starts_with("\n\n1 Scope"));
    }

    #[test]
    fn test_mid_line_numbers_are_not_headings() {
        let text = "Pay 5 dollars.\nThen 6 more.\nSection 7 applies.";
        let units = chunker(100, 10).chunk(text);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].section_label, "General");
    }

    #[test]
    fn test_fixed_windows_overlap() {
        // 30 single-token words
        let text: String = (0..30).map(|i| format!("w{} ", i % 10)).collect();
        let text = text.trim_end();
        let units = chunker(10, 3).chunk(text);

        // starts at 0, 7, 14, 21 -> last window reaches the end
        assert_eq!(units.len(), 4);
        assert!(units.iter().all(|u| u.section_label == "General"));
        assert_eq!(units[0].token_count, 10);
        assert_eq!(units[3].token_count, 9);
        for pair in units.windows(2) {
            let a: Vec<_> = pair[0].body.split_whitespace().collect();
            let b: Vec<_> = pair[1].body.split_whitespace().collect();
            assert_eq!(&a[a.len() - 3..], &b[..3]);
        }
    }

    #[test]
    fn test_window_loop_terminates_at_end() {
        // exactly one full window: no trailing overlap-only window
        let text = "a b c d e";
        let units = chunker(5, 2).chunk(text);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].token_count, 5);
    }

    #[test]
    fn test_oversized_section_is_resplit_in_place() {
        let long_body: String = (0..40).map(|_| "word ").collect();
        let text = format!("1 Intro\nShort.\n2 Details\n{}\n3 End\nDone.\n", long_body.trim_end());
        let units = chunker(12, 2).chunk(&text);

        assert_eq!(units[0].section_label, "1 Intro");
        let last = units.last().unwrap();
        assert_eq!(last.section_label, "3 End");
        let middle: Vec<_> = units[1..units.len() - 1].iter().collect();
        assert!(middle.len() > 1);
        assert!(middle.iter().all(|u| u.section_label == "2 Details"));
        for (idx, unit) in units.iter().enumerate() {
            assert_eq!(unit.sequence_index, idx);
            assert!(unit.token_count <= 12);
        }
    }

    fn structured_doc() -> impl Strategy<Value = String> {
        (
            "[A-Za-z ]{0,20}",
            prop::collection::vec(("[1-9](\\.[0-9]){0,2}[a-c]?", "[a-z ,.]{0,60}"), 2..8),
        )
            .prop_map(|(preamble, sections)| {
                let mut doc = preamble;
                for (number, body) in sections {
                    if !doc.is_empty() && !doc.ends_with('\n') {
                        doc.push('\n');
                    }
                    doc.push_str(&format!("{} {}\n", number, body));
                }
                doc
            })
    }

    proptest! {
        #[test]
        fn prop_units_respect_budget(text in "\\PC{0,400}", max in 2usize..40, overlap_frac in 0usize..100) {
            let overlap = overlap_frac * (max - 1) / 100;
            let c = chunker(max, overlap);
            let units = c.chunk(&text);
            prop_assert!(!units.is_empty());
            for (idx, unit) in units.iter().enumerate() {
                prop_assert_eq!(unit.sequence_index, idx);
                prop_assert!(unit.token_count <= max);
                prop_assert_eq!(c.tokenizer().count(&unit.body), unit.token_count);
            }
        }

        #[test]
        fn prop_fixed_windows_share_overlap(text in "[a-z ,.]{0,400}", max in 2usize..30, overlap_frac in 1usize..100) {
            let overlap = (overlap_frac * (max - 1) / 100).max(1);
            let c = chunker(max, overlap);
            let units = c.chunk(&text);
            for pair in units.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                prop_assert_eq!(a.token_count, max);
                let head_spans = c.tokenizer().encode(&b.body);
                let head = &b.body[..head_spans[overlap - 1].end];
                prop_assert!(a.body.ends_with(head));
            }
        }

        #[test]
        fn prop_sections_reconstruct_text(text in structured_doc()) {
            let c = chunker(10_000, 10);
            let sections = c.sections(&text);
            prop_assert!(sections.is_some());
            let joined: String = sections.unwrap().iter().map(|(_, body)| *body).collect();
            prop_assert_eq!(&joined, &text);

            let units = c.chunk(&text);
            let joined: String = units.iter().map(|u| u.body.as_str()).collect();
            prop_assert_eq!(joined, text);
        }

        #[test]
        fn prop_short_unstructured_text_is_one_unit(text in "[a-z ]{0,200}") {
            let c = chunker(1000, 100);
            let units = c.chunk(&text);
            prop_assert_eq!(units.len(), 1);
            prop_assert_eq!(&units[0].body, &text);
        }
    }
}
