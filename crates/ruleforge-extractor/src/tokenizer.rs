//! Token counting
//!
//! Token budgets are enforced over byte spans of the source text, so a
//! window of tokens always decodes to an exact slice of the input.

use std::ops::Range;

/// Longest alphanumeric run kept as a single token
const MAX_WORD_PIECE: usize = 8;

/// Splits text into contiguous tokens
pub trait Tokenizer: Send + Sync {
    /// Byte spans of every token, in order, covering the whole text
    fn encode(&self, text: &str) -> Vec<Range<usize>>;

    /// Number of tokens in `text`
    fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }

    /// Source text covered by a contiguous run of spans
    fn decode<'a>(&self, text: &'a str, spans: &[Range<usize>]) -> &'a str {
        match (spans.first(), spans.last()) {
            (Some(first), Some(last)) => &text[first.start..last.end],
            _ => "",
        }
    }
}

/// Word-piece tokenizer
///
/// A token is optional leading whitespace followed by either an alphanumeric
/// run of at most eight characters or one other character. Whitespace at the
/// very end of the input forms its own token.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalTokenizer;

impl Tokenizer for LexicalTokenizer {
    fn encode(&self, text: &str) -> Vec<Range<usize>> {
        let mut spans = Vec::new();
        let mut chars = text.char_indices().peekable();

        while let Some(&(start, _)) = chars.peek() {
            while chars.next_if(|&(_, c)| c.is_whitespace()).is_some() {}

            match chars.peek() {
                None => {
                    spans.push(start..text.len());
                    break;
                }
                Some(&(_, c)) if c.is_alphanumeric() => {
                    let mut taken = 0;
                    while taken < MAX_WORD_PIECE
                        && chars.next_if(|&(_, c)| c.is_alphanumeric()).is_some()
                    {
                        taken += 1;
                    }
                }
                Some(_) => {
                    chars.next();
                }
            }

            let end = chars.peek().map_or(text.len(), |&(i, _)| i);
            spans.push(start..end);
        }

        spans
    }
}
