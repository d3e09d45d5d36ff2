//! Text units - the bounded slices of a document dispatched to extraction

use serde::{Deserialize, Serialize};

/// Section label used for units that do not belong to a numbered heading
pub const GENERAL_SECTION: &str = "General";

/// A bounded slice of document text
///
/// Units are produced once by the chunker, in document order, and are not
/// modified afterwards. `body` is an exact slice of the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextUnit {
    /// Position of this unit in the document (0-based, contiguous)
    pub sequence_index: usize,

    /// Heading text of the enclosing section, or `"General"`
    pub section_label: String,

    /// The unit's text
    pub body: String,

    /// Number of tokens in `body`
    pub token_count: usize,
}

impl TextUnit {
    /// Create a new text unit
    pub fn new(
        sequence_index: usize,
        section_label: impl Into<String>,
        body: impl Into<String>,
        token_count: usize,
    ) -> Self {
        Self {
            sequence_index,
            section_label: section_label.into(),
            body: body.into(),
            token_count,
        }
    }

    /// True when the body holds nothing but whitespace
    pub fn is_blank(&self) -> bool {
        self.body.trim().is_empty()
    }
}
