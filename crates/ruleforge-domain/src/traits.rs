//! Trait definitions for external interactions
//!
//! These traits define the boundaries between extraction logic and
//! infrastructure. Implementations live in other crates and are injected
//! at construction time, so tests can substitute fakes.

use crate::document::{DocumentRef, FetchedDocument};
use crate::finding::{Category, RawFinding};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Capability tier of a model call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelTier {
    /// Default tier used for first-pass extraction
    Standard,
    /// Slower, costlier tier used only for escalation
    HighFidelity,
}

impl ModelTier {
    /// Get the tier name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Standard => "standard",
            ModelTier::HighFidelity => "high-fidelity",
        }
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors reported by a `DocumentReader`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Document exceeds the configured byte ceiling
    #[error("File size exceeds the limit of {limit_mb}MB ({size} bytes)")]
    TooLarge {
        /// Observed or announced size in bytes
        size: u64,
        /// Ceiling in megabytes
        limit_mb: u64,
    },

    /// Document does not exist at the given location
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Network or filesystem failure while retrieving the document
    #[error("Transport error: {0}")]
    Transport(String),

    /// The reference cannot be served by this reader
    #[error("Unsupported document reference: {0}")]
    Unsupported(String),
}

/// Errors reported by an `Extractor`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    /// The model answered but its output is not the expected structured shape
    #[error("Failed to parse model output: {0}")]
    Parse(String),

    /// The model could not be reached or rejected the request
    #[error("Model provider error: {0}")]
    Provider(String),

    /// The call did not finish in time
    #[error("Model call timed out")]
    Timeout,
}

/// Retrieves the raw bytes of a document
///
/// Implementations enforce a maximum byte size, both from any announced
/// size and from the payload actually retrieved.
#[async_trait]
pub trait DocumentReader: Send + Sync {
    /// Fetch the document
    async fn fetch(&self, document: &DocumentRef) -> Result<FetchedDocument, FetchError>;
}

/// Turns a text unit into raw findings using a model of the given tier
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Run extraction over `text`; `section_hint` names the section or category
    async fn infer(
        &self,
        tier: ModelTier,
        text: &str,
        section_hint: &str,
    ) -> Result<Vec<RawFinding>, InferenceError>;
}

/// Assigns a category to a rule
///
/// Implementations never fail: when their primary mechanism is unavailable
/// they fall back to a deterministic rule.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify the rule text
    async fn classify(&self, rule_text: &str) -> Category;
}

/// A single completion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Which model tier to use
    pub tier: ModelTier,
    /// System instruction
    pub system: String,
    /// User prompt
    pub prompt: String,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Create a request with the default output budget
    pub fn new(tier: ModelTier, system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            tier,
            system: system.into(),
            prompt: prompt.into(),
            max_tokens: 4000,
        }
    }

    /// Override the output budget
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (ruleforge-llm)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Error type for LLM operations
    type Error: fmt::Display + Send;

    /// Generate a text completion
    async fn generate(&self, request: &CompletionRequest) -> Result<String, Self::Error>;

    /// Name of the model serving the given tier
    fn model_name(&self, tier: ModelTier) -> &str;
}
