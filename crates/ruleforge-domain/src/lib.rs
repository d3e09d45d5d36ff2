//! Ruleforge Domain Layer
//!
//! Core value types and capability interfaces for rule extraction.
//! Nothing in this crate performs I/O; readers, language models and webhook
//! transports are implemented in the infrastructure crates.
//!
//! ## Key Concepts
//!
//! - **TextUnit**: A bounded slice of document text sent as one inference request
//! - **Finding**: One enriched rule extracted from a unit
//! - **Job**: The lifecycle of one asynchronous extraction request
//! - **WebhookEvent**: Outbound notification of a job state transition
//! - **Capabilities**: `DocumentReader`, `Extractor`, `Classifier` and `LlmProvider`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod event;
pub mod finding;
pub mod job;
pub mod traits;
pub mod unit;

// Re-exports for convenience
pub use document::{DocumentKind, DocumentRef, FetchedDocument};
pub use event::{EventType, WebhookEvent};
pub use finding::{Category, Finding, FindingMetadata, RawFinding, RuleId};
pub use job::{Job, JobId, JobState, TransitionError};
pub use traits::{
    Classifier, CompletionRequest, DocumentReader, Extractor, FetchError, InferenceError,
    LlmProvider, ModelTier,
};
pub use unit::TextUnit;
