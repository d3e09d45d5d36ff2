//! Ruleforge Extractor
//!
//! Turns document text into enriched rule findings.
//!
//! # Overview
//!
//! A document passes through four stages:
//!
//! ```text
//! text → Chunker → TextUnits → EscalationController → Findings → rule ids
//!                                 │        ▲
//!                                 ▼        │
//!                       Extractor (standard / high-fidelity)
//!                                 │
//!                                 ▼
//!                          FindingEnricher → Classifier
//! ```
//!
//! - **Chunking**: numbered headings split the text into sections; text
//!   without headings (and oversized sections) is cut into overlapping
//!   fixed-size token windows.
//! - **Extraction**: each unit is sent to a model at the standard tier and the
//!   JSON answer is parsed into raw findings.
//! - **Enrichment**: tags are normalized, missing categories are classified
//!   and provenance is stamped.
//! - **Escalation**: complex findings are re-extracted on their own at the
//!   high-fidelity tier and replaced in place by the refined results.
//!
//! # Example Usage
//!
//! ```no_run
//! use ruleforge_extractor::{ExtractorConfig, KeywordClassifier, PromptedExtractor, RulePipeline};
//! use ruleforge_llm::MockProvider;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExtractorConfig::default();
//! let extractor = PromptedExtractor::new(MockProvider::new("[]"), config.inference_timeout());
//! let pipeline = RulePipeline::new(&config, Arc::new(extractor), Arc::new(KeywordClassifier))?;
//!
//! let findings = pipeline.run("1 Scope\nAds must not target minors.\n2 Terms\n...", "policy").await?;
//! println!("Extracted {} rules", findings.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod chunking;
mod classifier;
mod config;
mod enrich;
mod error;
mod escalation;
mod extractor;
mod parser;
mod pipeline;
mod prompt;
mod tokenizer;


pub use chunking::{Chunker, HEADING_PATTERN};
pub use classifier::{keyword_category, KeywordClassifier, LlmClassifier};
pub use config::ExtractorConfig;
pub use enrich::FindingEnricher;
pub use error::ExtractorError;
pub use escalation::{conjunction_count, Complexity, EscalationController};
pub use extractor::PromptedExtractor;
pub use parser::parse_llm_response;
pub use pipeline::{assign_rule_ids, RulePipeline};
pub use prompt::PromptBuilder;
pub use tokenizer::{LexicalTokenizer, Tokenizer};
