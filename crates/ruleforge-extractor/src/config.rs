//! Configuration for the extraction pipeline

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for chunking, escalation and model calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Token budget of a single text unit
    pub max_tokens_per_chunk: usize,

    /// Tokens shared by consecutive fixed-size windows
    pub overlap_tokens: usize,

    /// A finding with more words than this is escalated
    pub complexity_word_limit: usize,

    /// A finding with more `and`/`or` conjunctions than this is escalated
    pub complexity_conjunction_limit: usize,

    /// Maximum time for a single model call (seconds)
    pub inference_timeout_secs: u64,

    /// Text units extracted concurrently within one document
    pub unit_concurrency: usize,
}

impl ExtractorConfig {
    /// Get the inference timeout as a Duration
    pub fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_tokens_per_chunk == 0 {
            return Err("max_tokens_per_chunk must be greater than 0".to_string());
        }
        if self.overlap_tokens >= self.max_tokens_per_chunk {
            return Err(format!(
                "overlap_tokens ({}) must be smaller than max_tokens_per_chunk ({})",
                self.overlap_tokens, self.max_tokens_per_chunk
            ));
        }
        if self.inference_timeout_secs == 0 {
            return Err("inference_timeout_secs must be greater than 0".to_string());
        }
        if self.unit_concurrency == 0 {
            return Err("unit_concurrency must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_tokens_per_chunk: 1500,
            overlap_tokens: 200,
            complexity_word_limit: 60,
            complexity_conjunction_limit: 3,
            inference_timeout_secs: 180,
            unit_concurrency: 4,
        }
    }
}

impl ExtractorConfig {
    /// Small units, processed one at a time; suits slow local models
    pub fn sequential() -> Self {
        Self {
            max_tokens_per_chunk: 800,
            overlap_tokens: 100,
            inference_timeout_secs: 300,
            unit_concurrency: 1,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
