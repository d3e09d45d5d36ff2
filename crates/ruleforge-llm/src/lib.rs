//! Ruleforge LLM Provider Layer
//!
//! Pluggable LLM provider implementations of the `LlmProvider` trait from
//! `ruleforge-domain`. Every provider serves two capability tiers: a
//! standard model for first-pass extraction and a high-fidelity model used
//! only when a finding is escalated.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic scripted responses for testing
//! - `OpenAiProvider`: OpenAI chat completions API
//! - `OllamaProvider`: Local Ollama API
//!
//! `LlmSettings::build` picks a provider from configuration.
//!
//! # Examples
//!
//! ```no_run
//! use ruleforge_llm::{LlmSettings, ProviderKind};
//!
//! let settings = LlmSettings {
//!     provider: ProviderKind::Ollama,
//!     ..LlmSettings::default()
//! };
//! let provider = settings.build().expect("valid settings");
//! ```

#![warn(missing_docs)]

pub mod ollama;
pub mod openai;
pub mod settings;

use async_trait::async_trait;
use ruleforge_domain::{CompletionRequest, LlmProvider, ModelTier};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use settings::{ConfiguredProvider, LlmSettings, ProviderKind};

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Provider misconfiguration (missing credentials, bad endpoint)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Error,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock LLM provider for deterministic testing
///
/// Replies are chosen in this order:
/// 1. the first rule whose needle occurs in the prompt
/// 2. the next scripted reply queued for the request's tier
/// 3. the default response
///
/// Every request is recorded so tests can assert how often each tier was used.
///
/// # Examples
///
/// ```
/// use ruleforge_llm::MockProvider;
/// use ruleforge_domain::ModelTier;
///
/// let provider = MockProvider::new("[]")
///     .with_reply_for(ModelTier::HighFidelity, r#"[{"rule_text": "refined"}]"#)
///     .with_reply_containing("casino", r#"[{"rule_text": "No casino ads"}]"#);
/// assert_eq!(provider.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    by_needle: Arc<Mutex<Vec<(String, MockReply)>>>,
    by_tier: Arc<Mutex<HashMap<ModelTier, VecDeque<MockReply>>>>,
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            by_needle: Arc::new(Mutex::new(Vec::new())),
            by_tier: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer prompts containing `needle` with `response`
    pub fn with_reply_containing(self, needle: impl Into<String>, response: impl Into<String>) -> Self {
        lock(&self.by_needle).push((needle.into(), MockReply::Text(response.into())));
        self
    }

    /// Fail prompts containing `needle`
    pub fn with_error_containing(self, needle: impl Into<String>) -> Self {
        lock(&self.by_needle).push((needle.into(), MockReply::Error));
        self
    }

    /// Queue a one-shot reply for the given tier
    pub fn with_reply_for(self, tier: ModelTier, response: impl Into<String>) -> Self {
        lock(&self.by_tier)
            .entry(tier)
            .or_default()
            .push_back(MockReply::Text(response.into()));
        self
    }

    /// Queue a one-shot failure for the given tier
    pub fn with_error_for(self, tier: ModelTier) -> Self {
        lock(&self.by_tier)
            .entry(tier)
            .or_default()
            .push_back(MockReply::Error);
        self
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Number of calls made with the given tier
    pub fn calls_for(&self, tier: ModelTier) -> usize {
        lock(&self.calls).iter().filter(|r| r.tier == tier).count()
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        lock(&self.calls).clone()
    }

    /// Reset the call log
    pub fn reset_call_count(&self) {
        lock(&self.calls).clear();
    }

    fn reply_for(&self, request: &CompletionRequest) -> MockReply {
        let needle_reply = lock(&self.by_needle)
            .iter()
            .find(|(needle, _)| request.prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone());
        if let Some(reply) = needle_reply {
            return reply;
        }

        lock(&self.by_tier)
            .get_mut(&request.tier)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| MockReply::Text(self.default_response.clone()))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("[]")
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    type Error = LlmError;

    async fn generate(&self, request: &CompletionRequest) -> Result<String, Self::Error> {
        lock(&self.calls).push(request.clone());

        match self.reply_for(request) {
            MockReply::Text(text) => Ok(text),
            MockReply::Error => Err(LlmError::Other("Mock error".to_string())),
        }
    }

    fn model_name(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Standard => "mock-standard",
            ModelTier::HighFidelity => "mock-high-fidelity",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(tier: ModelTier, prompt: &str) -> CompletionRequest {
        CompletionRequest::new(tier, "system", prompt)
    }

    #[tokio::test]
    async fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.generate(&request(ModelTier::Standard, "any prompt")).await;
        assert_eq!(result.unwrap(), "Test response");
    }

    #[tokio::test]
    async fn test_mock_provider_needle_wins() {
        let provider = MockProvider::new("default")
            .with_reply_for(ModelTier::Standard, "scripted")
            .with_reply_containing("casino", "needle");

        let reply = provider.generate(&request(ModelTier::Standard, "casino rules")).await;
        assert_eq!(reply.unwrap(), "needle");

        let reply = provider.generate(&request(ModelTier::Standard, "other")).await;
        assert_eq!(reply.unwrap(), "scripted");

        let reply = provider.generate(&request(ModelTier::Standard, "other")).await;
        assert_eq!(reply.unwrap(), "default");
    }

    #[tokio::test]
    async fn test_mock_provider_tier_queues_are_separate() {
        let provider = MockProvider::new("default")
            .with_reply_for(ModelTier::HighFidelity, "refined");

        let standard = provider.generate(&request(ModelTier::Standard, "p")).await.unwrap();
        let high = provider.generate(&request(ModelTier::HighFidelity, "p")).await.unwrap();

        assert_eq!(standard, "default");
        assert_eq!(high, "refined");
        assert_eq!(provider.calls_for(ModelTier::Standard), 1);
        assert_eq!(provider.calls_for(ModelTier::HighFidelity), 1);
    }

    #[tokio::test]
    async fn test_mock_provider_error() {
        let provider = MockProvider::default()
            .with_error_containing("bad prompt")
            .with_error_for(ModelTier::HighFidelity);

        let result = provider.generate(&request(ModelTier::Standard, "a bad prompt")).await;
        assert!(matches!(result.unwrap_err(), LlmError::Other(_)));

        let result = provider.generate(&request(ModelTier::HighFidelity, "fine")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_mock_provider_clone_shares_log() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.generate(&request(ModelTier::Standard, "test")).await.unwrap();

        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);

        provider2.reset_call_count();
        assert_eq!(provider1.call_count(), 0);
    }
}
