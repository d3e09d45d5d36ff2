//! Prompt-based `Extractor` backed by an LLM provider

use crate::error::ExtractorError;
use crate::parser::parse_llm_response;
use crate::prompt::{PromptBuilder, EXTRACTION_SYSTEM_PROMPT};
use async_trait::async_trait;
use ruleforge_domain::{
    CompletionRequest, Extractor, InferenceError, LlmProvider, ModelTier, RawFinding,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Output budget for a single extraction call
const MAX_COMPLETION_TOKENS: u32 = 4000;

/// Extracts raw findings by prompting an LLM and parsing its JSON answer
pub struct PromptedExtractor<L> {
    llm: Arc<L>,
    timeout: Duration,
}

impl<L> PromptedExtractor<L>
where
    L: LlmProvider,
{
    /// Create an extractor with a per-call timeout
    pub fn new(llm: L, timeout: Duration) -> Self {
        Self::from_shared(Arc::new(llm), timeout)
    }

    /// Create an extractor sharing a provider with other components
    pub fn from_shared(llm: Arc<L>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// The underlying provider
    pub fn provider(&self) -> &Arc<L> {
        &self.llm
    }

    async fn call_llm(&self, tier: ModelTier, prompt: String) -> Result<String, ExtractorError> {
        let request = CompletionRequest::new(tier, EXTRACTION_SYSTEM_PROMPT, prompt)
            .with_max_tokens(MAX_COMPLETION_TOKENS);

        timeout(self.timeout, self.llm.generate(&request))
            .await
            .map_err(|_| ExtractorError::Timeout)?
            .map_err(|e| ExtractorError::Inference(e.to_string()))
    }
}

#[async_trait]
impl<L> Extractor for PromptedExtractor<L>
where
    L: LlmProvider + 'static,
{
    async fn infer(
        &self,
        tier: ModelTier,
        text: &str,
        section_hint: &str,
    ) -> Result<Vec<RawFinding>, InferenceError> {
        let prompt = PromptBuilder::new(text).with_section(section_hint).build();
        debug!(
            model = self.llm.model_name(tier),
            prompt_chars = prompt.len(),
            "Calling extraction model"
        );

        let response = self.call_llm(tier, prompt).await?;
        debug!(response_chars = response.len(), "Extraction model answered");

        Ok(parse_llm_response(&response)?)
    }
}
