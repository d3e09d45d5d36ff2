//! Provider selection from configuration
//!
//! `LlmSettings` is the `[llm]` table of the service configuration. It is
//! deserialized by the server and CLI and turned into a concrete provider
//! with `build`.

use crate::{LlmError, OllamaProvider, OpenAiProvider};
use async_trait::async_trait;
use ruleforge_domain::{CompletionRequest, LlmProvider, ModelTier};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which backend serves model calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI chat completions API
    #[default]
    OpenAi,
    /// Local Ollama server
    Ollama,
}

/// LLM provider settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Backend to use
    pub provider: ProviderKind,
    /// API key; required for OpenAI
    pub api_key: Option<String>,
    /// Override the provider's base URL
    pub endpoint: Option<String>,
    /// Model serving the standard tier
    pub standard_model: String,
    /// Model serving the high-fidelity tier
    pub high_fidelity_model: String,
    /// Per-request HTTP timeout
    pub request_timeout_secs: u64,
    /// Attempts per request, including the first
    pub max_retries: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            api_key: None,
            endpoint: None,
            standard_model: crate::openai::DEFAULT_STANDARD_MODEL.to_string(),
            high_fidelity_model: crate::openai::DEFAULT_HIGH_FIDELITY_MODEL.to_string(),
            request_timeout_secs: crate::openai::DEFAULT_TIMEOUT_SECS,
            max_retries: crate::openai::DEFAULT_MAX_RETRIES,
        }
    }
}

impl LlmSettings {
    /// Check the settings without building a provider
    pub fn validate(&self) -> Result<(), LlmError> {
        if self.provider == ProviderKind::OpenAi
            && self.api_key.as_deref().map_or(true, |k| k.trim().is_empty())
        {
            return Err(LlmError::Config(
                "OpenAI API key not found; set OPENAI_API_KEY or llm.api_key".to_string(),
            ));
        }
        if self.standard_model.trim().is_empty() || self.high_fidelity_model.trim().is_empty() {
            return Err(LlmError::Config("model names must not be empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(LlmError::Config("request_timeout_secs must be > 0".to_string()));
        }
        Ok(())
    }

    /// Build the configured provider
    pub fn build(&self) -> Result<ConfiguredProvider, LlmError> {
        self.validate()?;

        match self.provider {
            ProviderKind::OpenAi => {
                let key = self.api_key.clone().unwrap_or_default();
                let mut provider =
                    OpenAiProvider::with_timeout(key, Duration::from_secs(self.request_timeout_secs))?
                        .with_models(&self.standard_model, &self.high_fidelity_model)
                        .with_max_retries(self.max_retries);
                if let Some(endpoint) = &self.endpoint {
                    provider = provider.with_endpoint(endpoint);
                }
                Ok(ConfiguredProvider::OpenAi(provider))
            }
            ProviderKind::Ollama => {
                let endpoint = self
                    .endpoint
                    .clone()
                    .unwrap_or_else(|| crate::ollama::DEFAULT_ENDPOINT.to_string());
                let provider =
                    OllamaProvider::new(endpoint, &self.standard_model, &self.high_fidelity_model)
                        .with_max_retries(self.max_retries);
                Ok(ConfiguredProvider::Ollama(provider))
            }
        }
    }
}

/// A provider chosen at runtime from `LlmSettings`
pub enum ConfiguredProvider {
    /// OpenAI backend
    OpenAi(OpenAiProvider),
    /// Ollama backend
    Ollama(OllamaProvider),
}

#[async_trait]
impl LlmProvider for ConfiguredProvider {
    type Error = LlmError;

    async fn generate(&self, request: &CompletionRequest) -> Result<String, Self::Error> {
        match self {
            ConfiguredProvider::OpenAi(p) => p.generate(request).await,
            ConfiguredProvider::Ollama(p) => p.generate(request).await,
        }
    }

    fn model_name(&self, tier: ModelTier) -> &str {
        match self {
            ConfiguredProvider::OpenAi(p) => p.model_name(tier),
            ConfiguredProvider::Ollama(p) => p.model_name(tier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = LlmSettings::default();
        assert_eq!(settings.provider, ProviderKind::OpenAi);
        assert_eq!(settings.standard_model, "gpt-5-mini");
        assert_eq!(settings.high_fidelity_model, "gpt-5");
    }

    #[test]
    fn test_openai_requires_key() {
        let settings = LlmSettings::default();
        assert!(matches!(settings.build(), Err(LlmError::Config(_))));

        let settings = LlmSettings {
            api_key: Some("   ".to_string()),
            ..LlmSettings::default()
        };
        assert!(matches!(settings.build(), Err(LlmError::Config(_))));
    }

    #[test]
    fn test_build_openai() {
        let settings = LlmSettings {
            api_key: Some("sk-test".to_string()),
            ..LlmSettings::default()
        };
        let provider = settings.build().unwrap();
        assert!(matches!(provider, ConfiguredProvider::OpenAi(_)));
        assert_eq!(provider.model_name(ModelTier::HighFidelity), "gpt-5");
    }

    #[test]
    fn test_build_ollama_without_key() {
        let settings = LlmSettings {
            provider: ProviderKind::Ollama,
            standard_model: "llama3.1:8b".to_string(),
            ..LlmSettings::default()
        };
        let provider = settings.build().unwrap();
        assert!(matches!(provider, ConfiguredProvider::Ollama(_)));
        assert_eq!(provider.model_name(ModelTier::Standard), "llama3.1:8b");
    }

    #[test]
    fn test_deserialize_partial_table() {
        let settings: LlmSettings =
            serde_json::from_str(r#"{"provider": "ollama", "max_retries": 5}"#).unwrap();
        assert_eq!(settings.provider, ProviderKind::Ollama);
        assert_eq!(settings.max_retries, 5);
        assert_eq!(settings.standard_model, "gpt-5-mini");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let settings = LlmSettings {
            provider: ProviderKind::Ollama,
            request_timeout_secs: 0,
            ..LlmSettings::default()
        };
        assert!(settings.validate().is_err());
    }
}
