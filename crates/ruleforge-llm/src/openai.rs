//! OpenAI Provider Implementation
//!
//! Calls the chat completions API. The standard and high-fidelity tiers map
//! to two model names (by default `gpt-5-mini` and `gpt-5`).
//!
//! Transient failures (transport errors, HTTP 429 and 5xx) are retried with
//! exponential backoff; other HTTP errors fail immediately.

use crate::LlmError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use ruleforge_domain::{CompletionRequest, LlmProvider, ModelTier};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default OpenAI API base URL
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// Default model for the standard tier
pub const DEFAULT_STANDARD_MODEL: &str = "gpt-5-mini";

/// Default model for the high-fidelity tier
pub const DEFAULT_HIGH_FIDELITY_MODEL: &str = "gpt-5";

/// Default timeout for LLM requests (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default number of attempts per request
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// OpenAI chat completions provider
pub struct OpenAiProvider {
    endpoint: String,
    api_key: String,
    standard_model: String,
    high_fidelity_model: String,
    client: reqwest::Client,
    max_retries: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_completion_tokens: u32,
    n: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a provider with the default endpoint and models
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Config` if the API key is blank or the HTTP client
    /// cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_timeout(api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a provider with a custom request timeout
    pub fn with_timeout(api_key: impl Into<String>, timeout: Duration) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::Config("OpenAI API key is empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.trim().to_string(),
            standard_model: DEFAULT_STANDARD_MODEL.to_string(),
            high_fidelity_model: DEFAULT_HIGH_FIDELITY_MODEL.to_string(),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Use a different API base URL (e.g. a proxy or compatible server)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the models serving each tier
    pub fn with_models(mut self, standard: impl Into<String>, high_fidelity: impl Into<String>) -> Self {
        self.standard_model = standard.into();
        self.high_fidelity_model = high_fidelity.into();
        self
    }

    /// Set the maximum number of attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    fn headers(&self) -> Result<HeaderMap, LlmError> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", self.api_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| LlmError::Config("API key contains invalid characters".to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn send_once(&self, body: &ChatRequest<'_>) -> Result<String, Attempt> {
        let url = format!("{}/chat/completions", self.endpoint);
        let headers = self.headers().map_err(Attempt::Fatal)?;

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| Attempt::Retry(LlmError::Communication(format!("Request failed: {}", e))))?;

        let status = response.status();
        if status.is_success() {
            let parsed: ChatResponse = response.json().await.map_err(|e| {
                Attempt::Fatal(LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))
            })?;
            return Ok(parsed
                .choices
                .into_iter()
                .find_map(|choice| choice.message.content)
                .unwrap_or_default());
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "<body unavailable>".to_string());
        match status {
            StatusCode::TOO_MANY_REQUESTS => Err(Attempt::Retry(LlmError::RateLimitExceeded)),
            StatusCode::NOT_FOUND => Err(Attempt::Fatal(LlmError::ModelNotAvailable(
                body.model.to_string(),
            ))),
            s if s.is_server_error() => Err(Attempt::Retry(LlmError::Communication(format!(
                "HTTP {}: {}",
                s, error_text
            )))),
            s => Err(Attempt::Fatal(LlmError::Communication(format!(
                "HTTP {}: {}",
                s, error_text
            )))),
        }
    }
}

enum Attempt {
    Retry(LlmError),
    Fatal(LlmError),
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    type Error = LlmError;

    async fn generate(&self, request: &CompletionRequest) -> Result<String, Self::Error> {
        let model = self.model_name(request.tier);
        let body = ChatRequest {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            max_completion_tokens: request.max_tokens,
            n: 1,
        };

        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self.send_once(&body).await {
                Ok(text) => {
                    debug!(model, chars = text.len(), "OpenAI completion received");
                    return Ok(text);
                }
                Err(Attempt::Fatal(e)) => return Err(e),
                Err(Attempt::Retry(e)) => {
                    warn!(model, attempt = attempts + 1, "OpenAI call failed: {}", e);
                    last_error = Some(e);
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                // Exponential backoff: 1s, 2s, 4s, etc.
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            LlmError::Communication("Max retries exceeded".to_string())
        }))
    }

    fn model_name(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Standard => &self.standard_model,
            ModelTier::HighFidelity => &self.high_fidelity_model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    async fn spawn_stub(reply: Value) -> String {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move |Json(_body): Json<Value>| {
                let reply = reply.clone();
                async move { Json(reply) }
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1", addr)
    }

    #[test]
    fn test_provider_creation() {
        let provider = OpenAiProvider::new("sk-test").unwrap();
        assert_eq!(provider.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(provider.model_name(ModelTier::Standard), DEFAULT_STANDARD_MODEL);
        assert_eq!(provider.model_name(ModelTier::HighFidelity), DEFAULT_HIGH_FIDELITY_MODEL);
        assert_eq!(provider.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_blank_key_rejected() {
        assert!(matches!(OpenAiProvider::new("  "), Err(LlmError::Config(_))));
    }

    #[test]
    fn test_builder_overrides() {
        let provider = OpenAiProvider::new("sk-test")
            .unwrap()
            .with_endpoint("http://proxy.local/v1/")
            .with_models("small", "large")
            .with_max_retries(0);
        assert_eq!(provider.endpoint, "http://proxy.local/v1");
        assert_eq!(provider.model_name(ModelTier::HighFidelity), "large");
        assert_eq!(provider.max_retries, 1);
    }

    #[tokio::test]
    async fn test_generate_against_stub() {
        let endpoint = spawn_stub(json!({
            "choices": [{"message": {"role": "assistant", "content": "[]"}}]
        }))
        .await;
        let provider = OpenAiProvider::new("sk-test")
            .unwrap()
            .with_endpoint(endpoint)
            .with_max_retries(1);

        let request = CompletionRequest::new(ModelTier::Standard, "system", "prompt");
        let text = provider.generate(&request).await.unwrap();
        assert_eq!(text, "[]");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let provider = OpenAiProvider::new("sk-test")
            .unwrap()
            .with_endpoint("http://127.0.0.1:9")
            .with_max_retries(1);

        let request = CompletionRequest::new(ModelTier::Standard, "system", "prompt");
        let result = provider.generate(&request).await;
        assert!(matches!(result, Err(LlmError::Communication(_))));
    }
}
