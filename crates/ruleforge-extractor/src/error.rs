//! Error types for the Extractor

use ruleforge_domain::InferenceError;
use thiserror::Error;

/// Errors that can occur during extraction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractorError {
    /// The model could not be reached or rejected the request
    #[error("LLM error: {0}")]
    Inference(String),

    /// Model output is not the expected JSON array of findings
    #[error("Invalid model output: {0}")]
    Parse(String),

    /// Extraction timeout
    #[error("Extraction timeout")]
    Timeout,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<InferenceError> for ExtractorError {
    fn from(e: InferenceError) -> Self {
        match e {
            InferenceError::Parse(msg) => ExtractorError::Parse(msg),
            InferenceError::Provider(msg) => ExtractorError::Inference(msg),
            InferenceError::Timeout => ExtractorError::Timeout,
        }
    }
}

impl From<ExtractorError> for InferenceError {
    fn from(e: ExtractorError) -> Self {
        match e {
            ExtractorError::Parse(msg) => InferenceError::Parse(msg),
            ExtractorError::Timeout => InferenceError::Timeout,
            other => InferenceError::Provider(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::Parse(format!("JSON parse error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inference_error_mapping() {
        let err: ExtractorError = InferenceError::Parse("bad".into()).into();
        assert_eq!(err, ExtractorError::Parse("bad".into()));

        let err: ExtractorError = InferenceError::Timeout.into();
        assert_eq!(err, ExtractorError::Timeout);

        let back: InferenceError = ExtractorError::Config("x".into()).into();
        assert!(matches!(back, InferenceError::Provider(_)));
    }
}
