//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Model provider could not be created
    #[error("LLM error: {0}")]
    Llm(#[from] ruleforge_llm::LlmError),

    /// Extraction failed
    #[error("{0}")]
    Extraction(#[from] ruleforge_extractor::ExtractorError),

    /// The document could not be read
    #[error("{0}")]
    Document(#[from] ruleforge_jobs::JobError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
