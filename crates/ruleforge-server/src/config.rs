//! Configuration file parsing for the server.
//!
//! Loads settings from a TOML file, then applies environment overrides.

use ruleforge_extractor::ExtractorConfig;
use ruleforge_jobs::JobsConfig;
use ruleforge_llm::LlmSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// An environment override could not be parsed
    #[error("Invalid value for {name}: '{value}'")]
    InvalidOverride { name: String, value: String },

    /// A section failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Server configuration loaded from TOML
///
/// ```toml
/// bind_address = "0.0.0.0"
/// bind_port = 8000
///
/// [extractor]
/// max_tokens_per_chunk = 1500
///
/// [jobs]
/// max_document_mb = 50
///
/// [llm]
/// provider = "openai"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port (e.g., 8000)
    pub bind_port: u16,

    /// Chunking and escalation settings
    pub extractor: ExtractorConfig,

    /// Job execution settings
    pub jobs: JobsConfig,

    /// Language model provider
    pub llm: LlmSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8000,
            extractor: ExtractorConfig::default(),
            jobs: JobsConfig::default(),
            llm: LlmSettings::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`
    ///
    /// Recognized variables: `MAX_FILE_SIZE_MB`, `MAX_TOKENS_PER_CHUNK`,
    /// `OVERLAP_TOKENS`, `OPENAI_API_KEY`, `RULEFORGE_BIND_ADDRESS`,
    /// `RULEFORGE_PORT`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mb) = parse_var(&lookup, "MAX_FILE_SIZE_MB")? {
            self.jobs.max_document_mb = mb;
        }
        if let Some(tokens) = parse_var(&lookup, "MAX_TOKENS_PER_CHUNK")? {
            self.extractor.max_tokens_per_chunk = tokens;
        }
        if let Some(tokens) = parse_var(&lookup, "OVERLAP_TOKENS")? {
            self.extractor.overlap_tokens = tokens;
        }
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.llm.api_key = Some(key);
        }
        if let Some(address) = lookup("RULEFORGE_BIND_ADDRESS") {
            self.bind_address = address;
        }
        if let Some(port) = parse_var(&lookup, "RULEFORGE_PORT")? {
            self.bind_port = port;
        }
        Ok(())
    }

    /// Validate every section
    ///
    /// A missing API key for a remote provider is reported here, so the
    /// server refuses to start rather than failing on the first request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.extractor.validate().map_err(ConfigError::Invalid)?;
        self.jobs.validate().map_err(ConfigError::Invalid)?;
        self.llm
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidOverride {
                name: name.to_string(),
                value,
            }),
    }
}
