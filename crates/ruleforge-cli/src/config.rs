//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use ruleforge_extractor::ExtractorConfig;
use ruleforge_llm::LlmSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Largest document accepted, in megabytes
    #[serde(default = "default_max_document_mb")]
    pub max_document_mb: u64,

    /// Chunking and escalation settings
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Model provider settings
    #[serde(default)]
    pub llm: LlmSettings,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".ruleforge").join("config.toml"))
    }

    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing file yields the defaults. Environment overrides are applied
    /// afterwards.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::path()?,
        };

        let mut config = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            toml::from_str(&contents)?
        } else {
            Self::default()
        };

        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply overrides from `lookup`
    ///
    /// Uses the same variables as the server: `OPENAI_API_KEY`,
    /// `MAX_TOKENS_PER_CHUNK`, `OVERLAP_TOKENS` and `MAX_FILE_SIZE_MB`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.llm.api_key = Some(key);
        }
        if let Some(tokens) = parse_var(&lookup, "MAX_TOKENS_PER_CHUNK")? {
            self.extractor.max_tokens_per_chunk = tokens;
        }
        if let Some(tokens) = parse_var(&lookup, "OVERLAP_TOKENS")? {
            self.extractor.overlap_tokens = tokens;
        }
        if let Some(mb) = parse_var(&lookup, "MAX_FILE_SIZE_MB")? {
            self.max_document_mb = mb;
        }
        Ok(())
    }

    /// Save configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| CliError::Config(format!("{} has an invalid value: {}", name, value))),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_document_mb: default_max_document_mb(),
            extractor: ExtractorConfig::default(),
            llm: LlmSettings::default(),
            settings: Settings::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_max_document_mb() -> u64 {
    50
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
