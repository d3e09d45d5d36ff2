//! Configuration for job execution
//!
//! Controls document size limits, the worker pool and webhook delivery.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the job orchestrator
///
/// # Examples
///
/// ```
/// use ruleforge_jobs::JobsConfig;
///
/// let config = JobsConfig::default();
/// assert_eq!(config.max_document_mb, 50);
/// assert_eq!(config.max_document_bytes(), 50 * 1024 * 1024);
///
/// let config = JobsConfig::from_toml("worker_count = 2").unwrap();
/// assert_eq!(config.worker_count, 2);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    /// Largest accepted document (megabytes)
    /// Default: 50
    pub max_document_mb: u64,

    /// Jobs executed concurrently
    /// Default: 4
    pub worker_count: usize,

    /// Accepted jobs waiting for a worker; submissions beyond this are rejected
    /// Default: 64
    pub queue_capacity: usize,

    /// Timeout for downloading a document (seconds)
    pub fetch_timeout_secs: u64,

    /// Timeout for a single webhook delivery (seconds)
    pub webhook_timeout_secs: u64,

    /// Directory for staged documents; the system temp dir when unset
    pub staging_dir: Option<PathBuf>,

    /// How long finished jobs stay queryable (seconds)
    pub job_retention_secs: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            max_document_mb: 50,
            worker_count: 4,
            queue_capacity: 64,
            fetch_timeout_secs: 60,
            webhook_timeout_secs: 30,
            staging_dir: None,
            job_retention_secs: 3600,
        }
    }
}

impl JobsConfig {
    /// Size limit in bytes
    pub fn max_document_bytes(&self) -> u64 {
        self.max_document_mb.saturating_mul(1024 * 1024)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook_timeout_secs)
    }

    pub fn job_retention(&self) -> Duration {
        Duration::from_secs(self.job_retention_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_document_mb == 0 {
            return Err("max_document_mb must be greater than 0".to_string());
        }
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".to_string());
        }
        if self.queue_capacity == 0 {
            return Err("queue_capacity must be greater than 0".to_string());
        }
        if self.fetch_timeout_secs == 0 || self.webhook_timeout_secs == 0 {
            return Err("fetch and webhook timeouts must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }
}
