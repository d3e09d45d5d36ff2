//! Error types for job execution

use ruleforge_domain::FetchError;
use ruleforge_extractor::ExtractorError;
use thiserror::Error;

/// Errors that can occur while accepting or running a job
#[derive(Error, Debug)]
pub enum JobError {
    /// Missing or malformed input
    #[error("Validation error: {0}")]
    Validation(String),

    /// The document type cannot be extracted
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    /// The document exceeds the configured size limit
    #[error("File size exceeds the limit of {limit_mb}MB.")]
    ResourceLimit { size: u64, limit_mb: u64 },

    /// The document does not exist at its reference
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Network failure while fetching the document
    #[error("Transport error: {0}")]
    Transport(String),

    /// The document could not be turned into text
    #[error("Unreadable document: {0}")]
    Document(String),

    /// Extraction pipeline failure
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractorError),

    /// No room left in the job queue
    #[error("Job queue is full")]
    QueueFull,

    /// The orchestrator no longer accepts jobs
    #[error("Job orchestrator is shutting down")]
    ShuttingDown,

    /// Filesystem error while staging a document
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid orchestrator configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Worker error (tokio runtime issues)
    #[error("Worker error: {0}")]
    Worker(String),
}

impl JobError {
    /// Whether the caller is at fault
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            JobError::Validation(_)
                | JobError::UnsupportedType(_)
                | JobError::ResourceLimit { .. }
                | JobError::NotFound(_)
                | JobError::Document(_)
        )
    }
}

impl From<FetchError> for JobError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::TooLarge { size, limit_mb } => JobError::ResourceLimit { size, limit_mb },
            FetchError::NotFound(what) => JobError::NotFound(what),
            FetchError::Transport(msg) => JobError::Transport(msg),
            FetchError::Unsupported(what) => JobError::Validation(format!("Unsupported document: {}", what)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_errors_map_to_job_errors() {
        let err: JobError = FetchError::TooLarge { size: 60, limit_mb: 50 }.into();
        assert_eq!(err.to_string(), "File size exceeds the limit of 50MB.");
        assert!(err.is_client_error());

        let err: JobError = FetchError::Transport("connection reset".into()).into();
        assert!(matches!(err, JobError::Transport(_)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_extraction_error_is_server_side() {
        let err: JobError = ExtractorError::Timeout.into();
        assert!(!err.is_client_error());
        assert!(err.to_string().starts_with("Extraction failed"));
    }
}
