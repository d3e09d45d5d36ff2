//! Webhook events emitted on job state transitions

use crate::finding::Finding;
use crate::job::{Job, JobId, JobState};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Message carried by the `processing` event
pub const PROCESSING_MESSAGE: &str = "Job received and processing started";

/// Kind of job event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// The job entered `Processing`
    Processing,
    /// The job succeeded
    Extracted,
    /// The job failed
    ExtractionFailed,
}

impl EventType {
    /// Short event name
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Processing => "processing",
            EventType::Extracted => "extracted",
            EventType::ExtractionFailed => "extraction_failed",
        }
    }

    /// Versioned name sent in the `X-Event` header
    pub fn header_value(&self) -> &'static str {
        match self {
            EventType::Processing => "rules.processing.v1",
            EventType::Extracted => "rules.extracted.v1",
            EventType::ExtractionFailed => "rules.extraction.failed.v1",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification of one job state transition
///
/// Events are ephemeral: built from a job snapshot, delivered at most once,
/// never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Kind of event
    pub event_type: EventType,
    /// Job the event belongs to
    pub job_id: JobId,
    /// JSON body delivered to the endpoint
    pub payload: Value,
}

impl WebhookEvent {
    /// `{job_id, status: "processing", message}`
    pub fn processing(job_id: JobId) -> Self {
        Self {
            event_type: EventType::Processing,
            job_id,
            payload: json!({
                "job_id": job_id,
                "status": "processing",
                "message": PROCESSING_MESSAGE,
            }),
        }
    }

    /// `{job_id, status: "success", rules}`
    pub fn extracted(job_id: JobId, findings: &[Finding]) -> Self {
        Self {
            event_type: EventType::Extracted,
            job_id,
            payload: json!({
                "job_id": job_id,
                "status": "success",
                "rules": findings,
            }),
        }
    }

    /// `{job_id, status: "failure", error}`
    pub fn extraction_failed(job_id: JobId, error: &str) -> Self {
        Self {
            event_type: EventType::ExtractionFailed,
            job_id,
            payload: json!({
                "job_id": job_id,
                "status": "failure",
                "error": error,
            }),
        }
    }

    /// Event describing the job's current state, if that state is announced
    ///
    /// `Created` has no event.
    pub fn for_job(job: &Job) -> Option<Self> {
        match job.state() {
            JobState::Created => None,
            JobState::Processing => Some(Self::processing(job.job_id)),
            JobState::Succeeded => Some(Self::extracted(
                job.job_id,
                job.findings().unwrap_or_default(),
            )),
            JobState::Failed => Some(Self::extraction_failed(
                job.job_id,
                job.error().unwrap_or_default(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentRef;

    #[test]
    fn test_processing_payload() {
        let id = JobId::new();
        let event = WebhookEvent::processing(id);
        assert_eq!(event.event_type, EventType::Processing);
        assert_eq!(event.payload["status"], "processing");
        assert_eq!(event.payload["job_id"], id.to_string());
        assert_eq!(event.payload["message"], PROCESSING_MESSAGE);
    }

    #[test]
    fn test_failure_payload() {
        let id = JobId::new();
        let event = WebhookEvent::extraction_failed(id, "boom");
        assert_eq!(event.payload["status"], "failure");
        assert_eq!(event.payload["error"], "boom");
        assert_eq!(event.event_type.header_value(), "rules.extraction.failed.v1");
    }

    #[test]
    fn test_for_job_follows_state() {
        let mut job = Job::new(DocumentRef::Url("https://x.test/a.pdf".into()), None);
        assert!(WebhookEvent::for_job(&job).is_none());

        job.start().unwrap();
        let event = WebhookEvent::for_job(&job).unwrap();
        assert_eq!(event.event_type, EventType::Processing);

        job.succeed(Vec::new()).unwrap();
        let event = WebhookEvent::for_job(&job).unwrap();
        assert_eq!(event.event_type, EventType::Extracted);
        assert_eq!(event.payload["status"], "success");
        assert!(event.payload["rules"].as_array().unwrap().is_empty());
    }
}
