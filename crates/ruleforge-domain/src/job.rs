//! Job module - lifecycle of one asynchronous extraction request
//!
//! Jobs move strictly `Created → Processing → Succeeded | Failed`.
//! Terminal states are final: every further transition is rejected and the
//! payload (findings or error) can no longer change.

use crate::document::DocumentRef;
use crate::finding::Finding;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Unique identifier for a job (UUIDv7, chronologically sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(uuid::Uuid);

impl JobId {
    /// Generate a new job identifier
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Parse a job identifier from its string form
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid job id: {}", e))
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Accepted, not yet picked up by a worker
    Created,
    /// A worker is fetching, chunking or extracting
    Processing,
    /// Finished with a finding list
    Succeeded,
    /// Finished with an error description
    Failed,
}

impl JobState {
    /// Get the state name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Created => "created",
            JobState::Processing => "processing",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
        }
    }

    /// True for `Succeeded` and `Failed`
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }

    /// Whether the lifecycle permits moving from `self` to `next`
    pub fn can_transition_to(&self, next: JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Created, JobState::Processing)
                | (JobState::Processing, JobState::Succeeded)
                | (JobState::Processing, JobState::Failed)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected job state transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid job transition {from} -> {to}")]
pub struct TransitionError {
    /// State the job was in
    pub from: JobState,
    /// State that was requested
    pub to: JobState,
}

/// One extraction request and its outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Identifier
    pub job_id: JobId,

    /// Document being processed
    pub document: DocumentRef,

    /// Endpoint notified of state transitions
    pub webhook_url: Option<String>,

    state: JobState,
    history: Vec<JobState>,
    findings: Option<Vec<Finding>>,
    error: Option<String>,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Time of the last transition
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a job in the `Created` state
    pub fn new(document: DocumentRef, webhook_url: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            job_id: JobId::new(),
            document,
            webhook_url,
            state: JobState::Created,
            history: vec![JobState::Created],
            findings: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Current state
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Every state the job has been in, oldest first
    pub fn history(&self) -> &[JobState] {
        &self.history
    }

    /// Findings of a succeeded job
    pub fn findings(&self) -> Option<&[Finding]> {
        self.findings.as_deref()
    }

    /// Error description of a failed job
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// `Created → Processing`
    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.transition(JobState::Processing)
    }

    /// `Processing → Succeeded`, recording the findings
    pub fn succeed(&mut self, findings: Vec<Finding>) -> Result<(), TransitionError> {
        self.transition(JobState::Succeeded)?;
        self.findings = Some(findings);
        Ok(())
    }

    /// `Processing → Failed`, recording the error description
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), TransitionError> {
        self.transition(JobState::Failed)?;
        self.error = Some(error.into());
        Ok(())
    }

    fn transition(&mut self, next: JobState) -> Result<(), TransitionError> {
        if !self.state.can_transition_to(next) {
            return Err(TransitionError {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        self.history.push(next);
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn job() -> Job {
        Job::new(DocumentRef::Path(PathBuf::from("rules.pdf")), None)
    }

    #[test]
    fn test_success_path() {
        let mut job = job();
        assert_eq!(job.state(), JobState::Created);
        job.start().unwrap();
        job.succeed(Vec::new()).unwrap();

        assert_eq!(
            job.history(),
            &[JobState::Created, JobState::Processing, JobState::Succeeded]
        );
        assert_eq!(job.findings().map(|f| f.len()), Some(0));
        assert!(job.error().is_none());
    }

    #[test]
    fn test_failure_path() {
        let mut job = job();
        job.start().unwrap();
        job.fail("File size exceeds the limit of 50MB.").unwrap();

        assert_eq!(
            job.history(),
            &[JobState::Created, JobState::Processing, JobState::Failed]
        );
        assert_eq!(job.error(), Some("File size exceeds the limit of 50MB."));
        assert!(job.findings().is_none());
    }

    #[test]
    fn test_cannot_skip_processing() {
        let mut job = job();
        let err = job.succeed(Vec::new()).unwrap_err();
        assert_eq!(err.from, JobState::Created);
        assert_eq!(err.to, JobState::Succeeded);
        assert_eq!(job.state(), JobState::Created);
    }

    #[test]
    fn test_terminal_state_is_final() {
        let mut job = job();
        job.start().unwrap();
        job.succeed(Vec::new()).unwrap();

        assert!(job.start().is_err());
        assert!(job.fail("late error").is_err());
        assert!(job.succeed(Vec::new()).is_err());
        assert!(job.error().is_none());
        assert_eq!(job.history().len(), 3);
    }

    #[test]
    fn test_transition_table() {
        use JobState::*;
        let all = [Created, Processing, Succeeded, Failed];
        for from in all {
            for to in all {
                let allowed = from.can_transition_to(to);
                let expected = matches!(
                    (from, to),
                    (Created, Processing) | (Processing, Succeeded) | (Processing, Failed)
                );
                assert_eq!(allowed, expected, "{} -> {}", from, to);
            }
        }
    }

    #[test]
    fn test_job_id_round_trip() {
        let id = JobId::new();
        assert_eq!(JobId::from_string(&id.to_string()).unwrap(), id);
    }
}
