//! In-memory job registry
//!
//! Every accepted job is published through a `watch` channel. The worker
//! owns the sending half and is the only writer; readers see a consistent
//! snapshot of the job at any time.

use chrono::Utc;
use ruleforge_domain::{Job, JobId};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// Jobs known to the orchestrator, keyed by id
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, watch::Receiver<Job>>>,
    retention: Duration,
}

impl JobRegistry {
    /// Create a registry that forgets finished jobs after `retention`
    pub fn new(retention: Duration) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            retention,
        }
    }

    /// Register a new job and return the sender that updates it
    ///
    /// Registering an id twice keeps the first registration; the returned
    /// sender is then detached from the registry.
    pub fn register(&self, job: Job) -> watch::Sender<Job> {
        self.prune();
        let job_id = job.job_id;
        let (tx, rx) = watch::channel(job);
        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(job_id)
            .or_insert(rx);
        tx
    }

    /// Snapshot of a job
    ///
    /// Finished jobs past the retention period are forgotten first.
    pub fn get(&self, job_id: &JobId) -> Option<Job> {
        self.prune();
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(job_id)
            .map(|rx| rx.borrow().clone())
    }

    /// Wait until a job reaches a terminal state
    ///
    /// Returns `None` for unknown jobs, including finished jobs that were
    /// already pruned.
    pub async fn wait_terminal(&self, job_id: &JobId) -> Option<Job> {
        self.prune();
        let mut rx = self
            .jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(job_id)?
            .clone();

        let finished = rx
            .wait_for(|job| job.state().is_terminal())
            .await
            .map(|job| job.clone());
        // Sender dropped: report the last state we saw
        Some(finished.unwrap_or_else(|_| rx.borrow().clone()))
    }

    /// Forget a job regardless of its state
    pub fn remove(&self, job_id: &JobId) -> bool {
        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(job_id)
            .is_some()
    }

    /// Number of tracked jobs, finished ones included
    pub fn len(&self) -> usize {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no jobs are tracked
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget finished jobs older than the retention period
    pub fn prune(&self) -> usize {
        let retention = chrono::Duration::from_std(self.retention).unwrap_or(chrono::Duration::MAX);
        let now = Utc::now();

        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let before = jobs.len();
        jobs.retain(|_, rx| {
            let job = rx.borrow();
            !(job.state().is_terminal() && now - job.updated_at > retention)
        });
        let removed = before - jobs.len();
        if removed > 0 {
            debug!(removed, "Pruned finished jobs");
        }
        removed
    }
}
