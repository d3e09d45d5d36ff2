//! Metrics collection for job execution

use ruleforge_domain::{EventType, JobState};
use serde::Serialize;
use std::collections::HashMap;

/// Counters collected by the orchestrator
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobMetrics {
    /// Jobs accepted into the queue
    pub submitted: usize,

    /// Submissions turned away (full queue, shutdown)
    pub rejected: usize,

    /// Jobs that reached `succeeded`
    pub succeeded: usize,

    /// Jobs that reached `failed`
    pub failed: usize,

    /// Findings produced by succeeded jobs
    pub findings: usize,

    /// Webhook deliveries answered with 2xx, per event type
    pub webhooks_delivered: HashMap<EventType, usize>,

    /// Webhook deliveries that failed, per event type
    pub webhooks_failed: HashMap<EventType, usize>,
}

impl JobMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_submitted(&mut self) {
        self.submitted += 1;
    }

    pub fn record_rejected(&mut self) {
        self.rejected += 1;
    }

    /// Record a job reaching a terminal state
    pub fn record_finished(&mut self, state: JobState, findings: usize) {
        match state {
            JobState::Succeeded => {
                self.succeeded += 1;
                self.findings += findings;
            }
            JobState::Failed => self.failed += 1,
            JobState::Created | JobState::Processing => {}
        }
    }

    /// Record the outcome of one webhook delivery
    pub fn record_webhook(&mut self, event_type: EventType, delivered: bool) {
        let counts = if delivered {
            &mut self.webhooks_delivered
        } else {
            &mut self.webhooks_failed
        };
        *counts.entry(event_type).or_insert(0) += 1;
    }

    /// Jobs accepted but not finished yet
    pub fn in_flight(&self) -> usize {
        self.submitted.saturating_sub(self.succeeded + self.failed)
    }

    pub fn total_webhooks_failed(&self) -> usize {
        self.webhooks_failed.values().sum()
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Job Metrics Summary".to_string(),
            "===================".to_string(),
            format!("Submitted: {}", self.submitted),
            format!("Rejected: {}", self.rejected),
            format!("Succeeded: {}", self.succeeded),
            format!("Failed: {}", self.failed),
            format!("In flight: {}", self.in_flight()),
            format!("Findings: {}", self.findings),
        ];

        if !self.webhooks_failed.is_empty() {
            lines.push(String::new());
            lines.push("Failed webhooks:".to_string());
            for (event, count) in &self.webhooks_failed {
                lines.push(format!("  {}: {}", event, count));
            }
            lines.push(format!("  Total: {}", self.total_webhooks_failed()));
        }

        lines.join("\n")
    }
}
