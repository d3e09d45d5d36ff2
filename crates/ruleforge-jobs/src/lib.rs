//! Ruleforge Jobs
//!
//! Asynchronous extraction jobs with webhook notification.
//!
//! # Overview
//!
//! - **Orchestration**: jobs are accepted immediately and executed by a fixed
//!   pool of workers fed from a bounded queue.
//! - **Fetching**: documents are read from disk or downloaded over HTTP; the
//!   size limit is enforced before any model is called.
//! - **Staging**: fetched bytes live in a scoped temporary file that is
//!   removed before the job reaches a terminal state.
//! - **Notification**: each job sends one `processing` event and one terminal
//!   event (`extracted` or `extraction_failed`) to its webhook.
//!
//! ## Job Lifecycle
//!
//! | State | Event sent | Next |
//! |-------|-----------|------|
//! | **created** | none | processing |
//! | **processing** | `rules.processing.v1` | succeeded, failed |
//! | **succeeded** | `rules.extracted.v1` | none |
//! | **failed** | `rules.extraction.failed.v1` | none |
//!
//! Webhook failures are logged and counted; they never change job state.

pub mod config;
pub mod error;
pub mod metrics;
pub mod notifier;
pub mod orchestrator;
pub mod reader;
pub mod registry;
pub mod staging;

pub use config::JobsConfig;
pub use error::JobError;
pub use metrics::JobMetrics;
pub use notifier::{HttpWebhookNotifier, RecordingNotifier, WebhookNotifier, EVENT_HEADER, JOB_ID_HEADER};
pub use orchestrator::JobOrchestrator;
pub use reader::{DefaultDocumentReader, FileDocumentReader, HttpDocumentReader, InMemoryReader, SizeLimit};
pub use registry::JobRegistry;
pub use staging::{document_text, StagedDocument};
