//! Asynchronous extraction jobs
//!
//! [`JobOrchestrator::submit`] validates a request, registers a job and
//! queues it; it never waits for extraction. A fixed pool of workers drains
//! the bounded queue. Each job moves `created -> processing -> succeeded |
//! failed` and emits exactly one `processing` event followed by exactly one
//! terminal event to its webhook.

use crate::config::JobsConfig;
use crate::error::JobError;
use crate::metrics::JobMetrics;
use crate::notifier::WebhookNotifier;
use crate::reader::SizeLimit;
use crate::registry::JobRegistry;
use crate::staging;
use ruleforge_domain::document::is_http_url;
use ruleforge_domain::{
    DocumentKind, DocumentReader, DocumentRef, FetchedDocument, Finding, Job, JobId, WebhookEvent,
};
use ruleforge_extractor::RulePipeline;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

struct QueuedJob {
    job: Job,
    updates: watch::Sender<Job>,
}

/// Accepts extraction jobs and runs them on a bounded worker pool
///
/// # Examples
///
/// ```no_run
/// use ruleforge_domain::DocumentRef;
/// use ruleforge_extractor::{ExtractorConfig, KeywordClassifier, PromptedExtractor, RulePipeline};
/// use ruleforge_jobs::{DefaultDocumentReader, HttpWebhookNotifier, JobOrchestrator, JobsConfig, SizeLimit};
/// use ruleforge_llm::OpenAiProvider;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = JobsConfig::default();
///     let extractor_config = ExtractorConfig::default();
///     let llm = OpenAiProvider::new(std::env::var("OPENAI_API_KEY")?)?;
///     let pipeline = RulePipeline::new(
///         &extractor_config,
///         Arc::new(PromptedExtractor::new(llm, extractor_config.inference_timeout())),
///         Arc::new(KeywordClassifier),
///     )?;
///
///     let orchestrator = JobOrchestrator::start(
///         config.clone(),
///         Arc::new(DefaultDocumentReader::new(SizeLimit::megabytes(config.max_document_mb), config.fetch_timeout())?),
///         Arc::new(pipeline),
///         Arc::new(HttpWebhookNotifier::new(config.webhook_timeout())?),
///     )?;
///
///     let job_id = orchestrator.submit(
///         DocumentRef::parse("https://example.com/house-rules.pdf"),
///         Some("https://example.com/webhook".to_string()),
///     )?;
///     let job = orchestrator.wait(&job_id).await;
///     println!("{:?}", job.map(|j| j.state()));
///
///     orchestrator.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct JobOrchestrator {
    shared: Arc<Shared>,
    queue: Mutex<Option<mpsc::Sender<QueuedJob>>>,
    workers: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
}

struct Shared {
    reader: Arc<dyn DocumentReader>,
    pipeline: Arc<RulePipeline>,
    notifier: Arc<dyn WebhookNotifier>,
    registry: JobRegistry,
    metrics: Mutex<JobMetrics>,
    config: JobsConfig,
}

impl JobOrchestrator {
    /// Validate the configuration and spawn the worker pool
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        config: JobsConfig,
        reader: Arc<dyn DocumentReader>,
        pipeline: Arc<RulePipeline>,
        notifier: Arc<dyn WebhookNotifier>,
    ) -> Result<Self, JobError> {
        config.validate().map_err(JobError::Config)?;
        if let Some(dir) = &config.staging_dir {
            std::fs::create_dir_all(dir)?;
        }

        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let shared = Arc::new(Shared {
            reader,
            pipeline,
            notifier,
            registry: JobRegistry::new(config.job_retention()),
            metrics: Mutex::new(JobMetrics::new()),
            config,
        });

        let workers = (0..shared.config.worker_count)
            .map(|worker| tokio::spawn(worker_loop(worker, Arc::clone(&shared), Arc::clone(&rx))))
            .collect();

        info!(
            workers = shared.config.worker_count,
            queue_capacity = shared.config.queue_capacity,
            "Job orchestrator started"
        );

        Ok(Self {
            shared,
            queue: Mutex::new(Some(tx)),
            workers: tokio::sync::Mutex::new(workers),
        })
    }

    /// Accept a job and return its id without waiting for extraction
    ///
    /// # Errors
    ///
    /// - `Validation` for a malformed document reference or webhook URL
    /// - `UnsupportedType` for a local path with an unknown extension
    /// - `QueueFull` when the queue is at capacity
    /// - `ShuttingDown` after [`shutdown`](Self::shutdown)
    pub fn submit(&self, document: DocumentRef, webhook_url: Option<String>) -> Result<JobId, JobError> {
        validate_document(&document)?;
        if let Some(url) = webhook_url.as_deref() {
            if !is_http_url(url) {
                return Err(JobError::Validation(format!(
                    "webhook_url must be an http(s) URL, got '{}'",
                    url
                )));
            }
        }

        let Some(sender) = self.queue.lock().unwrap_or_else(PoisonError::into_inner).clone() else {
            self.shared.metrics().record_rejected();
            return Err(JobError::ShuttingDown);
        };

        let job = Job::new(document, webhook_url);
        let job_id = job.job_id;
        let updates = self.shared.registry.register(job.clone());

        match sender.try_send(QueuedJob { job, updates }) {
            Ok(()) => {
                self.shared.metrics().record_submitted();
                info!(job_id = %job_id, "Job accepted");
                Ok(job_id)
            }
            Err(e) => {
                self.shared.registry.remove(&job_id);
                self.shared.metrics().record_rejected();
                match e {
                    TrySendError::Full(_) => {
                        warn!(job_id = %job_id, "Job queue is full, rejecting");
                        Err(JobError::QueueFull)
                    }
                    TrySendError::Closed(_) => Err(JobError::ShuttingDown),
                }
            }
        }
    }

    /// Extract a document and wait for the findings, without creating a job
    pub async fn extract_now(&self, document: &DocumentRef) -> Result<Vec<Finding>, JobError> {
        validate_document(document)?;
        self.shared.extract(document).await
    }

    /// Extract an uploaded document held in memory
    pub async fn extract_upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<Vec<Finding>, JobError> {
        let upload = DocumentRef::Path(PathBuf::from(file_name));
        validate_document(&upload)?;

        let fetched = FetchedDocument {
            file_name: upload.file_name(),
            bytes,
        };
        self.shared.extract_fetched(fetched, &upload.source_id()).await
    }

    /// Current snapshot of a job
    pub fn status(&self, job_id: &JobId) -> Option<Job> {
        self.shared.registry.get(job_id)
    }

    /// Wait for a job to finish
    pub async fn wait(&self, job_id: &JobId) -> Option<Job> {
        self.shared.registry.wait_terminal(job_id).await
    }

    /// Snapshot of the job counters
    pub fn metrics(&self) -> JobMetrics {
        self.shared.metrics().clone()
    }

    /// Configuration the orchestrator was started with
    pub fn config(&self) -> &JobsConfig {
        &self.shared.config
    }

    /// Stop accepting jobs and wait for queued jobs to finish
    pub async fn shutdown(&self) {
        let sender = self.queue.lock().unwrap_or_else(PoisonError::into_inner).take();
        if sender.is_none() {
            return;
        }
        drop(sender);

        let workers = std::mem::take(&mut *self.workers.lock().await);
        info!(workers = workers.len(), "Draining job queue");
        for handle in workers {
            if let Err(e) = handle.await {
                error!("Job worker failed: {}", e);
            }
        }

        info!("Job orchestrator stopped. Final metrics:\n{}", self.metrics().summary());
    }
}

/// Reject references that can never be extracted
fn validate_document(document: &DocumentRef) -> Result<(), JobError> {
    match document {
        DocumentRef::Url(url) if !is_http_url(url) => {
            return Err(JobError::Validation(format!("file_url must be an http(s) URL, got '{}'", url)));
        }
        DocumentRef::Path(path) if path.as_os_str().is_empty() => {
            return Err(JobError::Validation("Document reference is empty".to_string()));
        }
        _ => {}
    }

    // URLs are sniffed after download; local files must name their type
    if let DocumentRef::Path(path) = document {
        match document.extension() {
            Some(ext) if DocumentKind::from_extension(&ext).is_some() => {}
            Some(ext) => return Err(JobError::UnsupportedType(format!(".{}", ext))),
            None => return Err(JobError::UnsupportedType(path.display().to_string())),
        }
    }
    Ok(())
}

async fn worker_loop(worker: usize, shared: Arc<Shared>, queue: Arc<tokio::sync::Mutex<mpsc::Receiver<QueuedJob>>>) {
    debug!(worker, "Job worker started");
    loop {
        let next = queue.lock().await.recv().await;
        let Some(queued) = next else { break };
        shared.run_job(queued).await;
    }
    debug!(worker, "Job worker stopped");
}

impl Shared {
    fn metrics(&self) -> MutexGuard<'_, JobMetrics> {
        self.metrics.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run_job(self: &Arc<Self>, queued: QueuedJob) {
        let QueuedJob { mut job, updates } = queued;
        let job_id = job.job_id;

        if let Err(e) = job.start() {
            error!(job_id = %job_id, "Cannot start job: {}", e);
            return;
        }
        updates.send_replace(job.clone());
        info!(job_id = %job_id, document = %job.document, "Job processing");

        // A slow receiver must not delay extraction
        let processing = {
            let shared = Arc::clone(self);
            let snapshot = job.clone();
            tokio::spawn(async move { shared.announce(&snapshot).await })
        };

        // A panic during extraction must still end the job
        let task = {
            let shared = Arc::clone(self);
            let document = job.document.clone();
            tokio::spawn(async move { shared.extract(&document).await })
        };
        let outcome = task
            .await
            .unwrap_or_else(|e| Err(JobError::Worker(format!("Extraction task failed: {}", e))));

        let transition = match outcome {
            Ok(findings) => {
                info!(job_id = %job_id, findings = findings.len(), "Job succeeded");
                job.succeed(findings)
            }
            Err(e) => {
                error!(job_id = %job_id, "Job failed: {}", e);
                job.fail(e.to_string())
            }
        };
        if let Err(e) = transition {
            error!(job_id = %job_id, "Cannot finish job: {}", e);
            return;
        }

        updates.send_replace(job.clone());
        self.metrics()
            .record_finished(job.state(), job.findings().map_or(0, |f| f.len()));

        // The terminal event always follows the processing event
        if let Err(e) = processing.await {
            warn!(job_id = %job_id, "Processing notification task failed: {}", e);
        }
        self.announce(&job).await;
    }

    async fn announce(&self, job: &Job) {
        let (Some(url), Some(event)) = (job.webhook_url.as_deref(), WebhookEvent::for_job(job)) else {
            return;
        };
        let delivered = self.notifier.notify(url, &event).await;
        self.metrics().record_webhook(event.event_type, delivered);
    }

    async fn extract(&self, document: &DocumentRef) -> Result<Vec<Finding>, JobError> {
        let fetched = self.reader.fetch(document).await?;
        self.extract_fetched(fetched, &document.source_id()).await
    }

    async fn extract_fetched(&self, fetched: FetchedDocument, source_id: &str) -> Result<Vec<Finding>, JobError> {
        SizeLimit::megabytes(self.config.max_document_mb).check(fetched.len() as u64)?;

        let text = staging::document_text(fetched, self.config.staging_dir.clone()).await?;
        debug!(source = source_id, chars = text.len(), "Document text ready");

        Ok(self.pipeline.run(&text, source_id).await?)
    }
}
