//! Ruleforge Server
//!
//! HTTP surface of the rule extraction service: background jobs with webhook
//! notification, synchronous extraction and job status.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;

use config::{ConfigError, ServerConfig};
use handlers::{create_router, AppState};
use ruleforge_extractor::{ExtractorError, LlmClassifier, PromptedExtractor, RulePipeline};
use ruleforge_jobs::{DefaultDocumentReader, HttpWebhookNotifier, JobError, JobOrchestrator, SizeLimit};
use ruleforge_llm::LlmError;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Language model provider could not be created
    #[error("LLM provider error: {0}")]
    Llm(#[from] LlmError),

    /// Extraction pipeline could not be created
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] ExtractorError),

    /// Job orchestrator could not be created
    #[error("Job orchestrator error: {0}")]
    Jobs(#[from] JobError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Wire the provider, pipeline and orchestrator described by `config`
///
/// Spawns the job workers, so it must run inside a tokio runtime.
pub fn build_state(config: &ServerConfig) -> Result<AppState, ServerError> {
    let provider = Arc::new(config.llm.build()?);
    let extractor = PromptedExtractor::from_shared(Arc::clone(&provider), config.extractor.inference_timeout());
    let classifier = LlmClassifier::new(provider);
    let pipeline = RulePipeline::new(&config.extractor, Arc::new(extractor), Arc::new(classifier))?;

    let reader = DefaultDocumentReader::new(
        SizeLimit::megabytes(config.jobs.max_document_mb),
        config.jobs.fetch_timeout(),
    )
    .map_err(|e| ServerError::Server(e.to_string()))?;
    let notifier = HttpWebhookNotifier::new(config.jobs.webhook_timeout())
        .map_err(|e| ServerError::Server(format!("Failed to create webhook client: {}", e)))?;

    let orchestrator = JobOrchestrator::start(
        config.jobs.clone(),
        Arc::new(reader),
        Arc::new(pipeline),
        Arc::new(notifier),
    )?;

    Ok(AppState::new(Arc::new(orchestrator)))
}

/// Start the HTTP server
///
/// Serves until Ctrl-C, then drains the job queue before returning.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    config.validate()?;

    info!("Starting Ruleforge server");
    info!("Bind address: {}", config.bind_addr());
    info!("Max document size: {}MB", config.jobs.max_document_mb);
    info!(
        "Chunking: {} tokens, {} overlap",
        config.extractor.max_tokens_per_chunk, config.extractor.overlap_tokens
    );

    let state = build_state(&config)?;
    let orchestrator = Arc::clone(&state.orchestrator);
    let app = create_router(state).layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Server listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    orchestrator.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, stopping server");
}
