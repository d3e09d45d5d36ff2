//! Document-level extraction: chunk, extract every unit, aggregate

use crate::chunking::Chunker;
use crate::config::ExtractorConfig;
use crate::enrich::FindingEnricher;
use crate::error::ExtractorError;
use crate::escalation::{Complexity, EscalationController};
use futures_util::stream::{self, StreamExt};
use ruleforge_domain::{Classifier, Extractor, Finding, RuleId, TextUnit};
use std::sync::Arc;
use tracing::{error, info};

/// Chunks a document and extracts findings from every unit
///
/// Units are extracted concurrently (up to `unit_concurrency` at once) but
/// results are collected in document order. The first failing unit fails
/// the whole document; findings of other units are discarded.
pub struct RulePipeline {
    chunker: Chunker,
    controller: EscalationController,
    unit_concurrency: usize,
}

impl RulePipeline {
    /// Build a pipeline from configuration and injected capabilities
    ///
    /// # Errors
    ///
    /// Returns `ExtractorError::Config` if the configuration is invalid.
    pub fn new(
        config: &ExtractorConfig,
        extractor: Arc<dyn Extractor>,
        classifier: Arc<dyn Classifier>,
    ) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;

        let controller = EscalationController::new(
            extractor,
            FindingEnricher::new(classifier),
            Complexity::from_config(config),
        );

        Ok(Self {
            chunker: Chunker::from_config(config)?,
            controller,
            unit_concurrency: config.unit_concurrency,
        })
    }

    /// The chunker used by this pipeline
    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    /// Split a document into text units without extracting
    pub fn chunk(&self, text: &str) -> Vec<TextUnit> {
        self.chunker.chunk(text)
    }

    /// Extract all findings from a document's text
    ///
    /// Every returned finding carries a fresh `rule_id`.
    pub async fn run(&self, text: &str, source_id: &str) -> Result<Vec<Finding>, ExtractorError> {
        let units = self.chunker.chunk(text);
        let pending: Vec<&TextUnit> = units.iter().filter(|u| !u.is_blank()).collect();
        info!(
            source = source_id,
            units = units.len(),
            skipped = units.len() - pending.len(),
            "Document chunked"
        );

        let controller = &self.controller;
        let mut results = stream::iter(pending)
            .map(move |unit| async move {
                controller
                    .extract_and_escalate(unit, source_id)
                    .await
                    .map_err(|e| (unit.sequence_index, e))
            })
            .buffered(self.unit_concurrency)
            .boxed();

        let mut findings = Vec::new();
        while let Some(result) = results.next().await {
            match result {
                Ok(batch) => findings.extend(batch),
                Err((unit, e)) => {
                    error!(source = source_id, unit, "Unit extraction failed: {}", e);
                    return Err(e);
                }
            }
        }

        assign_rule_ids(&mut findings);
        info!(source = source_id, findings = findings.len(), "Document extracted");
        Ok(findings)
    }
}

/// Give every finding a fresh, unique rule id
pub fn assign_rule_ids(findings: &mut [Finding]) {
    for finding in findings {
        finding.rule_id = Some(RuleId::new());
    }
}
