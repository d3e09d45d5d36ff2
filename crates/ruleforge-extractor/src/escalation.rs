//! Escalation of complex findings to the high-fidelity tier

use crate::config::ExtractorConfig;
use crate::enrich::FindingEnricher;
use crate::error::ExtractorError;
use ruleforge_domain::{Extractor, Finding, InferenceError, ModelTier, TextUnit};
use std::sync::Arc;
use tracing::{debug, warn};

/// Thresholds of the complexity predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Complexity {
    /// More words than this is complex
    pub word_limit: usize,
    /// More `and`/`or` conjunctions than this is complex
    pub conjunction_limit: usize,
}

impl Default for Complexity {
    fn default() -> Self {
        Self {
            word_limit: 60,
            conjunction_limit: 3,
        }
    }
}

impl Complexity {
    /// Thresholds from the pipeline configuration
    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self {
            word_limit: config.complexity_word_limit,
            conjunction_limit: config.complexity_conjunction_limit,
        }
    }

    /// Whether a rule is complex enough to be re-extracted
    pub fn is_complex(&self, rule_text: &str) -> bool {
        rule_text.split_whitespace().count() > self.word_limit
            || conjunction_count(rule_text) > self.conjunction_limit
    }
}

/// Number of standalone `and` / `or` words, ignoring case and punctuation
pub fn conjunction_count(text: &str) -> usize {
    text.split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|word| word.eq_ignore_ascii_case("and") || word.eq_ignore_ascii_case("or"))
        .count()
}

/// Runs standard-tier extraction on a unit and escalates complex findings
pub struct EscalationController {
    extractor: Arc<dyn Extractor>,
    enricher: FindingEnricher,
    complexity: Complexity,
}

impl EscalationController {
    /// Create a controller
    pub fn new(extractor: Arc<dyn Extractor>, enricher: FindingEnricher, complexity: Complexity) -> Self {
        Self {
            extractor,
            enricher,
            complexity,
        }
    }

    /// Extract findings from `unit`, refining complex ones in place
    ///
    /// A complex finding is replaced by whatever the high-fidelity pass
    /// returns, which may be nothing.
    ///
    /// # Errors
    ///
    /// Fails when the standard-tier call fails, or when the high-fidelity
    /// answer cannot be parsed. A high-fidelity call that cannot reach the
    /// model or times out keeps the original finding.
    pub async fn extract_and_escalate(
        &self,
        unit: &TextUnit,
        source_id: &str,
    ) -> Result<Vec<Finding>, ExtractorError> {
        let raw = self
            .extractor
            .infer(ModelTier::Standard, &unit.body, &unit.section_label)
            .await?;
        let findings = self.enricher.enrich(raw, &unit.section_label, source_id).await;
        debug!(unit = unit.sequence_index, findings = findings.len(), "Unit extracted");

        let mut output = Vec::with_capacity(findings.len());
        for finding in findings {
            if !self.complexity.is_complex(&finding.rule_text) {
                output.push(finding);
                continue;
            }

            let hint = finding.category.as_str();
            debug!(unit = unit.sequence_index, category = hint, "Escalating complex finding");
            match self
                .extractor
                .infer(ModelTier::HighFidelity, &finding.rule_text, hint)
                .await
            {
                Ok(raw) => {
                    let refined = self.enricher.enrich(raw, hint, source_id).await;
                    output.extend(refined);
                }
                Err(e @ InferenceError::Parse(_)) => return Err(e.into()),
                Err(e) => {
                    warn!(unit = unit.sequence_index, "High-fidelity pass failed, keeping original: {}", e);
                    output.push(finding);
                }
            }
        }

        Ok(output)
    }
}
