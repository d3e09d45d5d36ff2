//! Finding enrichment: tag normalization, category fallback and provenance

use chrono::Utc;
use ruleforge_domain::{Category, Classifier, Finding, FindingMetadata, RawFinding};
use std::sync::Arc;
use tracing::debug;

/// Turns raw model findings into enriched findings
#[derive(Clone)]
pub struct FindingEnricher {
    classifier: Arc<dyn Classifier>,
}

impl FindingEnricher {
    /// Create an enricher that classifies uncategorized findings with `classifier`
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    /// Enrich a batch of raw findings from one model call
    ///
    /// All findings of the batch share one extraction timestamp. Findings
    /// without a recognizable category are sent to the classifier.
    pub async fn enrich(
        &self,
        raw_findings: Vec<RawFinding>,
        section_label: &str,
        source_id: &str,
    ) -> Vec<Finding> {
        let extraction_timestamp = Utc::now();
        let mut findings = Vec::with_capacity(raw_findings.len());

        for raw in raw_findings {
            let category = match raw.category.as_deref().and_then(Category::parse) {
                Some(category) => category,
                None => {
                    if let Some(label) = raw.category.as_deref().filter(|l| !l.trim().is_empty()) {
                        debug!(label, "Unknown category from model, reclassifying");
                    }
                    self.classifier.classify(&raw.rule_text).await
                }
            };

            findings.push(Finding {
                rule_id: None,
                tags: Finding::normalize_tags(&raw.tags),
                rule_text: raw.rule_text,
                context: raw.context,
                category,
                metadata: FindingMetadata {
                    extraction_timestamp,
                    source_document: source_id.to_string(),
                    section: section_label.to_string(),
                },
            });
        }

        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::KeywordClassifier;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingClassifier(AtomicUsize);

    #[async_trait]
    impl Classifier for CountingClassifier {
        async fn classify(&self, _rule_text: &str) -> Category {
            self.0.fetch_add(1, Ordering::SeqCst);
            Category::Legal
        }
    }

    fn raw(rule_text: &str, tags: &[&str], category: Option<&str>) -> RawFinding {
        RawFinding {
            rule_text: rule_text.to_string(),
            context: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            category: category.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_tags_are_lowercased_and_deduplicated() {
        let enricher = FindingEnricher::new(Arc::new(KeywordClassifier));
        let findings = enricher
            .enrich(vec![raw("r", &["Ads", "ads", " ADS ", "Minors", ""], Some("Marketing"))], "1 Scope", "policy")
            .await;

        let tags: Vec<_> = findings[0].tags.iter().cloned().collect();
        assert_eq!(tags, vec!["ads", "minors"]);
    }

    #[tokio::test]
    async fn test_metadata_is_stamped() {
        let enricher = FindingEnricher::new(Arc::new(KeywordClassifier));
        let findings = enricher
            .enrich(vec![raw("a", &[], None), raw("b", &[], None)], "2.1 Limits", "handbook")
            .await;

        assert_eq!(findings.len(), 2);
        for finding in &findings {
            assert_eq!(finding.metadata.source_document, "handbook");
            assert_eq!(finding.metadata.section, "2.1 Limits");
            assert!(finding.rule_id.is_none());
        }
        assert_eq!(
            findings[0].metadata.extraction_timestamp,
            findings[1].metadata.extraction_timestamp
        );
    }

    #[tokio::test]
    async fn test_classifier_only_for_missing_or_unknown_category() {
        let classifier = Arc::new(CountingClassifier(AtomicUsize::new(0)));
        let enricher = FindingEnricher::new(classifier.clone());

        let findings = enricher
            .enrich(
                vec![
                    raw("a", &[], Some("gambling")),
                    raw("b", &[], Some("")),
                    raw("c", &[], None),
                    raw("d", &[], Some("Finance")),
                ],
                "General",
                "doc",
            )
            .await;

        assert_eq!(classifier.0.load(Ordering::SeqCst), 3);
        assert_eq!(findings[0].category, Category::Gambling);
        assert!(findings[1..].iter().all(|f| f.category == Category::Legal));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let enricher = FindingEnricher::new(Arc::new(KeywordClassifier));
        assert!(enricher.enrich(Vec::new(), "General", "doc").await.is_empty());
    }
}
