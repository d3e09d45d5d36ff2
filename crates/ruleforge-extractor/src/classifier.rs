//! Rule categorization
//!
//! `KeywordClassifier` is the deterministic fallback chain; `LlmClassifier`
//! asks a model first and falls back to keywords when the model is
//! unavailable or answers with an unknown label.

use crate::prompt::{classification_prompt, CLASSIFIER_SYSTEM_PROMPT};
use async_trait::async_trait;
use ruleforge_domain::{Category, Classifier, CompletionRequest, LlmProvider, ModelTier};
use std::sync::Arc;
use tracing::{debug, warn};

/// Vocabulary checked in order; the first category with a matching stem wins
const KEYWORDS: [(Category, &[&str]); 3] = [
    (Category::Marketing, &["advert", "marketing", "promotion", "brand"]),
    (Category::Gambling, &["gambl", "bet", "wager", "lottery"]),
    (Category::Legal, &["law", "legal", "contract", "clause", "statute"]),
];

/// Categorize by keyword stems, defaulting to `Compliance`
pub fn keyword_category(rule_text: &str) -> Category {
    let text = rule_text.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(_, stems)| stems.iter().any(|stem| text.contains(stem)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Compliance)
}

/// Keyword-only classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, rule_text: &str) -> Category {
        keyword_category(rule_text)
    }
}

/// Model-backed classifier with keyword fallback
pub struct LlmClassifier<L> {
    llm: Arc<L>,
}

impl<L> LlmClassifier<L>
where
    L: LlmProvider,
{
    /// Create a classifier that asks `llm` at the standard tier
    pub fn new(llm: Arc<L>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl<L> Classifier for LlmClassifier<L>
where
    L: LlmProvider + 'static,
{
    async fn classify(&self, rule_text: &str) -> Category {
        let request = CompletionRequest::new(
            ModelTier::Standard,
            CLASSIFIER_SYSTEM_PROMPT,
            classification_prompt(rule_text),
        )
        .with_max_tokens(10);

        match self.llm.generate(&request).await {
            Ok(label) => match Category::parse(&label) {
                Some(category) => category,
                None => {
                    debug!(label = %label.trim(), "Unrecognized category label, using keywords");
                    keyword_category(rule_text)
                }
            },
            Err(e) => {
                warn!("Category classification failed, using keywords: {}", e);
                keyword_category(rule_text)
            }
        }
    }
}
