//! Findings - the rules extracted from a document

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Unique identifier for a finding, assigned at final aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(uuid::Uuid);

impl RuleId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Parse an identifier from its string form
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid rule id: {}", e))
    }
}

impl Default for RuleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Business category of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Advertising, promotion and brand rules
    Marketing,
    /// Betting, wagering and lottery rules
    Gambling,
    /// Contractual and statutory rules
    Legal,
    /// Everything else
    Compliance,
}

impl Category {
    /// All categories, in fallback-evaluation order
    pub const ALL: [Category; 4] = [
        Category::Marketing,
        Category::Gambling,
        Category::Legal,
        Category::Compliance,
    ];

    /// Get the category name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Marketing => "Marketing",
            Category::Gambling => "Gambling",
            Category::Legal => "Legal",
            Category::Compliance => "Compliance",
        }
    }

    /// Parse a category label, ignoring case and surrounding whitespace
    pub fn parse(s: &str) -> Option<Self> {
        let label = s.trim().trim_matches(|c: char| c == '.' || c == '"');
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid category: {}", s))
    }
}

/// A finding as returned by the model, before enrichment
///
/// Every field is optional on the wire; missing values default to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawFinding {
    /// Text of the rule
    #[serde(deserialize_with = "null_as_default")]
    pub rule_text: String,

    /// Surrounding context the rule was taken from
    #[serde(deserialize_with = "null_as_default")]
    pub context: String,

    /// Free-form tags, any case, possibly repeated
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,

    /// Category label proposed by the model, if any
    pub category: Option<String>,
}

/// Models write `null` for fields they have nothing to say about
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Provenance stamped on every finding during enrichment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingMetadata {
    /// Wall-clock time of enrichment
    pub extraction_timestamp: DateTime<Utc>,

    /// Base identifier of the source document
    pub source_document: String,

    /// Section label (or category hint) the finding was extracted under
    pub section: String,
}

/// An enriched rule extracted from a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Identifier, present once the finding has been aggregated into a result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<RuleId>,

    /// Text of the rule
    pub rule_text: String,

    /// Surrounding context
    pub context: String,

    /// Lowercase, de-duplicated tags in sorted order
    pub tags: BTreeSet<String>,

    /// Category of the rule
    pub category: Category,

    /// Provenance
    pub metadata: FindingMetadata,
}

impl Finding {
    /// Lowercase and de-duplicate a list of tags
    ///
    /// Blank tags are dropped; surrounding whitespace is trimmed.
    pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tags.into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Number of whitespace-separated words in the rule text
    pub fn word_count(&self) -> usize {
        self.rule_text.split_whitespace().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_category_parse() {
        assert_eq!(Category::parse("marketing"), Some(Category::Marketing));
        assert_eq!(Category::parse(" GAMBLING\n"), Some(Category::Gambling));
        assert_eq!(Category::parse("Legal."), Some(Category::Legal));
        assert_eq!(Category::parse("Finance"), None);
        assert_eq!(Category::parse(""), None);
    }

    #[test]
    fn test_category_serializes_as_name() {
        let json = serde_json::to_string(&Category::Compliance).unwrap();
        assert_eq!(json, r#""Compliance""#);
    }

    #[test]
    fn test_raw_finding_defaults() {
        let raw: RawFinding = serde_json::from_str(r#"{"rule_text": "No ads after 9pm"}"#).unwrap();
        assert_eq!(raw.rule_text, "No ads after 9pm");
        assert_eq!(raw.context, "");
        assert!(raw.tags.is_empty());
        assert!(raw.category.is_none());
    }

    #[test]
    fn test_raw_finding_null_fields() {
        let raw: RawFinding =
            serde_json::from_str(r#"{"rule_text": "No ads after 9pm", "context": null, "tags": null, "category": null}"#)
                .unwrap();
        assert_eq!(raw.rule_text, "No ads after 9pm");
        assert_eq!(raw.context, "");
        assert!(raw.tags.is_empty());
        assert!(raw.category.is_none());
    }

    #[test]
    fn test_normalize_tags() {
        let tags = Finding::normalize_tags(["Ads", "ads", " TV ", "", "Age-Limit"]);
        let tags: Vec<_> = tags.into_iter().collect();
        assert_eq!(tags, vec!["ads", "age-limit", "tv"]);
    }

    #[test]
    fn test_rule_id_round_trip() {
        let id = RuleId::new();
        assert_eq!(RuleId::from_string(&id.to_string()).unwrap(), id);
        assert!(RuleId::from_string("not-a-uuid").is_err());
    }

    proptest! {
        #[test]
        fn prop_tags_are_lowercase_and_unique(tags in proptest::collection::vec("[A-Za-z ]{0,8}", 0..12)) {
            let normalized = Finding::normalize_tags(&tags);
            for tag in &normalized {
                prop_assert_eq!(tag.clone(), tag.to_lowercase());
            }
            let as_vec: Vec<_> = normalized.iter().collect();
            let mut deduped = as_vec.clone();
            deduped.dedup();
            prop_assert_eq!(as_vec, deduped);
        }
    }
}
