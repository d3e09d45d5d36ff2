//! LLM prompt engineering for rule extraction

use ruleforge_domain::Category;

/// System instruction for extraction calls
pub const EXTRACTION_SYSTEM_PROMPT: &str = "You are a helpful rule extraction assistant.";

/// System instruction for classification calls
pub const CLASSIFIER_SYSTEM_PROMPT: &str = "You are a precise classifier.";

/// Builds prompts for the LLM to extract rules
pub struct PromptBuilder<'a> {
    text: &'a str,
    section: Option<&'a str>,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder over the text to analyze
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            section: None,
        }
    }

    /// Name the section (or category) the text belongs to
    pub fn with_section(mut self, section: &'a str) -> Self {
        let trimmed = section.trim();
        self.section = (!trimmed.is_empty()).then_some(trimmed);
        self
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let mut prompt = String::with_capacity(EXTRACTION_INSTRUCTIONS.len() + self.text.len() + 256);

        prompt.push_str(EXTRACTION_INSTRUCTIONS);
        prompt.push_str("\n\n");

        if let Some(section) = self.section {
            prompt.push_str(&format!("Section: {}\n\n", section));
        }

        prompt.push_str("Text:\n");
        prompt.push_str(self.text);
        prompt.push_str("\n\nOutput:");

        prompt
    }
}

/// Prompt asking for exactly one category word
pub fn classification_prompt(rule_text: &str) -> String {
    let labels: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
    format!(
        "Classify the following rule into exactly one category from this set: {}. \
         Respond with only the single category word, nothing else.\n\nRule:\n{}",
        labels.join(", "),
        rule_text
    )
}

const EXTRACTION_INSTRUCTIONS: &str = r#"Extract every rule, obligation, prohibition and requirement from the text below.
Return a JSON array. Each element describes one rule:

{
  "rule_text": "the rule, stated as a single self-contained sentence",
  "context": "the surrounding text needed to understand the rule",
  "tags": ["short", "topic", "keywords"],
  "category": "Marketing | Gambling | Legal | Compliance"
}

Guidelines:
- One rule per element; split compound requirements into separate rules
- Keep the wording of the source where possible
- Leave "category" empty if none of the four categories clearly applies
- Return [] when the text contains no rules

Return ONLY the JSON array, no markdown code blocks, no explanations."#;
