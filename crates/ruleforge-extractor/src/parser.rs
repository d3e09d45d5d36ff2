//! Parse LLM output into raw findings

use crate::error::ExtractorError;
use ruleforge_domain::RawFinding;
use serde_json::Value;
use tracing::warn;

/// Parse an LLM JSON response into raw findings
///
/// The response must be a JSON array, optionally wrapped in a Markdown code
/// block. Entries that are not objects, or whose fields have the wrong type,
/// are skipped; missing or `null` fields take their defaults.
pub fn parse_llm_response(response: &str) -> Result<Vec<RawFinding>, ExtractorError> {
    let json_str = extract_json(response)?;

    let json: Value = serde_json::from_str(json_str)?;

    let entries = match json {
        Value::Array(entries) => entries,
        other => {
            return Err(ExtractorError::Parse(format!(
                "Expected JSON array, got {}",
                value_kind(&other)
            )))
        }
    };

    let mut findings = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.into_iter().enumerate() {
        if !entry.is_object() {
            warn!("Finding {} is not a JSON object, skipping", idx);
            continue;
        }
        match serde_json::from_value::<RawFinding>(entry) {
            Ok(finding) => findings.push(finding),
            Err(e) => warn!("Failed to parse finding {}: {}", idx, e),
        }
    }

    Ok(findings)
}

/// Extract JSON from response, handling markdown code blocks
fn extract_json(response: &str) -> Result<&str, ExtractorError> {
    let trimmed = response.trim();

    let Some(fenced) = trimmed.strip_prefix("```") else {
        return Ok(trimmed);
    };

    // Drop the language tag line, then the closing fence
    let body = match fenced.split_once('\n') {
        Some((_, rest)) => rest,
        None => return Err(ExtractorError::Parse("Empty code block".to_string())),
    };
    let body = body.trim_end();
    Ok(body.strip_suffix("```").unwrap_or(body).trim())
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_json() {
        let response = r#"[
            {
                "rule_text": "Ads must not target minors.",
                "context": "Section 2 audience rules",
                "tags": ["Ads", "minors"],
                "category": "Marketing"
            }
        ]"#;

        let findings = parse_llm_response(response).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_text, "Ads must not target minors.");
        assert_eq!(findings[0].tags, vec!["Ads", "minors"]);
        assert_eq!(findings[0].category.as_deref(), Some("Marketing"));
    }

    #[test]
    fn test_parse_json_with_markdown_wrapper() {
        let response = "```json\n[{\"rule_text\": \"No betting\"}]\n```";
        let findings = parse_llm_response(response).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_text, "No betting");
    }

    #[test]
    fn test_missing_fields_default() {
        let findings = parse_llm_response(r#"[{"rule_text": "Only text"}, {}]"#).unwrap();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].context, "");
        assert!(findings[0].tags.is_empty());
        assert!(findings[0].category.is_none());
        assert_eq!(findings[1].rule_text, "");
    }

    #[test]
    fn test_null_fields_default() {
        let response = r#"[{"rule_text": "No ads after 9pm", "context": null, "tags": null}]"#;
        let findings = parse_llm_response(response).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_text, "No ads after 9pm");
        assert_eq!(findings[0].context, "");
        assert!(findings[0].tags.is_empty());
    }

    #[test]
    fn test_parse_invalid_json() {
        let result = parse_llm_response("This is not JSON");
        assert!(matches!(result, Err(ExtractorError::Parse(_))));
    }

    #[test]
    fn test_parse_json_not_array() {
        let result = parse_llm_response(r#"{"rule_text": "x"}"#);
        match result {
            Err(ExtractorError::Parse(msg)) => assert!(msg.contains("object")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_partial_success() {
        let response = r#"[
            {"rule_text": "First"},
            "not an object",
            {"rule_text": 42},
            {"rule_text": "Second", "tags": ["a"]}
        ]"#;

        let findings = parse_llm_response(response).unwrap();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].rule_text, "First");
        assert_eq!(findings[1].rule_text, "Second");
    }

    #[test]
    fn test_extract_json_from_plain_json() {
        assert_eq!(extract_json("  [1]  ").unwrap(), "[1]");
    }

    #[test]
    fn test_extract_json_from_markdown_without_language() {
        assert_eq!(extract_json("```\n[]\n```").unwrap(), "[]");
    }

    #[test]
    fn test_empty_code_block() {
        assert!(extract_json("```").is_err());
    }
}
