//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use ruleforge_domain::{Finding, TextUnit};
use serde_json::Value;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Longest rule text shown in a table cell
const RULE_PREVIEW_CHARS: usize = 80;

/// Longest rule text shown for a received event
const EVENT_PREVIEW_CHARS: usize = 100;

/// Output formatter.
#[derive(Debug, Clone)]
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// The selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format extracted findings.
    pub fn format_findings(&self, findings: &[Finding]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(findings)?),
            OutputFormat::Table => Ok(self.format_findings_table(findings)),
            OutputFormat::Quiet => Ok(findings
                .iter()
                .filter_map(|f| f.rule_id.map(|id| id.to_string()))
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    fn format_findings_table(&self, findings: &[Finding]) -> String {
        if findings.is_empty() {
            return self.colorize("No rules found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Section", "Category", "Rule", "Tags"]);

        for finding in findings {
            let id = finding.rule_id.map(|id| id.to_string()).unwrap_or_default();
            let tags: Vec<&str> = finding.tags.iter().map(String::as_str).collect();
            builder.push_record([
                // v7 ids share their timestamp prefix; the tail tells them apart
                id[id.len().saturating_sub(8)..].to_string(),
                finding.metadata.section.clone(),
                finding.category.as_str().to_string(),
                preview(&finding.rule_text, RULE_PREVIEW_CHARS),
                tags.join(", "),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format the text units of a chunked document.
    pub fn format_units(&self, units: &[TextUnit]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(units)?),
            OutputFormat::Quiet => Ok(units
                .iter()
                .map(|u| u.section_label.clone())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["#", "Section", "Tokens", "Start"]);
                for unit in units {
                    builder.push_record([
                        unit.sequence_index.to_string(),
                        unit.section_label.clone(),
                        unit.token_count.to_string(),
                        preview(unit.body.trim(), 50),
                    ]);
                }

                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                Ok(table.to_string())
            }
        }
    }

    /// Format a webhook delivery received by `listen`.
    ///
    /// `event` and `job_id` are the header values, when present.
    pub fn format_event(&self, event: Option<&str>, job_id: Option<&str>, payload: &Value) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(payload)?);
        }

        let status = payload.get("status").and_then(Value::as_str).unwrap_or("unknown");
        let mut lines = vec![
            self.colorize(&format!("Event: {}", event.unwrap_or("unknown")), "cyan"),
            format!("Job: {}", job_id.unwrap_or("unknown")),
            format!("Status: {}", status),
        ];

        if let Some(rules) = payload.get("rules").and_then(Value::as_array) {
            lines.push(self.success(&format!("{} rule(s) extracted", rules.len())));
            if let Some(first) = rules.first() {
                let text = first.get("rule_text").and_then(Value::as_str).unwrap_or_default();
                let category = first.get("category").and_then(Value::as_str).unwrap_or("Unknown");
                lines.push(format!("First rule: {}", preview(text, EVENT_PREVIEW_CHARS)));
                lines.push(format!("Category: {}", category));
            }
        }
        if let Some(error) = payload.get("error").and_then(Value::as_str) {
            lines.push(self.error(error));
        }
        if let Some(message) = payload.get("message").and_then(Value::as_str) {
            lines.push(self.info(message));
        }

        if self.format == OutputFormat::Table {
            let rule = "=".repeat(60);
            lines.push(rule.clone());
            lines.push(serde_json::to_string_pretty(payload)?);
            lines.push(rule);
        }

        Ok(lines.join("\n"))
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

/// First `max` characters of `text`, with an ellipsis when cut
pub fn preview(text: &str, max: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max {
        return flat;
    }
    let mut cut: String = flat.chars().take(max).collect();
    cut.push_str("...");
    cut
}
