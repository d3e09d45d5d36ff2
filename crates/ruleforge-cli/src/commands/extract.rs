//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::commands::load_document;
use crate::config::{Config, OutputFormat};
use crate::error::Result;
use crate::output::Formatter;
use ruleforge_domain::Finding;
use ruleforge_extractor::{LlmClassifier, PromptedExtractor, RulePipeline};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Execute the extract command.
pub async fn execute_extract(args: ExtractArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let provider = Arc::new(config.llm.build()?);
    let extractor = PromptedExtractor::from_shared(Arc::clone(&provider), config.extractor.inference_timeout());
    let pipeline = RulePipeline::new(
        &config.extractor,
        Arc::new(extractor),
        Arc::new(LlmClassifier::new(provider)),
    )?;

    extract_with(&pipeline, args, config, formatter).await?;
    Ok(())
}

/// Run `pipeline` over the document named by `args` and report the result
///
/// Returns the findings and, unless `--no-save` was given, the file they
/// were written to.
pub async fn extract_with(
    pipeline: &RulePipeline,
    args: ExtractArgs,
    config: &Config,
    formatter: &Formatter,
) -> Result<(Vec<Finding>, Option<PathBuf>)> {
    let document = load_document(&args.path, config.max_document_mb).await?;
    info!(source = %document.source_id, chars = document.text.len(), "Document loaded");

    let findings = pipeline.run(&document.text, &document.source_id).await?;

    let saved = if args.no_save {
        None
    } else {
        let output = args.output.unwrap_or_else(|| default_output_path(&args.path));
        std::fs::write(&output, serde_json::to_string_pretty(&findings)?)?;
        Some(output)
    };

    println!("{}", formatter.format_findings(&findings)?);
    if formatter.format() != OutputFormat::Quiet {
        println!("{}", formatter.success(&format!("Extracted {} rule(s)", findings.len())));
        if let Some(path) = &saved {
            println!("{}", formatter.info(&format!("Rules saved to {}", path.display())));
        }
    }

    Ok((findings, saved))
}

/// `<dir>/<stem>_rules.json` for an input at `<dir>/<stem>.<ext>`
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    input.with_file_name(format!("{}_rules.json", stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use ruleforge_extractor::{ExtractorError, KeywordClassifier};
    use ruleforge_llm::MockProvider;

    fn pipeline(llm: MockProvider) -> RulePipeline {
        let config = Config::default();
        let extractor = PromptedExtractor::new(llm, config.extractor.inference_timeout());
        RulePipeline::new(&config.extractor, Arc::new(extractor), Arc::new(KeywordClassifier)).unwrap()
    }

    fn args(path: PathBuf) -> ExtractArgs {
        ExtractArgs {
            path,
            output: None,
            no_save: false,
        }
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/data/policy.pdf")),
            PathBuf::from("/data/policy_rules.json")
        );
        assert_eq!(default_output_path(Path::new("notes")), PathBuf::from("notes_rules.json"));
    }

    #[tokio::test]
    async fn test_extract_writes_rules_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("policy.md");
        std::fs::write(&input, "1 Advertising\nNo ads near schools.\n2 Betting\nNo credit bets.\n").unwrap();

        let llm = MockProvider::new(r#"[{"rule_text": "No ads near schools", "tags": ["Ads"]}]"#);
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let (findings, saved) = extract_with(&pipeline(llm.clone()), args(input), &Config::default(), &formatter)
            .await
            .unwrap();

        assert_eq!(findings.len(), 2);
        assert_eq!(llm.call_count(), 2);

        let saved = saved.unwrap();
        assert_eq!(saved, dir.path().join("policy_rules.json"));
        let written: Vec<Finding> = serde_json::from_str(&std::fs::read_to_string(&saved).unwrap()).unwrap();
        assert_eq!(written, findings);
        assert_eq!(written[0].metadata.source_document, "policy");
    }

    #[tokio::test]
    async fn test_explicit_output_and_no_save() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("rules.txt");
        std::fs::write(&input, "Members must sign in.").unwrap();
        let formatter = Formatter::new(OutputFormat::Json, false);
        let llm = MockProvider::new(r#"[{"rule_text": "Members must sign in"}]"#);

        let mut explicit = args(input.clone());
        explicit.output = Some(dir.path().join("out.json"));
        let (_, saved) = extract_with(&pipeline(llm.clone()), explicit, &Config::default(), &formatter)
            .await
            .unwrap();
        assert_eq!(saved, Some(dir.path().join("out.json")));

        let mut unsaved = args(input);
        unsaved.no_save = true;
        let (findings, saved) = extract_with(&pipeline(llm), unsaved, &Config::default(), &formatter)
            .await
            .unwrap();
        assert_eq!(findings.len(), 1);
        assert!(saved.is_none());
        assert!(!dir.path().join("rules_rules.json").exists());
    }

    #[tokio::test]
    async fn test_malformed_model_output_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("rules.txt");
        std::fs::write(&input, "Members must sign in.").unwrap();

        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let result = extract_with(
            &pipeline(MockProvider::new("not json")),
            args(input),
            &Config::default(),
            &formatter,
        )
        .await;

        assert!(matches!(result, Err(CliError::Extraction(ExtractorError::Parse(_)))));
        assert!(!dir.path().join("rules_rules.json").exists());
    }
}
