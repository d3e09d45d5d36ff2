//! Chunks command implementation.

use crate::cli::ChunksArgs;
use crate::commands::load_document;
use crate::config::{Config, OutputFormat};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use ruleforge_domain::TextUnit;
use ruleforge_extractor::Chunker;

/// Execute the chunks command.
pub async fn execute_chunks(args: ChunksArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let units = chunk_document(&args, config).await?;

    println!("{}", formatter.format_units(&units)?);
    if formatter.format() == OutputFormat::Table {
        let tokens: usize = units.iter().map(|u| u.token_count).sum();
        println!("{}", formatter.info(&format!("{} unit(s), {} token(s)", units.len(), tokens)));
    }
    Ok(())
}

/// Split the document named by `args` without calling any model
pub async fn chunk_document(args: &ChunksArgs, config: &Config) -> Result<Vec<TextUnit>> {
    let max_tokens = args.max_tokens.unwrap_or(config.extractor.max_tokens_per_chunk);
    let overlap = args.overlap.unwrap_or(config.extractor.overlap_tokens);
    let chunker = Chunker::new(max_tokens, overlap).map_err(|e| CliError::InvalidInput(e.to_string()))?;

    let document = load_document(&args.path, config.max_document_mb).await?;
    Ok(chunker.chunk(&document.text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(path: PathBuf) -> ChunksArgs {
        ChunksArgs {
            path,
            max_tokens: None,
            overlap: None,
        }
    }

    #[tokio::test]
    async fn test_chunk_by_heading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.txt");
        std::fs::write(&path, "1 Scope\nApplies to staff.\n2 Terms\nBe kind.\n").unwrap();

        let units = chunk_document(&args(path), &Config::default()).await.unwrap();
        let labels: Vec<_> = units.iter().map(|u| u.section_label.as_str()).collect();
        assert_eq!(labels, vec!["1 Scope", "2 Terms"]);
    }

    #[tokio::test]
    async fn test_window_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prose.txt");
        std::fs::write(&path, "word ".repeat(300)).unwrap();

        let mut small = args(path);
        small.max_tokens = Some(100);
        small.overlap = Some(10);
        let units = chunk_document(&small, &Config::default()).await.unwrap();
        assert!(units.len() > 1);
        assert!(units.iter().all(|u| u.token_count <= 100));
    }

    #[tokio::test]
    async fn test_invalid_overlap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prose.txt");
        std::fs::write(&path, "text").unwrap();

        let mut bad = args(path);
        bad.max_tokens = Some(10);
        bad.overlap = Some(10);
        let result = chunk_document(&bad, &Config::default()).await;
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
    }
}
