//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Ruleforge CLI - Extract structured rules from documents.
#[derive(Debug, Parser)]
#[command(name = "ruleforge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "RULEFORGE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (ids only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract rules from a local document and save them as JSON
    Extract(ExtractArgs),

    /// Show how a document is split into text units
    Chunks(ChunksArgs),

    /// Run a webhook receiver that prints incoming job events
    Listen(ListenArgs),
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Document to extract (.pdf, .txt or .md)
    pub path: PathBuf,

    /// Output file (default: <name>_rules.json next to the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Do not write an output file
    #[arg(long)]
    pub no_save: bool,
}

/// Arguments for the chunks command.
#[derive(Debug, Parser)]
pub struct ChunksArgs {
    /// Document to split (.pdf, .txt or .md)
    pub path: PathBuf,

    /// Override the token budget per unit
    #[arg(long)]
    pub max_tokens: Option<usize>,

    /// Override the overlap between fixed-size windows
    #[arg(long)]
    pub overlap: Option<usize>,
}

/// Arguments for the listen command.
#[derive(Debug, Parser)]
pub struct ListenArgs {
    /// Port to listen on
    #[arg(short, long, default_value = "5000")]
    pub port: u16,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub bind: String,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}
