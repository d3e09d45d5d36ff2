//! Ruleforge server binary
//!
//! Starts the HTTP service for rule extraction jobs.

use clap::Parser;
use ruleforge_server::{config::ServerConfig, start_server, ServerError};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Ruleforge - extract structured rules from documents
#[derive(Debug, Parser)]
#[command(name = "ruleforge-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "RULEFORGE_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address, overrides the configuration file
    #[arg(long)]
    bind: Option<String>,

    /// Port, overrides the configuration file
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run(Args::parse()).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), ServerError> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => {
            tracing::warn!("No config file specified, using defaults and environment");
            ServerConfig::default()
        }
    };
    config.apply_env()?;

    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    if let Some(port) = args.port {
        config.bind_port = port;
    }

    start_server(config).await
}
