//! Ruleforge CLI library.
//!
//! Local rule extraction, chunk previews and a webhook receiver for testing
//! the extraction service.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
