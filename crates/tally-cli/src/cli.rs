//! CLI command definitions and argument parsing.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tally CLI - Reconcile bank-statement payment notes.
#[derive(Debug, Parser)]
#[command(name = "tally")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "TALLY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
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
    /// Split a note into typed lines
    Classify(NoteArgs),

    /// Match every line of a note against the history corpus
    Match(NoteArgs),

    /// Extract the payer name from a note
    Company(NoteArgs),

    /// Rank email evidence for a payer
    Evidence(EvidenceArgs),

    /// Run the full pipeline on a note
    Reconcile(ReconcileArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Where the note text comes from.
#[derive(Debug, Parser)]
pub struct NoteArgs {
    /// Note text (`\n` escapes are accepted)
    pub text: Option<String>,

    /// Read the note from a file ("-" for stdin)
    #[arg(short = 'i', long, conflicts_with = "text")]
    pub file: Option<PathBuf>,
}

/// Arguments for the evidence command.
#[derive(Debug, Parser)]
pub struct EvidenceArgs {
    /// Payer name
    #[arg(long)]
    pub company: Option<String>,

    /// Center date (YYYY-MM-DD)
    #[arg(short, long)]
    pub date: NaiveDate,

    /// Payment amount
    #[arg(short, long)]
    pub amount: Option<f64>,

    /// Days before the date (default depends on source)
    #[arg(long)]
    pub days_before: Option<u32>,

    /// Days after the date (default depends on source)
    #[arg(long)]
    pub days_after: Option<u32>,

    /// Query the mailbox instead of the cached corpus
    #[arg(long)]
    pub live: bool,

    /// Also summarize the top emails
    #[arg(long)]
    pub summarize: bool,
}

/// Arguments for the reconcile command.
#[derive(Debug, Parser)]
pub struct ReconcileArgs {
    #[command(flatten)]
    pub note: NoteArgs,

    /// Statement date (YYYY-MM-DD); falls back to a date token in the note
    #[arg(short, long)]
    pub date: Option<NaiveDate>,

    /// Payment amount; falls back to an amount in the note
    #[arg(short, long)]
    pub amount: Option<f64>,

    /// Query the mailbox instead of the cached corpus
    #[arg(long)]
    pub live: bool,
}

/// Arguments for configuration management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
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
