//! Tally CLI library.
//!
//! Configuration, provider wiring, the end-to-end [`Reconciler`] and output
//! formatting for the `tally` command-line tool.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod services;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
pub use pipeline::{ReconciliationReport, Reconciler, StatementContext};
pub use services::{HistoryIndex, Services};
