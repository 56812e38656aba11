//! Tally CLI - Reconcile bank-statement payment notes.

use anyhow::Context;
use clap::Parser;
use tally_cli::commands;
use tally_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Log to stderr so JSON output stays clean
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    let result = match cli.command {
        Command::Classify(args) => commands::execute_classify(args, &formatter),
        Command::Match(args) => commands::execute_match(args, &config, &formatter).await,
        Command::Company(args) => commands::execute_company(args, &config, &formatter).await,
        Command::Evidence(args) => commands::execute_evidence(args, &config, &formatter).await,
        Command::Reconcile(args) => commands::execute_reconcile(args, &config, &formatter).await,
        Command::Config(args) => {
            commands::execute_config(args, &config, cli.config.as_deref(), &formatter)
        }
    };

    if let Err(e) = result {
        eprintln!("{}", formatter.error(&e.to_string()));
        std::process::exit(1);
    }
    Ok(())
}
