//! Reconcile command implementation.

use super::read_note;
use crate::cli::ReconcileArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use crate::pipeline::{Reconciler, StatementContext};
use crate::services::Services;

/// Execute the reconcile command.
pub async fn execute_reconcile(args: ReconcileArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let note = read_note(&args.note)?;
    let services = Services::load(config).await?;
    let history = services.load_history(config).await?;

    let reconciler = Reconciler::new(
        services.orchestrator(&history, config),
        services.company_extractor(),
        services.email_search(config, args.live),
        services.summarizer(config),
    );

    let context = StatementContext {
        date: args.date,
        amount: args.amount,
    };
    let report = reconciler.reconcile(&note, context).await?;

    println!(
        "{}",
        formatter.format_report(&report, config.matching.persist_top)?
    );
    Ok(())
}
