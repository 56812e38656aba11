//! Match command implementation.

use super::read_note;
use crate::cli::NoteArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use crate::services::Services;
use tally_matcher::LineClassifier;

/// Execute the match command.
pub async fn execute_match(args: NoteArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let note = read_note(&args)?;
    let services = Services::load(config).await?;
    let history = services.load_history(config).await?;
    let orchestrator = services.orchestrator(&history, config);

    let lines = LineClassifier::new().classify(&note);
    let matches = orchestrator.match_lines(&lines).await;

    println!(
        "{}",
        formatter.format_line_matches(&matches, config.matching.persist_top)?
    );
    Ok(())
}
