//! Company command implementation.

use super::read_note;
use crate::cli::NoteArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use crate::services::Services;
use tally_matcher::LineClassifier;

/// Execute the company command.
pub async fn execute_company(args: NoteArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let note = read_note(&args)?;
    let services = Services::load(config).await?;

    let lines = LineClassifier::new().classify(&note);
    let company = services.company_extractor().extract(&note, &lines).await?;

    println!("{}", formatter.format_company(company.as_ref())?);
    Ok(())
}
