//! Classify command implementation.

use super::read_note;
use crate::cli::NoteArgs;
use crate::error::Result;
use crate::output::Formatter;
use tally_matcher::LineClassifier;

/// Execute the classify command.
pub fn execute_classify(args: NoteArgs, formatter: &Formatter) -> Result<()> {
    let note = read_note(&args)?;
    let lines = LineClassifier::new().classify(&note);
    println!("{}", formatter.format_lines(&lines)?);
    Ok(())
}
