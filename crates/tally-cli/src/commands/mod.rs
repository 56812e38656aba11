//! Command implementations.

pub mod classify;
pub mod company;
pub mod config;
pub mod evidence;
pub mod matching;
pub mod reconcile;

pub use self::classify::execute_classify;
pub use self::company::execute_company;
pub use self::config::execute_config;
pub use self::evidence::execute_evidence;
pub use self::matching::execute_match;
pub use self::reconcile::execute_reconcile;

use crate::cli::NoteArgs;
use crate::error::{CliError, Result};
use std::io::Read;
use std::path::Path;

/// Read the note from the argument, a file, or stdin.
pub fn read_note(args: &NoteArgs) -> Result<String> {
    let text = match (&args.text, &args.file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) if path == Path::new("-") => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => {
            return Err(CliError::InvalidInput(
                "provide the note text or --file".to_string(),
            ))
        }
    };

    if text.trim().is_empty() {
        return Err(CliError::InvalidInput("note is empty".to_string()));
    }
    Ok(text)
}
