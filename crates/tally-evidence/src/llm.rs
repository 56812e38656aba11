//! Blocking-pool bridge for the synchronous LLM capability

use crate::error::EvidenceError;
use std::fmt::Display;
use std::sync::Arc;
use tally_domain::traits::LlmProvider;
use tally_domain::ModelSettings;

/// Run one generation on the blocking pool
pub(crate) async fn generate<L>(
    llm: &Arc<L>,
    prompt: String,
    settings: &ModelSettings,
) -> Result<String, EvidenceError>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
{
    let llm = Arc::clone(llm);
    let settings = settings.clone();

    // LlmProvider is not async
    tokio::task::spawn_blocking(move || {
        llm.generate(&prompt, &settings)
            .map_err(|e| EvidenceError::Llm(e.to_string()))
    })
    .await
    .map_err(|e| EvidenceError::Llm(format!("Task join error: {}", e)))?
}
