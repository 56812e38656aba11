//! Tally LLM Provider Layer
//!
//! Pluggable language-model and embedding providers.
//!
//! # Architecture
//!
//! This crate provides implementations of the `LlmProvider` and
//! `EmbeddingModel` traits from `tally-domain`. The traits are synchronous;
//! callers in the matcher and evidence crates drive them from
//! `tokio::task::spawn_blocking`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OllamaProvider`: Local Ollama text generation
//! - `OllamaEmbedder`: Ollama embeddings, used as the external embedding strategy
//!
//! # Examples
//!
//! ```
//! use tally_llm::MockProvider;
//! use tally_domain::traits::LlmProvider;
//! use tally_domain::ModelSettings;
//!
//! let provider = MockProvider::new("ACME");
//! let result = provider.generate("test prompt", &ModelSettings::default()).unwrap();
//! assert_eq!(result, "ACME");
//! ```

#![warn(missing_docs)]

pub mod embedder;
pub mod ollama;

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tally_domain::traits::LlmProvider as LlmProviderTrait;
use tally_domain::ModelSettings;
use thiserror::Error;

pub use embedder::{OllamaEmbedder, DEFAULT_EMBEDDING_MODEL};
pub use ollama::{OllamaProvider, DEFAULT_ENDPOINT};

/// Provider failures
#[derive(Error, Debug)]
pub enum LlmError {
    /// Transport failure talking to the model server
    #[error("Communication error: {0}")]
    Communication(String),

    /// Server answered with something unusable
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Requested model is not pulled on the server
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Anything else
    #[error("LLM error: {0}")]
    Other(String),
}

/// Run an async provider call from synchronous trait code
///
/// Inside a `spawn_blocking` thread the ambient runtime handle is reused;
/// outside any runtime a throwaway current-thread runtime is built.
pub(crate) fn block_on<F, T>(future: F) -> Result<T, LlmError>
where
    F: Future<Output = Result<T, LlmError>>,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle.block_on(future),
        Err(_) => tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| LlmError::Other(format!("Failed to start runtime: {}", e)))?
            .block_on(future),
    }
}

/// Scripted reply for a prompt rule
#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail,
}

#[derive(Debug, Default)]
struct Script {
    exact: HashMap<String, Reply>,
    containing: Vec<(String, Reply)>,
    calls: Vec<(String, String)>,
}

/// Deterministic offline provider
///
/// Replies are scripted per exact prompt or per substring, which suits
/// prompts that embed a whole payment note. Exact rules win; substring rules
/// are tried in insertion order; anything else gets the default reply.
/// Clones share the script and the call log.
///
/// ```
/// use tally_llm::MockProvider;
/// use tally_domain::traits::LlmProvider;
/// use tally_domain::ModelSettings;
///
/// let settings = ModelSettings::default();
/// let mut provider = MockProvider::new("NONE");
/// provider.add_response("BO1:ACME", "ACME");
/// provider.add_response_containing("**Cost Center**", "**Cost Center**: CC-100");
///
/// assert_eq!(provider.generate("BO1:ACME", &settings).unwrap(), "ACME");
/// assert_eq!(provider.generate("fill **Cost Center**", &settings).unwrap(), "**Cost Center**: CC-100");
/// assert_eq!(provider.generate("anything", &settings).unwrap(), "NONE");
/// assert_eq!(provider.call_count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    script: Arc<Mutex<Script>>,
    offline: bool,
}

impl MockProvider {
    /// Provider answering every unscripted prompt with `response`
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            script: Arc::new(Mutex::new(Script::default())),
            offline: false,
        }
    }

    /// Provider whose every call fails with a communication error
    pub fn failing() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    /// Reply to exactly `prompt`
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        self.with_script(|script| {
            script.exact.insert(prompt.into(), Reply::Text(response.into()));
        });
    }

    /// Reply to any prompt containing `needle`
    pub fn add_response_containing(&mut self, needle: impl Into<String>, response: impl Into<String>) {
        self.with_script(|script| script.containing.push((needle.into(), Reply::Text(response.into()))));
    }

    /// Fail on exactly `prompt`
    pub fn add_error(&mut self, prompt: impl Into<String>) {
        self.with_script(|script| {
            script.exact.insert(prompt.into(), Reply::Fail);
        });
    }

    /// Number of `generate` calls so far
    pub fn call_count(&self) -> usize {
        self.with_script(|script| script.calls.len())
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.with_script(|script| script.calls.iter().map(|(prompt, _)| prompt.clone()).collect())
    }

    /// Model names received so far
    pub fn models(&self) -> Vec<String> {
        self.with_script(|script| script.calls.iter().map(|(_, model)| model.clone()).collect())
    }

    fn with_script<T>(&self, f: impl FnOnce(&mut Script) -> T) -> T {
        let mut script = self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut script)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str, settings: &ModelSettings) -> Result<String, Self::Error> {
        let reply = self.with_script(|script| {
            script.calls.push((prompt.to_string(), settings.model.clone()));
            script.exact.get(prompt).cloned().or_else(|| {
                script
                    .containing
                    .iter()
                    .find(|(needle, _)| prompt.contains(needle.as_str()))
                    .map(|(_, reply)| reply.clone())
            })
        });

        if self.offline {
            return Err(LlmError::Communication("Mock provider offline".to_string()));
        }
        match reply {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Fail) => Err(LlmError::Other("Mock error".to_string())),
            None => Ok(self.default_response.clone()),
        }
    }
}
