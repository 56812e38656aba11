//! Explicit model selection passed into every LLM call

/// Model configuration for a single generation request
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    /// Model identifier understood by the provider
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
}

impl ModelSettings {
    /// Settings for a named model with deterministic sampling
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.0,
            max_tokens: 512,
        }
    }

    /// Set the temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the token limit
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self::new("llama3.1")
    }
}
