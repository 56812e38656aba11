//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tally_domain::ModelSettings;
use tally_evidence::EvidenceConfig;
use tally_llm::{DEFAULT_EMBEDDING_MODEL, DEFAULT_ENDPOINT};
use tally_matcher::MatchConfig;

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Line matching
    #[serde(default)]
    pub matching: MatchConfig,

    /// Email evidence and summaries
    #[serde(default)]
    pub evidence: EvidenceConfig,

    /// Language and embedding models
    #[serde(default)]
    pub llm: LlmSettings,

    /// Fixture corpora
    #[serde(default)]
    pub corpus: CorpusSettings,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,
}

/// Language model and external embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Ollama endpoint
    pub endpoint: String,

    /// Generation model
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum tokens per answer
    pub max_tokens: u32,

    /// External embedding model
    pub embedding_model: String,

    /// Use deterministic local mocks instead of Ollama
    pub use_mock: bool,
}

/// Fixture corpus locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusSettings {
    /// Historical postings (JSON array)
    pub history: PathBuf,

    /// Cached emails (JSON array)
    pub emails: PathBuf,

    /// Dimension of the local embedding model
    pub local_dimension: usize,

    /// Dimension of the external embedding model
    pub external_dimension: usize,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".tally").join("config.toml"))
    }

    /// Load configuration from `path`, or the default path, or defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::path()?,
        };

        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from a file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `path`, or the default path.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::path()?,
        };

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, self.to_toml()?)?;
        Ok(path)
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.matching.validate().map_err(CliError::Config)?;
        self.evidence.validate()?;
        if self.corpus.local_dimension == 0 || self.corpus.external_dimension == 0 {
            return Err(CliError::Config("embedding dimensions must be greater than 0".into()));
        }
        if self.llm.max_tokens == 0 {
            return Err(CliError::Config("llm.max_tokens must be greater than 0".into()));
        }
        Ok(())
    }

    /// Model settings passed to every LLM call.
    pub fn model_settings(&self) -> ModelSettings {
        ModelSettings::new(self.llm.model.clone())
            .with_temperature(self.llm.temperature)
            .with_max_tokens(self.llm.max_tokens)
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: "llama3.1".to_string(),
            temperature: 0.0,
            max_tokens: 512,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            use_mock: true,
        }
    }
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self {
            history: PathBuf::from("fixtures/history.json"),
            emails: PathBuf::from("fixtures/emails.json"),
            local_dimension: 256,
            external_dimension: 768,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
