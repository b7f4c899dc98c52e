//! Configuration for the evaluation harness.
//!
//! Supports both environment variables and YAML config file.
//! Environment variables take precedence over config file values.

use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Generation model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Base URL for the generation API (e.g., "https://api.openai.com")
    pub api_base: String,

    /// API key for authentication
    pub api_key: String,

    /// Model name (e.g., "Qwen/Qwen3-0.6B")
    pub model: String,

    /// Maximum context length the model supports, in tokens
    #[serde(default = "default_max_model_tokens")]
    pub max_model_tokens: u32,

    /// Temperature for sampling
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Nucleus sampling threshold
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Whether to sample; greedy decoding when false
    #[serde(default = "default_do_sample")]
    pub do_sample: bool,
}

fn default_max_model_tokens() -> u32 {
    2048
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

fn default_do_sample() -> bool {
    true
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            api_key: String::new(),
            model: String::new(),
            max_model_tokens: default_max_model_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            do_sample: default_do_sample(),
        }
    }
}

/// Generation-length budgeting policy.
///
/// The margin and floor were tuning constants in earlier iterations of this
/// tool; they are configurable here rather than hardcoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetSettings {
    /// Tokens held back from the context window on top of the prompt length
    #[serde(default = "default_reserved_margin")]
    pub reserved_margin: u32,

    /// Guaranteed minimum generation allowance, in tokens
    #[serde(default = "default_floor")]
    pub floor: u32,
}

fn default_reserved_margin() -> u32 {
    10
}

fn default_floor() -> u32 {
    100
}

impl Default for BudgetSettings {
    fn default() -> Self {
        Self {
            reserved_margin: default_reserved_margin(),
            floor: default_floor(),
        }
    }
}

/// Embedding model configuration for similarity scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Hugging Face model id of the sentence embedding model
    #[serde(default = "default_embedding_model")]
    pub model_id: String,
}

fn default_embedding_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model_id: default_embedding_model(),
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Generation model settings
    pub generation: GenerationSettings,

    /// Budgeting policy
    #[serde(default)]
    pub budget: BudgetSettings,

    /// Embedding model settings
    #[serde(default)]
    pub embedding: EmbeddingSettings,
}

/// Configuration file structure (YAML format).
#[derive(Debug, Deserialize)]
struct ConfigFile {
    generation: Option<GenerationFileSection>,
    budget: Option<BudgetFileSection>,
    embedding: Option<EmbeddingFileSection>,
}

#[derive(Debug, Deserialize)]
struct GenerationFileSection {
    api_base: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    max_model_tokens: Option<u32>,
    temperature: Option<f32>,
    top_p: Option<f32>,
    do_sample: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct BudgetFileSection {
    reserved_margin: Option<u32>,
    floor: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingFileSection {
    model_id: Option<String>,
}

impl Config {
    /// Load configuration from environment variables and optional config file.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (QA_EVAL_API_BASE, QA_EVAL_API_KEY, QA_EVAL_MODEL, ...)
    /// 2. Config file (~/.config/qa-response-evaluator/config.yaml)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        // Try to load from config file first
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                config = Self::load_from_file(&config_path)?;
            }
        }

        // Override with environment variables
        if let Ok(api_base) = env::var("QA_EVAL_API_BASE") {
            config.generation.api_base = api_base;
        }

        if let Ok(api_key) = env::var("QA_EVAL_API_KEY") {
            config.generation.api_key = api_key;
        }

        if let Ok(model) = env::var("QA_EVAL_MODEL") {
            config.generation.model = model;
        }

        if let Ok(max_tokens) = env::var("QA_EVAL_MAX_MODEL_TOKENS") {
            if let Ok(tokens) = max_tokens.parse() {
                config.generation.max_model_tokens = tokens;
            }
        }

        if let Ok(temperature) = env::var("QA_EVAL_TEMPERATURE") {
            if let Ok(temp) = temperature.parse() {
                config.generation.temperature = temp;
            }
        }

        if let Ok(model_id) = env::var("QA_EVAL_EMBEDDING_MODEL") {
            config.embedding.model_id = model_id;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;

        let file_config: ConfigFile = serde_yaml::from_str(&content)
            .map_err(|e| EvalError::Config(format!("Failed to parse config file: {}", e)))?;

        let mut config = Config::default();

        if let Some(generation) = file_config.generation {
            if let Some(api_base) = generation.api_base {
                config.generation.api_base = api_base;
            }
            if let Some(api_key) = generation.api_key {
                config.generation.api_key = api_key;
            }
            if let Some(model) = generation.model {
                config.generation.model = model;
            }
            if let Some(max_model_tokens) = generation.max_model_tokens {
                config.generation.max_model_tokens = max_model_tokens;
            }
            if let Some(temperature) = generation.temperature {
                config.generation.temperature = temperature;
            }
            if let Some(top_p) = generation.top_p {
                config.generation.top_p = top_p;
            }
            if let Some(do_sample) = generation.do_sample {
                config.generation.do_sample = do_sample;
            }
        }

        if let Some(budget) = file_config.budget {
            if let Some(reserved_margin) = budget.reserved_margin {
                config.budget.reserved_margin = reserved_margin;
            }
            if let Some(floor) = budget.floor {
                config.budget.floor = floor;
            }
        }

        if let Some(embedding) = file_config.embedding {
            if let Some(model_id) = embedding.model_id {
                config.embedding.model_id = model_id;
            }
        }

        Ok(config)
    }

    /// Get the default config file path.
    pub fn config_file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "qa-response-evaluator")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Validate that required configuration is present.
    pub fn validate(&self) -> Result<()> {
        if self.generation.api_base.is_empty() {
            return Err(EvalError::Config(
                "Generation API base URL is required. Set QA_EVAL_API_BASE environment variable or add to config file.".to_string()
            ));
        }

        if self.generation.api_key.is_empty() {
            return Err(EvalError::Config(
                "Generation API key is required. Set QA_EVAL_API_KEY environment variable or add to config file.".to_string()
            ));
        }

        if self.generation.model.is_empty() {
            return Err(EvalError::Config(
                "Generation model is required. Set QA_EVAL_MODEL environment variable or add to config file."
                    .to_string(),
            ));
        }

        if self.generation.max_model_tokens == 0 {
            return Err(EvalError::Config(
                "max_model_tokens must be greater than zero".to_string(),
            ));
        }

        if self.budget.floor == 0 {
            return Err(EvalError::Config(
                "Budget floor must be at least 1 token".to_string(),
            ));
        }

        Ok(())
    }

    /// Create a config from explicit generation values (useful for testing).
    pub fn with_generation(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            generation: GenerationSettings {
                api_base: api_base.into(),
                api_key: api_key.into(),
                model: model.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.generation.api_base.is_empty());
        assert!(config.generation.api_key.is_empty());
        assert_eq!(config.generation.max_model_tokens, 2048);
        assert_eq!(config.generation.temperature, 0.7);
        assert_eq!(config.generation.top_p, 0.9);
        assert!(config.generation.do_sample);
        assert_eq!(config.budget.reserved_margin, 10);
        assert_eq!(config.budget.floor, 100);
        assert_eq!(
            config.embedding.model_id,
            "sentence-transformers/all-MiniLM-L6-v2"
        );
    }

    #[test]
    fn test_validate_fails_without_required_fields() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_floor() {
        let mut config = Config::with_generation("https://api.example.com", "key", "qwen");
        config.budget.floor = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_with_generation() {
        let config = Config::with_generation("https://api.example.com", "test-key", "qwen");
        assert_eq!(config.generation.api_base, "https://api.example.com");
        assert_eq!(config.generation.api_key, "test-key");
        assert_eq!(config.generation.model, "qwen");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_yaml_file() {
        use std::io::Write;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "generation:\n  api_base: https://api.example.com\n  model: qwen\nbudget:\n  floor: 64"
        )
        .unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.generation.api_base, "https://api.example.com");
        assert_eq!(config.generation.model, "qwen");
        assert_eq!(config.budget.floor, 64);
        // Unspecified values keep their defaults
        assert_eq!(config.budget.reserved_margin, 10);
    }
}
