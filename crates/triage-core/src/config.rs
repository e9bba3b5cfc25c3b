//! Configuration parsing for the triage pipeline

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::parser::text::{default_tiers, SeverityTier, DEFAULT_FALLBACK_GLYPH};
use crate::sanitizer::SanitizationPolicy;
use crate::validator::ValidationPolicy;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

// Main config structure. Every section is optional in the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    pub llm: LlmSettings,
    pub sanitization: SanitizationPolicy,
    pub validation: ValidationPolicy,
    pub text: TextSettings,
}

/// OpenAI-compatible chat completion endpoint and sampling policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    // e.g. Ollama's OpenAI-compatible API
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    // no timeout unless configured
    pub timeout_secs: Option<u64>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            api_key: "ollama".to_string(),
            model: "llama3.2:3b".to_string(),
            temperature: 0.3,
            max_tokens: 2000,
            top_p: 0.9,
            frequency_penalty: 0.1,
            timeout_secs: None,
        }
    }
}

// severity glyphs for plain text logs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextSettings {
    pub severity_tiers: Vec<SeverityTier>,
    pub fallback_glyph: String,
}

impl Default for TextSettings {
    fn default() -> Self {
        Self {
            severity_tiers: default_tiers(),
            fallback_glyph: DEFAULT_FALLBACK_GLYPH.to_string(),
        }
    }
}

impl TriageConfig {
    /// Apply `OLLAMA_BASE_URL`, `OLLAMA_MODEL` and `OLLAMA_API_KEY` from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("OLLAMA_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = non_empty("OLLAMA_MODEL") {
            self.llm.model = model;
        }
        if let Some(key) = non_empty("OLLAMA_API_KEY") {
            self.llm.api_key = key;
        }
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }
}

// Load configuration from a TOML file, then apply environment overrides
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<TriageConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: TriageConfig = toml::from_str(&content)?;
    config.apply_overrides(|key| std::env::var(key).ok());
    Ok(config)
}
