//! Configuration loading and validation for caremind.
//!
//! Loads configuration from `~/.caremind/config.toml` with environment
//! variable overrides. Validates all settings at startup. Runtime model
//! settings (instructions, temperature, …) are NOT here — those live in
//! the admin-mutable `ModelConfig` record and are fetched per turn.

use caremind_core::model_config::ModelConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.caremind/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the LLM/embedding service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible service
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Vector index configuration
    #[serde(default)]
    pub index: IndexConfig,

    /// Conversation/session store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Retrieval tuning
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Initial admin model settings (mutable at runtime via the admin API)
    #[serde(default)]
    pub model: ModelConfig,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("index", &self.index)
            .field("store", &self.store)
            .field("retrieval", &self.retrieval)
            .field("model", &self.model)
            .finish()
    }
}

/// Vector index selection and remote endpoint settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// "in_memory" or "remote"
    #[serde(default = "default_index_backend")]
    pub backend: String,

    /// Remote index base URL (required for backend = "remote")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Remote index API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Optional namespace all operations are scoped to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

fn default_index_backend() -> String {
    "in_memory".into()
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            backend: default_index_backend(),
            url: None,
            api_key: None,
            namespace: None,
        }
    }
}

impl std::fmt::Debug for IndexConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexConfig")
            .field("backend", &self.backend)
            .field("url", &self.url)
            .field("api_key", &redact(&self.api_key))
            .field("namespace", &self.namespace)
            .finish()
    }
}

/// Conversation/session store selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "in_memory" or "sqlite"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// SQLite database path (for backend = "sqlite")
    #[serde(default = "default_store_path")]
    pub path: String,
}

fn default_store_backend() -> String {
    "sqlite".into()
}
fn default_store_path() -> String {
    "caremind.db".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: default_store_path(),
        }
    }
}

/// Retrieval tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// How many neighbors to request from the index.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// How many of the retrieved chunks actually enter the prompt.
    #[serde(default = "default_keep")]
    pub keep: usize,
}

fn default_top_k() -> usize {
    5
}
fn default_keep() -> usize {
    3
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            keep: default_keep(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.caremind/config.toml).
    ///
    /// Also checks environment variables:
    /// - `CAREMIND_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `CAREMIND_API_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("CAREMIND_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(url) = std::env::var("CAREMIND_API_URL") {
            config.api_url = url;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".caremind")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.model.temperature < 0.0 || self.model.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "model.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.retrieval.keep == 0 || self.retrieval.keep > self.retrieval.top_k {
            return Err(ConfigError::ValidationError(
                "retrieval.keep must be between 1 and retrieval.top_k".into(),
            ));
        }

        if self.index.backend == "remote" && self.index.url.is_none() {
            return Err(ConfigError::ValidationError(
                "index.url is required when index.backend = \"remote\"".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            index: IndexConfig::default(),
            store: StoreConfig::default(),
            retrieval: RetrievalConfig::default(),
            model: ModelConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
