//! Shared wiring: turn an `AppConfig` into live backends.

use caremind_config::AppConfig;
use caremind_core::index::VectorIndex;
use caremind_core::model_config::{ModelConfigSource, SharedModelConfig};
use caremind_core::provider::Provider;
use caremind_core::store::{ConversationStore, SessionStore};
use caremind_index::{InMemoryIndex, RemoteIndex};
use caremind_providers::OpenAiCompatProvider;
use caremind_store::{InMemoryStore, SqliteStore};
use std::sync::Arc;

pub type CliError = Box<dyn std::error::Error>;

pub fn load_config() -> Result<AppConfig, CliError> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    CAREMIND_API_KEY = 'sk-...'");
        eprintln!("    OPENAI_API_KEY   = 'sk-...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    Ok(config)
}

pub fn build_provider(config: &AppConfig) -> Result<Arc<dyn Provider>, CliError> {
    let api_key = config.api_key.clone().unwrap_or_default();
    let provider = OpenAiCompatProvider::new("openai", &config.api_url, api_key)?;
    Ok(Arc::new(provider))
}

pub fn build_index(config: &AppConfig) -> Result<Arc<dyn VectorIndex>, CliError> {
    match config.index.backend.as_str() {
        "in_memory" => Ok(Arc::new(InMemoryIndex::new())),
        "remote" => {
            let url = config
                .index
                .url
                .clone()
                .ok_or("index.url is required for the remote backend")?;
            let api_key = config.index.api_key.clone().unwrap_or_default();
            let index = RemoteIndex::new(url, api_key, config.index.namespace.clone())?;
            Ok(Arc::new(index))
        }
        other => Err(format!("Unknown index backend: {other}").into()),
    }
}

/// Build the conversation and session stores.
///
/// Both views share one underlying store so chat history and specialist
/// sessions land in the same database file.
pub async fn build_stores(
    config: &AppConfig,
) -> Result<(Arc<dyn ConversationStore>, Arc<dyn SessionStore>), CliError> {
    match config.store.backend.as_str() {
        "sqlite" => {
            let store = Arc::new(SqliteStore::new(&config.store.path).await?);
            Ok((store.clone() as Arc<dyn ConversationStore>, store))
        }
        "in_memory" => {
            let store = Arc::new(InMemoryStore::new());
            Ok((store.clone() as Arc<dyn ConversationStore>, store))
        }
        other => Err(format!("Unknown store backend: {other}").into()),
    }
}

pub fn build_config_source(config: &AppConfig) -> Arc<dyn ModelConfigSource> {
    Arc::new(SharedModelConfig::new(config.model.clone()))
}
