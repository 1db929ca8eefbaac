//! Admin-controlled model configuration.
//!
//! A single mutable record read at the top of every invocation; updates
//! take effect on the next turn with no migration of past conversations.
//! Modeled as an injected source trait so orchestrators never cache it
//! across turns.

use crate::error::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// The admin-mutable model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base instruction text prepended to every system message.
    #[serde(default)]
    pub instructions: String,

    /// Target model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum output tokens per reply.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Model used for query/document embeddings.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
}

fn default_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_output_tokens() -> u32 {
    400
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            instructions: String::new(),
            model: default_model(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            embedding_model: default_embedding_model(),
        }
    }
}

/// Source of the current ModelConfig, fetched fresh once per turn.
#[async_trait]
pub trait ModelConfigSource: Send + Sync {
    async fn fetch(&self) -> std::result::Result<ModelConfig, StoreError>;
}

/// A shared in-process config source backed by an RwLock.
///
/// Admin updates through `update` become visible to the next turn.
#[derive(Clone, Default)]
pub struct SharedModelConfig {
    inner: Arc<RwLock<ModelConfig>>,
}

impl SharedModelConfig {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Replace the current config.
    pub async fn update(&self, config: ModelConfig) {
        *self.inner.write().await = config;
    }
}

#[async_trait]
impl ModelConfigSource for SharedModelConfig {
    async fn fetch(&self) -> std::result::Result<ModelConfig, StoreError> {
        Ok(self.inner.read().await.clone())
    }
}
