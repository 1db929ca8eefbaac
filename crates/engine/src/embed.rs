//! Embedding gateway — wraps the provider's embedding endpoint.

use caremind_core::error::ProviderError;
use caremind_core::provider::{EmbeddingRequest, Provider};
use std::sync::Arc;
use tracing::debug;

/// Embeds query and document text through the configured provider.
///
/// The embedding model is passed per call; it comes from the admin
/// config fetched at the top of each turn.
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn Provider>,
}

impl Embedder {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }

    /// Embed a single text. Empty or whitespace-only text is rejected
    /// locally without a provider round trip.
    pub async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>, ProviderError> {
        if text.trim().is_empty() {
            return Err(ProviderError::EmbeddingFailed(
                "cannot embed empty text".into(),
            ));
        }

        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: model.to_string(),
                inputs: vec![text.to_string()],
            })
            .await?;

        response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::EmbeddingFailed("provider returned no embedding".into()))
    }

    /// Embed a batch of texts, preserving order.
    pub async fn embed_batch(
        &self,
        model: &str,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(model, count = texts.len(), "Embedding batch");

        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: model.to_string(),
                inputs: texts.to_vec(),
            })
            .await?;

        if response.embeddings.len() != texts.len() {
            return Err(ProviderError::EmbeddingFailed(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                response.embeddings.len()
            )));
        }

        Ok(response.embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::SequentialMockProvider;

    #[tokio::test]
    async fn embed_returns_vector() {
        let embedder = Embedder::new(Arc::new(SequentialMockProvider::new(vec![])));
        let vector = embedder
            .embed("text-embedding-3-small", "stomach pain")
            .await
            .unwrap();
        assert!(!vector.is_empty());
    }

    #[tokio::test]
    async fn empty_text_rejected_without_provider_call() {
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let embedder = Embedder::new(provider.clone());

        let err = embedder
            .embed("text-embedding-3-small", "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::EmbeddingFailed(_)));
        assert_eq!(provider.embed_calls(), 0);
    }

    #[tokio::test]
    async fn batch_preserves_count() {
        let embedder = Embedder::new(Arc::new(SequentialMockProvider::new(vec![])));
        let texts: Vec<String> = vec!["one".into(), "two".into(), "three".into()];
        let vectors = embedder
            .embed_batch("text-embedding-3-small", &texts)
            .await
            .unwrap();
        assert_eq!(vectors.len(), 3);
    }

    #[tokio::test]
    async fn empty_batch_short_circuits() {
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let embedder = Embedder::new(provider.clone());
        let vectors = embedder
            .embed_batch("text-embedding-3-small", &[])
            .await
            .unwrap();
        assert!(vectors.is_empty());
        assert_eq!(provider.embed_calls(), 0);
    }
}
