//! Retrieval gateway — embed the query, ask the index for neighbors.
//!
//! Retrieval is best-effort context enrichment: an index outage degrades
//! to an empty result set so the turn can proceed without grounding.
//! An embedding failure is the only error path.

use crate::embed::Embedder;
use caremind_core::error::ProviderError;
use caremind_core::index::{RetrievedChunk, VectorIndex};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct Retriever {
    embedder: Embedder,
    index: Arc<dyn VectorIndex>,
}

impl Retriever {
    pub fn new(embedder: Embedder, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Retrieve the top-K chunks most similar to `query`, best-first.
    ///
    /// When `tenant` is supplied, results are scoped to that tenant.
    pub async fn retrieve(
        &self,
        embedding_model: &str,
        query: &str,
        tenant: Option<&str>,
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, ProviderError> {
        let vector = self.embedder.embed(embedding_model, query).await?;

        match self.index.query(&vector, top_k, tenant).await {
            Ok(chunks) => {
                debug!(
                    index = self.index.name(),
                    count = chunks.len(),
                    "Retrieved context chunks"
                );
                Ok(chunks)
            }
            Err(e) => {
                warn!(index = self.index.name(), error = %e, "Index query failed; continuing without context");
                Ok(Vec::new())
            }
        }
    }
}
