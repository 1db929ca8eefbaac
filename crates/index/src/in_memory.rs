//! In-memory vector index — useful for testing and single-node setups.

use async_trait::async_trait;
use caremind_core::error::IndexError;
use caremind_core::index::{IndexedVector, RetrievedChunk, VectorIndex};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::vector::cosine_similarity;

/// An in-memory index that stores vectors in a Vec and ranks them by
/// brute-force cosine similarity. Useful for testing and deployments
/// where a remote index isn't needed.
pub struct InMemoryIndex {
    vectors: Arc<RwLock<Vec<IndexedVector>>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            vectors: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn len(&self) -> usize {
        self.vectors.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.vectors.read().await.is_empty()
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        tenant: Option<&str>,
    ) -> Result<Vec<RetrievedChunk>, IndexError> {
        let vectors = self.vectors.read().await;

        let mut results: Vec<RetrievedChunk> = vectors
            .iter()
            .filter(|v| tenant.map_or(true, |t| v.user_id == t))
            .map(|v| RetrievedChunk {
                text: v.chunk_text.clone(),
                score: cosine_similarity(vector, &v.values),
                document_id: v.document_id.clone(),
                user_id: v.user_id.clone(),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(top_k);

        Ok(results)
    }

    async fn upsert(&self, new: Vec<IndexedVector>) -> Result<(), IndexError> {
        let mut vectors = self.vectors.write().await;
        for v in new {
            if let Some(existing) = vectors.iter_mut().find(|e| e.id == v.id) {
                *existing = v;
            } else {
                vectors.push(v);
            }
        }
        Ok(())
    }

    async fn delete(&self, ids: &[String]) -> Result<(), IndexError> {
        let mut vectors = self.vectors.write().await;
        vectors.retain(|v| !ids.contains(&v.id));
        Ok(())
    }
}
