//! Document ingestion: chunk, embed, upsert.
//!
//! Unlike retrieval, ingestion is an offline path — errors propagate
//! instead of degrading.

use crate::embed::Embedder;
use caremind_core::error::Result;
use caremind_core::index::{IndexedVector, VectorIndex};
use caremind_index::chunking::{self, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
use std::sync::Arc;
use tracing::info;

pub struct Ingestor {
    embedder: Embedder,
    index: Arc<dyn VectorIndex>,
    chunk_size: usize,
    overlap: usize,
}

impl Ingestor {
    pub fn new(embedder: Embedder, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embedder,
            index,
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }

    pub fn with_chunking(mut self, chunk_size: usize, overlap: usize) -> Self {
        self.chunk_size = chunk_size;
        self.overlap = overlap;
        self
    }

    /// Ingest a document for a tenant: split into overlapping chunks,
    /// embed each, and upsert into the index as `{doc_id}-{i}` vectors.
    /// Returns the number of chunks indexed.
    pub async fn ingest_document(
        &self,
        embedding_model: &str,
        document_id: &str,
        text: &str,
        user_id: &str,
    ) -> Result<usize> {
        let chunks = chunking::chunk_text(text, self.chunk_size, self.overlap);
        if chunks.is_empty() {
            return Ok(0);
        }

        let embeddings = self.embedder.embed_batch(embedding_model, &chunks).await?;

        let vectors: Vec<IndexedVector> = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (chunk_text, values))| IndexedVector {
                id: format!("{document_id}-{i}"),
                values,
                chunk_text,
                document_id: document_id.to_string(),
                user_id: user_id.to_string(),
            })
            .collect();

        let count = vectors.len();
        self.index.upsert(vectors).await?;

        info!(document = document_id, chunks = count, "Document ingested");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::SequentialMockProvider;
    use caremind_index::InMemoryIndex;

    fn ingestor(index: Arc<InMemoryIndex>) -> Ingestor {
        let embedder = Embedder::new(Arc::new(SequentialMockProvider::new(vec![])));
        Ingestor::new(embedder, index)
    }

    #[tokio::test]
    async fn ingest_indexes_all_chunks() {
        let index = Arc::new(InMemoryIndex::new());
        let ing = ingestor(index.clone()).with_chunking(40, 10);

        let count = ing
            .ingest_document(
                "text-embedding-3-small",
                "doc-1",
                &"fasting guidance ".repeat(10),
                "user-1",
            )
            .await
            .unwrap();

        assert!(count > 1);
        assert_eq!(index.len().await, count);
    }

    #[tokio::test]
    async fn empty_document_is_zero_chunks() {
        let index = Arc::new(InMemoryIndex::new());
        let ing = ingestor(index.clone());
        let count = ing
            .ingest_document("text-embedding-3-small", "doc-1", "", "user-1")
            .await
            .unwrap();
        assert_eq!(count, 0);
        assert!(index.is_empty().await);
    }

    #[tokio::test]
    async fn reingest_replaces_by_id() {
        let index = Arc::new(InMemoryIndex::new());
        let ing = ingestor(index.clone()).with_chunking(400, 50);

        ing.ingest_document("text-embedding-3-small", "doc-1", "short text", "user-1")
            .await
            .unwrap();
        ing.ingest_document("text-embedding-3-small", "doc-1", "revised text", "user-1")
            .await
            .unwrap();

        assert_eq!(index.len().await, 1);
    }
}
