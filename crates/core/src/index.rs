//! VectorIndex trait — the abstraction over the similarity index.
//!
//! The index stores embedded document chunks and answers top-K
//! nearest-neighbor queries, optionally scoped to one tenant. The
//! retrieval gateway treats it as best-effort context enrichment.

use crate::error::IndexError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A chunk returned by a similarity query. Transient; produced per-query
/// and never persisted independently of the prompt that used it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// The chunk text.
    pub text: String,

    /// Similarity score, best-first ordering is descending.
    pub score: f32,

    /// Source document id.
    pub document_id: String,

    /// Owning tenant/user id.
    pub user_id: String,
}

/// A vector stored in the index with its retrieval metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedVector {
    /// Unique vector id (conventionally `{doc_id}-{chunk_index}`).
    pub id: String,

    /// The embedding.
    pub values: Vec<f32>,

    /// The chunk text this vector was computed from.
    pub chunk_text: String,

    /// Source document id.
    pub document_id: String,

    /// Owning tenant/user id.
    pub user_id: String,
}

/// The core VectorIndex trait.
///
/// Implementations: in-memory (tests, single-node), remote HTTP index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// The index backend name (e.g., "in_memory", "remote").
    fn name(&self) -> &str;

    /// Query the top-K nearest chunks to `vector`, best-first.
    ///
    /// When `tenant` is supplied, results MUST be scoped to that tenant;
    /// cross-tenant leakage is a correctness bug.
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        tenant: Option<&str>,
    ) -> std::result::Result<Vec<RetrievedChunk>, IndexError>;

    /// Insert or replace vectors by id.
    async fn upsert(
        &self,
        vectors: Vec<IndexedVector>,
    ) -> std::result::Result<(), IndexError>;

    /// Delete vectors by id.
    async fn delete(&self, ids: &[String]) -> std::result::Result<(), IndexError>;
}
