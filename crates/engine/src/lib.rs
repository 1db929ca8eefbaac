//! # caremind Engine
//!
//! The conversational RAG orchestrator and specialist-matching engine.
//!
//! One turn flows through: admin config fetch → tenant-scoped retrieval →
//! context assembly → token budget check → model invocation → strict
//! schema validation with deterministic fallbacks → background
//! persistence of the turn pair.

pub mod assembler;
pub mod chat;
pub mod contract;
pub mod embed;
pub mod ingest;
pub mod persist;
pub mod retrieve;
pub mod specialist;
pub mod state;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod token;

pub use chat::ChatOrchestrator;
pub use embed::Embedder;
pub use ingest::Ingestor;
pub use retrieve::Retriever;
pub use specialist::{default_similarity, SimilarityFn, SpecialistEngine};
pub use state::StateManager;
