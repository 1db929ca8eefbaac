//! # caremind Core
//!
//! Domain types, traits, and error definitions for the caremind assistant
//! backend. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (language model, vector index, document
//! store, admin config) is defined as a trait here. Implementations live in
//! their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod index;
pub mod message;
pub mod model_config;
pub mod provider;
pub mod reply;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use index::{IndexedVector, RetrievedChunk, VectorIndex};
pub use message::{
    Conversation, ConversationId, Message, MessageContent, MessagePart, Role, SessionId,
};
pub use model_config::{ModelConfig, ModelConfigSource, SharedModelConfig};
pub use provider::{CompletionRequest, CompletionResponse, EmbeddingRequest, Provider};
pub use reply::{ChatReply, SpecialistCard, SpecialistReply, TurnOutcome};
pub use store::{ConversationStore, ConversationSummary, SessionStore, SpecialistQueryEntry};
