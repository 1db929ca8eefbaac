//! Storage traits for conversations and specialist sessions.
//!
//! The document store is an external, multi-tenant collaborator; these
//! traits capture the operations the state manager and specialist engine
//! need. Implementations: in-memory (tests, single-node), SQLite.

use crate::error::StoreError;
use crate::message::{Conversation, ConversationId, Message, SessionId};
use crate::reply::SpecialistReply;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A lightweight conversation listing row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One append-only record in a specialist session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialistQueryEntry {
    /// The user's query text.
    pub query: String,

    /// Names recommended by this invocation.
    pub recommended: Vec<String>,

    /// The full structured response that was returned.
    pub response: SpecialistReply,

    /// When this entry was appended.
    pub timestamp: DateTime<Utc>,
}

/// Persistent conversation storage.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// The backend name (e.g., "in_memory", "sqlite").
    fn name(&self) -> &str;

    /// Fetch a conversation by id.
    async fn get(
        &self,
        id: &ConversationId,
    ) -> std::result::Result<Option<Conversation>, StoreError>;

    /// Insert a new conversation record.
    async fn insert(&self, conversation: Conversation) -> std::result::Result<(), StoreError>;

    /// Append messages to an existing conversation, updating its title
    /// (when given) and last-update time. Returns false when no record
    /// matches the id.
    async fn append_messages(
        &self,
        id: &ConversationId,
        messages: Vec<Message>,
        title: Option<&str>,
    ) -> std::result::Result<bool, StoreError>;

    /// List conversation summaries for a user, newest-first by creation.
    async fn list_for_user(
        &self,
        user_id: &str,
    ) -> std::result::Result<Vec<ConversationSummary>, StoreError>;

    /// Delete a conversation. Returns false when no record matches.
    async fn delete(&self, id: &ConversationId) -> std::result::Result<bool, StoreError>;
}

/// Persistent specialist-session storage, keyed by (user email, session id).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create an empty session record.
    async fn create_session(
        &self,
        user_email: &str,
        session_id: &SessionId,
    ) -> std::result::Result<(), StoreError>;

    /// Append an entry to a session, creating the record when absent.
    /// Entries are append-only; sessions accumulate monotonically.
    async fn append_entry(
        &self,
        user_email: &str,
        session_id: &SessionId,
        entry: SpecialistQueryEntry,
    ) -> std::result::Result<(), StoreError>;

    /// All entries of a session in append order, or None when the
    /// session does not exist.
    async fn get_entries(
        &self,
        user_email: &str,
        session_id: &SessionId,
    ) -> std::result::Result<Option<Vec<SpecialistQueryEntry>>, StoreError>;
}
