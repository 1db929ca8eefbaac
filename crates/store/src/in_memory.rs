//! In-memory store — useful for testing and ephemeral deployments.

use async_trait::async_trait;
use caremind_core::error::StoreError;
use caremind_core::message::{Conversation, ConversationId, Message, SessionId};
use caremind_core::store::{
    ConversationStore, ConversationSummary, SessionStore, SpecialistQueryEntry,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// An in-memory store backing both conversations and specialist sessions.
/// Useful for testing and deployments where persistence isn't needed.
pub struct InMemoryStore {
    conversations: Arc<RwLock<HashMap<String, Conversation>>>,
    sessions: Arc<RwLock<HashMap<(String, String), Vec<SpecialistQueryEntry>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            conversations: Arc::new(RwLock::new(HashMap::new())),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn get(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError> {
        Ok(self.conversations.read().await.get(&id.0).cloned())
    }

    async fn insert(&self, conversation: Conversation) -> Result<(), StoreError> {
        self.conversations
            .write()
            .await
            .insert(conversation.id.0.clone(), conversation);
        Ok(())
    }

    async fn append_messages(
        &self,
        id: &ConversationId,
        messages: Vec<Message>,
        title: Option<&str>,
    ) -> Result<bool, StoreError> {
        let mut conversations = self.conversations.write().await;
        match conversations.get_mut(&id.0) {
            Some(conv) => {
                for message in messages {
                    conv.push(message);
                }
                if let Some(title) = title {
                    conv.title = Some(title.to_string());
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<ConversationSummary>, StoreError> {
        let conversations = self.conversations.read().await;
        let mut summaries: Vec<ConversationSummary> = conversations
            .values()
            .filter(|c| c.user_id == user_id)
            .map(|c| ConversationSummary {
                id: c.id.clone(),
                title: c.title.clone(),
                created_at: c.created_at,
            })
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    async fn delete(&self, id: &ConversationId) -> Result<bool, StoreError> {
        Ok(self.conversations.write().await.remove(&id.0).is_some())
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn create_session(
        &self,
        user_email: &str,
        session_id: &SessionId,
    ) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .entry((user_email.to_string(), session_id.0.clone()))
            .or_default();
        Ok(())
    }

    async fn append_entry(
        &self,
        user_email: &str,
        session_id: &SessionId,
        entry: SpecialistQueryEntry,
    ) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .entry((user_email.to_string(), session_id.0.clone()))
            .or_default()
            .push(entry);
        Ok(())
    }

    async fn get_entries(
        &self,
        user_email: &str,
        session_id: &SessionId,
    ) -> Result<Option<Vec<SpecialistQueryEntry>>, StoreError> {
        Ok(self
            .sessions
            .read()
            .await
            .get(&(user_email.to_string(), session_id.0.clone()))
            .cloned())
    }
}
