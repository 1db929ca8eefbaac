//! Conversation state manager.
//!
//! Wraps the `ConversationStore` with the turn-level semantics the
//! orchestrator needs: upsert-or-create on append, NotFound on reads of
//! missing conversations. Concurrent turns on the same conversation are
//! last-writer-wins; there is no per-conversation lock.

use caremind_core::error::{Error, Result};
use caremind_core::message::{Conversation, ConversationId, Message};
use caremind_core::store::{ConversationStore, ConversationSummary};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct StateManager {
    store: Arc<dyn ConversationStore>,
}

impl StateManager {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    /// Append a turn's messages to a conversation, creating the record
    /// when no conversation with this id exists yet.
    pub async fn append_turn(
        &self,
        id: &ConversationId,
        user_id: &str,
        messages: Vec<Message>,
        title: Option<&str>,
    ) -> Result<()> {
        if self
            .store
            .append_messages(id, messages.clone(), title)
            .await?
        {
            debug!(conversation = %id, "Appended turn to existing conversation");
            return Ok(());
        }

        let mut conversation = Conversation::new(user_id);
        conversation.id = id.clone();
        conversation.title = title.map(str::to_string);
        for message in messages {
            conversation.push(message);
        }
        self.store.insert(conversation).await?;
        debug!(conversation = %id, "Created conversation on first turn");
        Ok(())
    }

    /// The ordered message history of a conversation.
    pub async fn get_history(&self, id: &ConversationId) -> Result<Vec<Message>> {
        let conversation = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found("conversation", id.to_string()))?;
        Ok(conversation.messages)
    }

    /// Conversation summaries for a user, newest-first.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<ConversationSummary>> {
        Ok(self.store.list_for_user(user_id).await?)
    }

    /// Delete a conversation. NotFound when no record matches.
    pub async fn delete(&self, id: &ConversationId) -> Result<()> {
        if self.store.delete(id).await? {
            Ok(())
        } else {
            Err(Error::not_found("conversation", id.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caremind_store::InMemoryStore;

    fn state() -> StateManager {
        StateManager::new(Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn first_turn_creates_conversation() {
        let state = state();
        let id = ConversationId::new();

        state
            .append_turn(
                &id,
                "user-1",
                vec![Message::user("hi"), Message::assistant("hello")],
                Some("Greeting"),
            )
            .await
            .unwrap();

        let history = state.get_history(&id).await.unwrap();
        assert_eq!(history.len(), 2);

        let summaries = state.list_for_user("user-1").await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].title.as_deref(), Some("Greeting"));
    }

    #[tokio::test]
    async fn second_turn_appends_in_order() {
        let state = state();
        let id = ConversationId::new();

        state
            .append_turn(
                &id,
                "user-1",
                vec![Message::user("one"), Message::assistant("two")],
                Some("T1"),
            )
            .await
            .unwrap();
        state
            .append_turn(
                &id,
                "user-1",
                vec![Message::user("three"), Message::assistant("four")],
                Some("T2"),
            )
            .await
            .unwrap();

        let history = state.get_history(&id).await.unwrap();
        let texts: Vec<String> = history.iter().map(|m| m.content.flatten()).collect();
        assert_eq!(texts, vec!["one", "two", "three", "four"]);
    }

    #[tokio::test]
    async fn history_of_missing_conversation_is_not_found() {
        let state = state();
        let err = state
            .get_history(&ConversationId::from("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let state = state();
        let err = state
            .delete(&ConversationId::from("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
