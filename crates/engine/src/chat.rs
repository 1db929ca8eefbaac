//! Chat orchestrator — one conversational turn end to end.
//!
//! Pipeline: fetch admin config → retrieve context for the latest user
//! message (tenant-scoped) → load prior history → assemble → budget
//! check → invoke and validate → enqueue persistence → return the
//! structured outcome.

use crate::assembler::ContextAssembler;
use crate::contract::{self, FALLBACK_TITLE};
use crate::embed::Embedder;
use crate::persist::{PersistQueue, TurnWrite};
use crate::retrieve::Retriever;
use crate::state::StateManager;
use crate::token;
use caremind_core::error::Result;
use caremind_core::index::{RetrievedChunk, VectorIndex};
use caremind_core::message::{ConversationId, Message, Role};
use caremind_core::model_config::ModelConfigSource;
use caremind_core::provider::{CompletionRequest, Provider};
use caremind_core::reply::TurnOutcome;
use std::sync::Arc;
use tracing::{info, warn};

/// Returned instead of a model reply when the prompt cannot fit the
/// model's context window.
pub const BUDGET_EXCEEDED_REPLY: &str =
    "Your message is too large for the current model. Please shorten it and try again.";

/// How many chunks to request from the index per turn.
pub const DEFAULT_TOP_K: usize = 5;

pub struct ChatOrchestrator {
    provider: Arc<dyn Provider>,
    config_source: Arc<dyn ModelConfigSource>,
    retriever: Retriever,
    assembler: ContextAssembler,
    state: StateManager,
    persist: PersistQueue,
    top_k: usize,
}

impl ChatOrchestrator {
    pub fn new(
        provider: Arc<dyn Provider>,
        index: Arc<dyn VectorIndex>,
        store: Arc<dyn caremind_core::store::ConversationStore>,
        config_source: Arc<dyn ModelConfigSource>,
    ) -> Self {
        let embedder = Embedder::new(provider.clone());
        let state = StateManager::new(store);
        let persist = PersistQueue::spawn(state.clone());
        Self {
            provider,
            config_source,
            retriever: Retriever::new(embedder, index),
            assembler: ContextAssembler::default(),
            state,
            persist,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Override retrieval fan-out and prompt chunk cap.
    pub fn with_retrieval(mut self, top_k: usize, keep: usize) -> Self {
        self.top_k = top_k;
        self.assembler = ContextAssembler::new(keep);
        self
    }

    /// Conversation reads and deletes share the orchestrator's store.
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Block until all enqueued turn writes have landed.
    pub async fn wait_idle(&self) {
        self.persist.wait_idle().await;
    }

    /// Handle one conversational turn.
    ///
    /// `messages` is the incoming turn (normally a single user message).
    /// Without a `conversation_id` a new conversation is started and its
    /// id returned in the outcome.
    pub async fn handle_turn(
        &self,
        messages: Vec<Message>,
        user_id: &str,
        conversation_id: Option<ConversationId>,
    ) -> Result<TurnOutcome> {
        let config = self.config_source.fetch().await?;

        let query = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.flatten())
            .unwrap_or_default();

        let chunks = self
            .retrieve_context(&config.embedding_model, &query, user_id)
            .await;

        let history = match &conversation_id {
            Some(id) => self.state.get_history(id).await.unwrap_or_default(),
            None => Vec::new(),
        };

        let assembled =
            self.assembler
                .assemble(&config.instructions, &chunks, &history, &messages);

        let conversation_id = conversation_id.unwrap_or_default();

        if let Err(e) = token::check_budget(&assembled, &config.model, config.max_output_tokens) {
            warn!(conversation = %conversation_id, error = %e, "Prompt over budget; short-circuiting turn");
            let outcome = TurnOutcome {
                reply: BUDGET_EXCEEDED_REPLY.into(),
                chat_title: FALLBACK_TITLE.into(),
                conversation_id: conversation_id.clone(),
            };
            self.persist_turn(&outcome, user_id, messages).await;
            return Ok(outcome);
        }

        let response = self
            .provider
            .complete(CompletionRequest {
                model: config.model.clone(),
                messages: assembled,
                temperature: config.temperature,
                max_tokens: Some(config.max_output_tokens),
            })
            .await?;

        let reply = contract::parse_chat_reply(&response.content);

        info!(
            conversation = %conversation_id,
            model = %response.model,
            chunks = chunks.len(),
            "Turn completed"
        );

        let outcome = TurnOutcome {
            reply: reply.reply,
            chat_title: reply.chat_title,
            conversation_id: conversation_id.clone(),
        };
        self.persist_turn(&outcome, user_id, messages).await;
        Ok(outcome)
    }

    /// Best-effort retrieval: any failure degrades to an empty context.
    async fn retrieve_context(
        &self,
        embedding_model: &str,
        query: &str,
        user_id: &str,
    ) -> Vec<RetrievedChunk> {
        if query.trim().is_empty() {
            return Vec::new();
        }
        match self
            .retriever
            .retrieve(embedding_model, query, Some(user_id), self.top_k)
            .await
        {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!(error = %e, "Query embedding failed; continuing without context");
                Vec::new()
            }
        }
    }

    async fn persist_turn(&self, outcome: &TurnOutcome, user_id: &str, mut turn: Vec<Message>) {
        turn.push(Message::assistant(outcome.reply.clone()));
        self.persist
            .enqueue(TurnWrite {
                conversation_id: outcome.conversation_id.clone(),
                user_id: user_id.to_string(),
                messages: turn,
                title: Some(outcome.chat_title.clone()),
            })
            .await;
    }
}
