//! Specialist-matching engine.
//!
//! Sessions accumulate an append-only history of specialist queries.
//! Before each invocation the engine scans the recent entries for
//! similar queries and asks the model not to repeat names it already
//! recommended, so repeated symptom descriptions surface alternatives.

use crate::assembler::ContextAssembler;
use crate::contract::{self, SPECIALIST_ERROR_MESSAGE};
use crate::embed::Embedder;
use crate::retrieve::Retriever;
use caremind_core::error::{Error, Result};
use caremind_core::index::VectorIndex;
use caremind_core::message::{Message, SessionId};
use caremind_core::model_config::ModelConfigSource;
use caremind_core::provider::{CompletionRequest, Provider};
use caremind_core::reply::SpecialistReply;
use caremind_core::store::{SessionStore, SpecialistQueryEntry};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

/// How many recent session entries the dedup scan looks at.
pub const RECENT_WINDOW: usize = 5;

/// Queries shorter than this never match by containment, only exactly.
const MIN_CONTAINMENT_LEN: usize = 10;

/// Pluggable query-similarity predicate: `(new_query, old_query) -> bool`.
pub type SimilarityFn = Arc<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// Default similarity: case-insensitive exact match, or containment in
/// either direction when the contained side is longer than 10 chars.
pub fn default_similarity(new_query: &str, old_query: &str) -> bool {
    let n = new_query.to_lowercase();
    let o = old_query.to_lowercase();
    n == o
        || (n.len() > MIN_CONTAINMENT_LEN && o.contains(&n))
        || (o.len() > MIN_CONTAINMENT_LEN && n.contains(&o))
}

pub struct SpecialistEngine {
    provider: Arc<dyn Provider>,
    sessions: Arc<dyn SessionStore>,
    config_source: Arc<dyn ModelConfigSource>,
    retriever: Retriever,
    assembler: ContextAssembler,
    similarity: SimilarityFn,
    top_k: usize,
}

impl SpecialistEngine {
    pub fn new(
        provider: Arc<dyn Provider>,
        index: Arc<dyn VectorIndex>,
        sessions: Arc<dyn SessionStore>,
        config_source: Arc<dyn ModelConfigSource>,
    ) -> Self {
        let embedder = Embedder::new(provider.clone());
        Self {
            provider,
            sessions,
            config_source,
            retriever: Retriever::new(embedder, index),
            assembler: ContextAssembler::default(),
            similarity: Arc::new(default_similarity),
            top_k: crate::chat::DEFAULT_TOP_K,
        }
    }

    /// Replace the dedup similarity predicate.
    pub fn with_similarity(mut self, similarity: SimilarityFn) -> Self {
        self.similarity = similarity;
        self
    }

    /// Begin a new specialist session for a user.
    pub async fn start_session(&self, user_email: &str) -> Result<SessionId> {
        let session_id = SessionId::new();
        self.sessions
            .create_session(user_email, &session_id)
            .await?;
        info!(user = user_email, session = %session_id, "Started specialist session");
        Ok(session_id)
    }

    /// All entries of a session in append order. NotFound when the
    /// session does not exist.
    pub async fn get_session_history(
        &self,
        user_email: &str,
        session_id: &SessionId,
    ) -> Result<Vec<SpecialistQueryEntry>> {
        self.sessions
            .get_entries(user_email, session_id)
            .await?
            .ok_or_else(|| Error::not_found("session", session_id.to_string()))
    }

    /// Handle one specialist query.
    ///
    /// Every invocation appends its entry to the session, including
    /// fallback replies, so the dedup scan sees the full history.
    pub async fn handle_specialist_query(
        &self,
        query: &str,
        user_email: &str,
        session_id: &SessionId,
    ) -> Result<SpecialistReply> {
        let config = self.config_source.fetch().await?;

        let excluded = self.excluded_names(query, user_email, session_id).await?;
        let instructions = if excluded.is_empty() {
            config.instructions.clone()
        } else {
            format!(
                "{}\n\nNOTE: Do not suggest the following specialists again unless there \
                 are truly no other options: {}.",
                config.instructions,
                excluded.join(", ")
            )
        };

        let chunks = match self
            .retriever
            .retrieve(&config.embedding_model, query, None, self.top_k)
            .await
        {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!(error = %e, "Query embedding failed; matching without context");
                Vec::new()
            }
        };

        let current = vec![Message::user(query)];
        let assembled = self.assembler.assemble(&instructions, &chunks, &[], &current);

        let reply = if let Err(e) =
            crate::token::check_budget(&assembled, &config.model, config.max_output_tokens)
        {
            warn!(error = %e, "Specialist prompt over budget");
            SpecialistReply {
                specialists: vec![contract::placeholder_card(crate::chat::BUDGET_EXCEEDED_REPLY)],
            }
        } else {
            match self
                .provider
                .complete(CompletionRequest {
                    model: config.model.clone(),
                    messages: assembled,
                    temperature: 0.0,
                    max_tokens: Some(config.max_output_tokens),
                })
                .await
            {
                Ok(response) => contract::parse_specialist_reply(&response.content),
                Err(e) => {
                    error!(error = %e, "Specialist model invocation failed");
                    SpecialistReply {
                        specialists: vec![contract::placeholder_card(SPECIALIST_ERROR_MESSAGE)],
                    }
                }
            }
        };

        self.sessions
            .append_entry(
                user_email,
                session_id,
                SpecialistQueryEntry {
                    query: query.to_string(),
                    recommended: reply.recommended_names(),
                    response: reply.clone(),
                    timestamp: Utc::now(),
                },
            )
            .await?;

        info!(
            user = user_email,
            session = %session_id,
            recommended = reply.recommended_names().len(),
            "Specialist query handled"
        );

        Ok(reply)
    }

    /// Names recommended for similar queries among the last few entries.
    async fn excluded_names(
        &self,
        query: &str,
        user_email: &str,
        session_id: &SessionId,
    ) -> Result<Vec<String>> {
        let entries = self
            .sessions
            .get_entries(user_email, session_id)
            .await?
            .unwrap_or_default();

        let recent = entries.iter().rev().take(RECENT_WINDOW);
        let mut names: Vec<String> = Vec::new();
        for entry in recent {
            if (self.similarity)(query, &entry.query) {
                for name in &entry.recommended {
                    if !names.contains(name) {
                        names.push(name.clone());
                    }
                }
            }
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn similarity_exact_match_case_insensitive() {
        assert!(default_similarity("Knee Pain", "knee pain"));
    }

    #[test]
    fn similarity_containment_requires_length() {
        // "knee" (4 chars) contained in a longer query must not match
        assert!(!default_similarity("knee", "knee pain after running"));
        // a long query contained in another long query matches
        assert!(default_similarity(
            "knee pain after running",
            "I have knee pain after running every morning"
        ));
    }

    #[test]
    fn similarity_rejects_unrelated() {
        assert!(!default_similarity("knee pain", "skin rash"));
    }
}
