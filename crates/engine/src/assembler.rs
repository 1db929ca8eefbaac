//! Context assembly — builds the message list for one model invocation.
//!
//! The system message is built from labeled sections in a fixed order:
//! instruction text, `Retrieval Content:` (top chunks, `---`-separated),
//! `Previous Messages:` (prior turns flattened to a role-prefixed
//! transcript), and `User Query:`. Empty sections are omitted; assembly
//! is deterministic.

use caremind_core::index::RetrievedChunk;
use caremind_core::message::{Message, Role};

/// How many retrieved chunks make it into the prompt.
pub const DEFAULT_KEEP_CHUNKS: usize = 3;

/// The context assembler. Stateless — create one and reuse it.
pub struct ContextAssembler {
    keep_chunks: usize,
}

impl ContextAssembler {
    pub fn new(keep_chunks: usize) -> Self {
        Self { keep_chunks }
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_KEEP_CHUNKS)
    }
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
    }
}

impl ContextAssembler {
    /// Assemble the full message list: one system message followed by the
    /// prior history and the current turn's messages.
    ///
    /// `current` is the incoming turn (usually one user message; may be
    /// several, and may carry multi-part content).
    pub fn assemble(
        &self,
        instructions: &str,
        chunks: &[RetrievedChunk],
        history: &[Message],
        current: &[Message],
    ) -> Vec<Message> {
        let mut sections: Vec<String> = Vec::new();

        let instructions = instructions.trim();
        if !instructions.is_empty() {
            sections.push(instructions.to_string());
        }

        if !chunks.is_empty() {
            let body: Vec<&str> = chunks
                .iter()
                .take(self.keep_chunks)
                .map(|c| c.text.as_str())
                .collect();
            sections.push(format!("Retrieval Content:\n{}", body.join("\n---\n")));
        }

        let transcript: Vec<String> = history
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| format!("{}: {}", role_label(m.role), m.content.flatten()))
            .collect();
        if !transcript.is_empty() {
            sections.push(format!("Previous Messages:\n{}", transcript.join("\n")));
        }

        let user_query = current
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.flatten())
            .unwrap_or_default();
        sections.push(format!("User Query:\n{user_query}"));

        let mut messages = vec![Message::system(sections.join("\n\n"))];
        messages.extend(history.iter().filter(|m| m.role != Role::System).cloned());
        messages.extend(current.iter().cloned());
        messages
    }
}
