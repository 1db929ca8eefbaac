//! Storage backends for caremind conversations and specialist sessions.
//!
//! All backends implement the `caremind_core::ConversationStore` and
//! `caremind_core::SessionStore` traits.

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryStore;
pub use sqlite::SqliteStore;
