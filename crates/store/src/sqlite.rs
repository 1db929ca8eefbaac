//! SQLite store backend.
//!
//! Uses a single SQLite database file with two tables:
//! - `conversations` — one row per conversation, messages as a JSON column
//! - `specialist_sessions` — one row per (user email, session), entries as
//!   a JSON column appended under the row lock of a transaction

use async_trait::async_trait;
use caremind_core::error::StoreError;
use caremind_core::message::{Conversation, ConversationId, Message, SessionId};
use caremind_core::store::{
    ConversationStore, ConversationSummary, SessionStore, SpecialistQueryEntry,
};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// A production SQLite store backing both conversations and specialist
/// sessions.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new SQLite store from a file path.
    ///
    /// The database and all tables/indexes are created automatically.
    /// Pass `"sqlite::memory:"` for an in-process ephemeral database
    /// (useful for tests).
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL,
                title       TEXT,
                messages    TEXT NOT NULL DEFAULT '[]',
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("conversations table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_conversations_user
             ON conversations(user_id, created_at DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("user index: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS specialist_sessions (
                user_email  TEXT NOT NULL,
                session_id  TEXT NOT NULL,
                entries     TEXT NOT NULL DEFAULT '[]',
                created_at  TEXT NOT NULL,
                PRIMARY KEY (user_email, session_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("sessions table: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_conversation(row: &sqlx::sqlite::SqliteRow) -> Result<Conversation, StoreError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?;
        let user_id: String = row
            .try_get("user_id")
            .map_err(|e| StoreError::QueryFailed(format!("user_id column: {e}")))?;
        let title: Option<String> = row
            .try_get("title")
            .map_err(|e| StoreError::QueryFailed(format!("title column: {e}")))?;
        let messages_json: String = row
            .try_get("messages")
            .map_err(|e| StoreError::QueryFailed(format!("messages column: {e}")))?;
        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| StoreError::QueryFailed(format!("created_at column: {e}")))?;
        let updated_at_str: String = row
            .try_get("updated_at")
            .map_err(|e| StoreError::QueryFailed(format!("updated_at column: {e}")))?;

        let messages: Vec<Message> = serde_json::from_str(&messages_json)
            .map_err(|e| StoreError::QueryFailed(format!("messages decode: {e}")))?;

        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());
        let updated_at = chrono::DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(Conversation {
            id: ConversationId(id),
            user_id,
            title,
            messages,
            created_at,
            updated_at,
        })
    }
}

#[async_trait]
impl ConversationStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn get(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError> {
        let row = sqlx::query("SELECT * FROM conversations WHERE id = ?1")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("GET by id: {e}")))?;

        match row {
            Some(ref r) => Ok(Some(Self::row_to_conversation(r)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, conversation: Conversation) -> Result<(), StoreError> {
        let messages_json = serde_json::to_string(&conversation.messages)
            .map_err(|e| StoreError::Storage(format!("messages encode: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO conversations (id, user_id, title, messages, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                messages = excluded.messages,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&conversation.id.0)
        .bind(&conversation.user_id)
        .bind(&conversation.title)
        .bind(&messages_json)
        .bind(conversation.created_at.to_rfc3339())
        .bind(conversation.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("INSERT failed: {e}")))?;

        debug!("Stored conversation {}", conversation.id);
        Ok(())
    }

    async fn append_messages(
        &self,
        id: &ConversationId,
        messages: Vec<Message>,
        title: Option<&str>,
    ) -> Result<bool, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(format!("begin: {e}")))?;

        let row = sqlx::query("SELECT messages FROM conversations WHERE id = ?1")
            .bind(&id.0)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("append lookup: {e}")))?;

        let Some(row) = row else {
            return Ok(false);
        };

        let messages_json: String = row
            .try_get("messages")
            .map_err(|e| StoreError::QueryFailed(format!("messages column: {e}")))?;
        let mut existing: Vec<Message> = serde_json::from_str(&messages_json)
            .map_err(|e| StoreError::QueryFailed(format!("messages decode: {e}")))?;
        existing.extend(messages);

        let updated_json = serde_json::to_string(&existing)
            .map_err(|e| StoreError::Storage(format!("messages encode: {e}")))?;

        sqlx::query(
            r#"
            UPDATE conversations
            SET messages = ?2,
                title = COALESCE(?3, title),
                updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(&id.0)
        .bind(&updated_json)
        .bind(title)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Storage(format!("append UPDATE: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(format!("commit: {e}")))?;

        Ok(true)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<ConversationSummary>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, title, created_at FROM conversations
             WHERE user_id = ?1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("list: {e}")))?;

        rows.iter()
            .map(|row| {
                let id: String = row
                    .try_get("id")
                    .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?;
                let title: Option<String> = row
                    .try_get("title")
                    .map_err(|e| StoreError::QueryFailed(format!("title column: {e}")))?;
                let created_at_str: String = row
                    .try_get("created_at")
                    .map_err(|e| StoreError::QueryFailed(format!("created_at column: {e}")))?;
                let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now());
                Ok(ConversationSummary {
                    id: ConversationId(id),
                    title,
                    created_at,
                })
            })
            .collect()
    }

    async fn delete(&self, id: &ConversationId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = ?1")
            .bind(&id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("DELETE failed: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn create_session(
        &self,
        user_email: &str,
        session_id: &SessionId,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO specialist_sessions (user_email, session_id, entries, created_at)
            VALUES (?1, ?2, '[]', ?3)
            ON CONFLICT(user_email, session_id) DO NOTHING
            "#,
        )
        .bind(user_email)
        .bind(&session_id.0)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("session INSERT: {e}")))?;

        Ok(())
    }

    async fn append_entry(
        &self,
        user_email: &str,
        session_id: &SessionId,
        entry: SpecialistQueryEntry,
    ) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(format!("begin: {e}")))?;

        let row = sqlx::query(
            "SELECT entries FROM specialist_sessions
             WHERE user_email = ?1 AND session_id = ?2",
        )
        .bind(user_email)
        .bind(&session_id.0)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("session lookup: {e}")))?;

        let mut entries: Vec<SpecialistQueryEntry> = match &row {
            Some(r) => {
                let json: String = r
                    .try_get("entries")
                    .map_err(|e| StoreError::QueryFailed(format!("entries column: {e}")))?;
                serde_json::from_str(&json)
                    .map_err(|e| StoreError::QueryFailed(format!("entries decode: {e}")))?
            }
            None => Vec::new(),
        };
        entries.push(entry);

        let entries_json = serde_json::to_string(&entries)
            .map_err(|e| StoreError::Storage(format!("entries encode: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO specialist_sessions (user_email, session_id, entries, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_email, session_id) DO UPDATE SET
                entries = excluded.entries
            "#,
        )
        .bind(user_email)
        .bind(&session_id.0)
        .bind(&entries_json)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Storage(format!("session UPSERT: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(format!("commit: {e}")))?;

        Ok(())
    }

    async fn get_entries(
        &self,
        user_email: &str,
        session_id: &SessionId,
    ) -> Result<Option<Vec<SpecialistQueryEntry>>, StoreError> {
        let row = sqlx::query(
            "SELECT entries FROM specialist_sessions
             WHERE user_email = ?1 AND session_id = ?2",
        )
        .bind(user_email)
        .bind(&session_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("entries lookup: {e}")))?;

        match row {
            Some(r) => {
                let json: String = r
                    .try_get("entries")
                    .map_err(|e| StoreError::QueryFailed(format!("entries column: {e}")))?;
                let entries = serde_json::from_str(&json)
                    .map_err(|e| StoreError::QueryFailed(format!("entries decode: {e}")))?;
                Ok(Some(entries))
            }
            None => Ok(None),
        }
    }
}
