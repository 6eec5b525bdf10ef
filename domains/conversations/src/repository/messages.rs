//! Message repository: the durable, append-only chat log
//!
//! Rows are never updated or deleted. Per-thread order is the SQLite `rowid`
//! order, which is the order appends were committed in.

use crate::domain::entities::{Message, MessageRole};
use medchat_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    role: String,
    message: String,
}

#[derive(Clone)]
pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append one message. Committed when this returns.
    pub async fn append(&self, thread_id: Uuid, role: MessageRole, text: &str) -> Result<()> {
        sqlx::query("INSERT INTO chats (chat_id, role, message) VALUES (?, ?, ?)")
            .bind(thread_id.to_string())
            .bind(role.as_str())
            .bind(text)
            .execute(&self.pool)
            .await?;

        tracing::debug!(thread_id = %thread_id, role = %role, "Message appended to chat log");
        Ok(())
    }

    /// List messages for a thread in append order
    pub async fn list(&self, thread_id: Uuid) -> Result<Vec<Message>> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT role, message
            FROM chats
            WHERE chat_id = ?
            ORDER BY rowid ASC
            "#,
        )
        .bind(thread_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<Message> {
                Ok(Message::new(thread_id, row.role.parse()?, row.message))
            })
            .collect()
    }

    /// Thread ids present in the log, in order of their first message.
    ///
    /// Ids that are not UUIDs are skipped.
    pub async fn thread_ids(&self) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, String>(
            r#"
            SELECT chat_id
            FROM chats
            WHERE chat_id IS NOT NULL
            GROUP BY chat_id
            ORDER BY MIN(rowid) ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ids
            .into_iter()
            .filter_map(|id| match Uuid::parse_str(&id) {
                Ok(uuid) => Some(uuid),
                Err(_) => {
                    tracing::warn!(chat_id = %id, "Skipping non-UUID thread id in chat log");
                    None
                }
            })
            .collect())
    }
}
