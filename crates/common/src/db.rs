//! SQLite pool construction and the chat log schema
//!
//! The chat log is a single append-only table. There is no schema version;
//! the table is created on startup if it does not exist yet.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

use crate::error::Result;

/// Chat log table: one row per message, in append order (rowid)
const CREATE_CHATS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS chats (
    chat_id TEXT,
    role TEXT,
    message TEXT
)
"#;

/// Open a pool against `database_url`.
///
/// In-memory databases are private to a connection, so those get a pool of
/// exactly one connection that is never retired.
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?;

    let in_memory = database_url.contains(":memory:");
    let max_connections = if in_memory { 1 } else { 5 };

    let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
    if in_memory {
        pool_options = pool_options
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = pool_options.connect_with(options).await?;

    tracing::debug!(database_url = %database_url, max_connections, "SQLite pool opened");
    Ok(pool)
}

/// Create the chat log table when missing
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(CREATE_CHATS_TABLE).execute(pool).await?;
    Ok(())
}
