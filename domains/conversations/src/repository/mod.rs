//! Repository implementations for Conversations domain

pub mod messages;

use sqlx::SqlitePool;

pub use messages::MessageRepository;

/// Combined repository access for the Conversations domain
#[derive(Clone)]
pub struct ConversationsRepositories {
    pub messages: MessageRepository,
}

impl ConversationsRepositories {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            messages: MessageRepository::new(pool),
        }
    }
}
