//! Domain entities for Conversations domain
//!
//! A message is written once, at the moment a role's turn completes, and is
//! never changed afterwards. Fields are only reachable through accessors.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use medchat_common::{Error, Result};

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    /// Value stored in the chat log `role` column
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MessageRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(Error::Internal(format!(
                "Unknown message role '{}' in chat log",
                other
            ))),
        }
    }
}

/// Message entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    thread_id: Uuid,
    role: MessageRole,
    text: String,
}

impl Message {
    pub fn new(thread_id: Uuid, role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            thread_id,
            role,
            text: text.into(),
        }
    }

    /// Create a new user message
    pub fn user(thread_id: Uuid, text: impl Into<String>) -> Self {
        Self::new(thread_id, MessageRole::User, text)
    }

    /// Create a new assistant message
    pub fn assistant(thread_id: Uuid, text: impl Into<String>) -> Self {
        Self::new(thread_id, MessageRole::Assistant, text)
    }

    pub fn thread_id(&self) -> Uuid {
        self.thread_id
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
