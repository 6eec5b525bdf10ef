//! Conversations domain state

use crate::{ConversationManager, ConversationsRepositories, SessionRegistry};

/// Application state for the Conversations domain
#[derive(Clone)]
pub struct ConversationsState {
    pub repos: ConversationsRepositories,
    pub sessions: SessionRegistry,
    pub manager: ConversationManager,
}
