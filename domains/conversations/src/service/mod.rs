//! Stateful orchestration for the Conversations domain

pub mod manager;
pub mod sessions;

pub use manager::{ConversationManager, SubmitFault, SubmitOutcome};
pub use sessions::{SessionHandle, SessionRegistry};
