//! Conversations domain: sessions, chat threads, message log, completion gateway

pub mod api;
pub mod domain;
pub mod gateway;
pub mod repository;
pub mod service;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{Message, MessageRole};
pub use domain::session::Session;
pub use domain::state::{StateError, ThreadEvent, ThreadState, ThreadStateMachine};

pub use gateway::CompletionGateway;

// Re-export repository types
pub use repository::{ConversationsRepositories, MessageRepository};

pub use service::{ConversationManager, SessionRegistry, SubmitFault, SubmitOutcome};

// Re-export API types
pub use api::routes;
pub use api::ConversationsState;
