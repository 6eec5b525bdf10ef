//! State machine for a single chat thread
//!
//! Thread states: Empty → AwaitingResponse → IdleWithHistory → AwaitingResponse …
//! A failed completion still produces a reply, so it settles the same way a
//! successful one does. There is no terminal state.

pub use medchat_common::StateError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThreadState {
    #[default]
    Empty,
    AwaitingResponse,
    IdleWithHistory,
}

impl ThreadState {
    /// Whether the thread accepts a new submission
    pub fn accepts_input(&self) -> bool {
        !matches!(self, Self::AwaitingResponse)
    }
}

impl std::fmt::Display for ThreadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::AwaitingResponse => write!(f, "awaiting_response"),
            Self::IdleWithHistory => write!(f, "idle_with_history"),
        }
    }
}

/// Events that trigger thread state transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThreadEvent {
    /// Text or file submitted
    Submit,
    /// Assistant reply (answer or error text) appended
    Reply,
}

impl std::fmt::Display for ThreadEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submit => write!(f, "submit"),
            Self::Reply => write!(f, "reply"),
        }
    }
}

/// Thread state machine
pub struct ThreadStateMachine;

impl ThreadStateMachine {
    /// Attempt a state transition
    pub fn transition(current: ThreadState, event: ThreadEvent) -> Result<ThreadState, StateError> {
        match (current, event) {
            (ThreadState::Empty | ThreadState::IdleWithHistory, ThreadEvent::Submit) => {
                Ok(ThreadState::AwaitingResponse)
            }
            (ThreadState::AwaitingResponse, ThreadEvent::Reply) => Ok(ThreadState::IdleWithHistory),
            _ => Err(StateError::InvalidTransition {
                from: current.to_string(),
                event: event.to_string(),
            }),
        }
    }
}
