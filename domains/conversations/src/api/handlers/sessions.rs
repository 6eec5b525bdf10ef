//! Session API handlers and the session view DTOs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use medchat_common::{Error, Result};
use serde::Serialize;
use uuid::Uuid;

use crate::api::middleware::ConversationsState;
use crate::domain::entities::{Message, MessageRole};
use crate::domain::session::Session;

/// One tab in the sidebar
#[derive(Debug, Serialize)]
pub struct TabResponse {
    pub thread_id: Uuid,
    /// "Chat N", numbered from 1 in creation order
    pub label: String,
    pub active: bool,
}

/// Message response DTO
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub role: MessageRole,
    pub text: String,
}

impl From<&Message> for MessageResponse {
    fn from(m: &Message) -> Self {
        Self {
            role: m.role(),
            text: m.text().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PendingUploadResponse {
    pub name: String,
    pub kind: String,
    pub size_bytes: usize,
}

/// Everything the chat page needs to render
///
/// A session is locked for the whole of a submission, so a render never
/// observes a thread mid-reply; clients show their own busy indicator while
/// a submission request is in flight.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub tabs: Vec<TabResponse>,
    pub active_thread_id: Uuid,
    /// Cached messages of the active thread
    pub messages: Vec<MessageResponse>,
    pub pending_upload: Option<PendingUploadResponse>,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        let active = session.active_thread_id();

        let tabs = session
            .tabs()
            .iter()
            .enumerate()
            .map(|(i, &thread_id)| TabResponse {
                thread_id,
                label: format!("Chat {}", i + 1),
                active: thread_id == active,
            })
            .collect();

        Self {
            session_id: session.id(),
            created_at: session.created_at(),
            tabs,
            active_thread_id: active,
            messages: session
                .active_messages()
                .iter()
                .map(MessageResponse::from)
                .collect(),
            pending_upload: session.pending_upload().map(|f| PendingUploadResponse {
                name: f.name.clone(),
                kind: f.kind.to_string(),
                size_bytes: f.size(),
            }),
        }
    }
}

/// Open a session with its first chat
pub async fn create_session(
    State(state): State<ConversationsState>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    let (_, handle) = state.sessions.connect().await;
    let session = handle.lock().await;
    Ok((StatusCode::CREATED, Json(SessionResponse::from(&*session))))
}

/// Render a session
pub async fn get_session(
    State(state): State<ConversationsState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionResponse>> {
    let handle = state.sessions.get(session_id).await?;
    let session = handle.lock().await;
    Ok(Json(SessionResponse::from(&*session)))
}

/// Close a session. Its cache is dropped; the chat log is kept.
pub async fn delete_session(
    State(state): State<ConversationsState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode> {
    if !state.sessions.disconnect(session_id).await {
        return Err(Error::NotFound(format!("Session {} not found", session_id)));
    }
    Ok(StatusCode::NO_CONTENT)
}
