//! Message API handlers

use axum::{
    extract::{Path, State},
    Json,
};
use medchat_common::{Result, ValidatedJson};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::sessions::{MessageResponse, SessionResponse};
use crate::api::middleware::ConversationsState;
use crate::domain::session::Session;
use crate::service::SubmitOutcome;

/// Request for asking a question on the active thread
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitTextRequest {
    #[validate(length(min = 1, message = "Message text cannot be empty"))]
    pub text: String,
}

/// Result of one submission
///
/// `error` is set when the reply is an in-band failure message, so the
/// client can show a banner next to it.
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub session: SessionResponse,
    pub appended: Vec<MessageResponse>,
    pub error: Option<String>,
}

impl SubmissionResponse {
    pub fn new(session: &Session, outcome: &SubmitOutcome) -> Self {
        Self {
            session: SessionResponse::from(session),
            appended: outcome.appended.iter().map(MessageResponse::from).collect(),
            error: outcome.fault_message().map(str::to_string),
        }
    }
}

/// Ask a question on the session's active thread
pub async fn submit_text(
    State(state): State<ConversationsState>,
    Path(session_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<SubmitTextRequest>,
) -> Result<Json<SubmissionResponse>> {
    let handle = state.sessions.get(session_id).await?;
    let mut session = handle.lock().await;

    let outcome = state.manager.submit_text(&mut session, &req.text).await?;

    Ok(Json(SubmissionResponse::new(&session, &outcome)))
}

/// Read a thread back from the chat log
pub async fn list_thread_messages(
    State(state): State<ConversationsState>,
    Path(thread_id): Path<Uuid>,
) -> Result<Json<Vec<MessageResponse>>> {
    let messages = state.repos.messages.list(thread_id).await?;
    Ok(Json(messages.iter().map(MessageResponse::from).collect()))
}
