//! Thread (tab) API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use medchat_common::{Result, ValidatedJson};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::sessions::SessionResponse;
use crate::api::middleware::ConversationsState;

/// Request for switching the active thread
#[derive(Debug, Deserialize, Validate)]
pub struct SwitchThreadRequest {
    pub thread_id: Uuid,
}

/// Open a new empty chat and make it active
pub async fn create_thread(
    State(state): State<ConversationsState>,
    Path(session_id): Path<Uuid>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    let handle = state.sessions.get(session_id).await?;
    let mut session = handle.lock().await;

    state.manager.create_thread(&mut session);

    Ok((StatusCode::CREATED, Json(SessionResponse::from(&*session))))
}

pub async fn switch_thread(
    State(state): State<ConversationsState>,
    Path(session_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<SwitchThreadRequest>,
) -> Result<Json<SessionResponse>> {
    let handle = state.sessions.get(session_id).await?;
    let mut session = handle.lock().await;

    state.manager.switch_thread(&mut session, req.thread_id)?;

    Ok(Json(SessionResponse::from(&*session)))
}

/// Thread ids present in the chat log, oldest first
pub async fn list_logged_threads(
    State(state): State<ConversationsState>,
) -> Result<Json<Vec<Uuid>>> {
    let thread_ids = state.repos.messages.thread_ids().await?;
    Ok(Json(thread_ids))
}
