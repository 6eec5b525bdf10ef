//! Route definitions for Conversations domain API

use axum::{
    routing::{get, post, put},
    Router,
};

use super::handlers::{messages, sessions, threads, uploads};
use super::middleware::ConversationsState;

/// Session lifecycle and rendering routes
fn session_routes() -> Router<ConversationsState> {
    Router::new()
        .route("/v1/sessions", post(sessions::create_session))
        .route(
            "/v1/sessions/{session_id}",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route(
            "/v1/sessions/{session_id}/threads",
            post(threads::create_thread),
        )
        .route(
            "/v1/sessions/{session_id}/active",
            put(threads::switch_thread),
        )
}

/// Submission routes
fn submission_routes() -> Router<ConversationsState> {
    Router::new()
        .route(
            "/v1/sessions/{session_id}/messages",
            post(messages::submit_text),
        )
        .route(
            "/v1/sessions/{session_id}/uploads",
            post(uploads::upload_file),
        )
        .route(
            "/v1/sessions/{session_id}/uploads/analyze",
            post(uploads::analyze_upload),
        )
}

/// Durable chat log routes
fn history_routes() -> Router<ConversationsState> {
    Router::new()
        .route("/v1/threads", get(threads::list_logged_threads))
        .route(
            "/v1/threads/{thread_id}/messages",
            get(messages::list_thread_messages),
        )
}

/// Create all Conversations domain API routes
pub fn routes() -> Router<ConversationsState> {
    Router::new()
        .merge(session_routes())
        .merge(submission_routes())
        .merge(history_routes())
}
