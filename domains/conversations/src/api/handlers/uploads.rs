//! Upload API handlers

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use medchat_common::{Error, Result};
use medchat_uploads::{FileKind, UploadError, UploadedFile};
use uuid::Uuid;

use super::messages::SubmissionResponse;
use super::sessions::SessionResponse;
use crate::api::middleware::ConversationsState;

/// Multipart part carrying the file
const FILE_FIELD: &str = "file";

/// Attach a PDF or image to the session, replacing any earlier one
pub async fn upload_file(
    State(state): State<ConversationsState>,
    Path(session_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<SessionResponse>> {
    let handle = state.sessions.get(session_id).await?;
    let file = read_file_field(&mut multipart).await?;

    let mut session = handle.lock().await;
    state.manager.attach_file(&mut session, file);

    Ok(Json(SessionResponse::from(&*session)))
}

/// Analyze the pending upload on the active thread
pub async fn analyze_upload(
    State(state): State<ConversationsState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SubmissionResponse>> {
    let handle = state.sessions.get(session_id).await?;
    let mut session = handle.lock().await;

    let outcome = state.manager.analyze_pending(&mut session).await?;

    Ok(Json(SubmissionResponse::new(&session, &outcome)))
}

async fn read_file_field(multipart: &mut Multipart) -> Result<UploadedFile> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let name = field
            .file_name()
            .filter(|n| !n.is_empty())
            .unwrap_or("upload")
            .to_string();
        let kind =
            FileKind::detect(field.content_type(), Some(name.as_str())).map_err(|e| match e {
                UploadError::UnsupportedType(t) => Error::UnsupportedMediaType(t),
                other => Error::Validation(other.to_string()),
            })?;
        let bytes = field.bytes().await.map_err(multipart_error)?;

        if bytes.is_empty() {
            return Err(Error::Validation("Uploaded file is empty".to_string()));
        }

        return Ok(UploadedFile::new(name, kind, bytes));
    }

    Err(Error::Validation(format!(
        "Multipart body must contain a '{}' part",
        FILE_FIELD
    )))
}

fn multipart_error(e: MultipartError) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge(e.body_text())
    } else {
        Error::Validation(e.body_text())
    }
}
