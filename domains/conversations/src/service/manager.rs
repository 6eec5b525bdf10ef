//! Conversation manager
//!
//! Runs one submission at a time against a session: append the user turn,
//! ask the completion gateway, append the assistant turn. Every appended
//! message goes to the chat log first and then to the session cache.
//!
//! Completion and file-processing faults are recovered in-band as an
//! assistant message and reported through `SubmitOutcome::fault`. Storage
//! faults are the `Err` arm and end the request.

use std::sync::Arc;

use uuid::Uuid;

use medchat_common::{Error, Result};
use medchat_llm::LlmError;
use medchat_uploads::{
    DocumentExtractor, FileKind, ImageDecoder, PdfTextExtractor, RasterImageDecoder, UploadError,
    UploadedFile,
};

use crate::domain::entities::Message;
use crate::domain::session::Session;
use crate::gateway::CompletionGateway;
use crate::repository::MessageRepository;

/// Characters of extracted PDF text forwarded to the model; the rest is dropped
pub const MAX_DOCUMENT_CHARS: usize = 1000;

pub const DOCUMENT_PROMPT_PREFIX: &str = "Analyze this document: ";
pub const IMAGE_PROMPT: &str = "Analyze this image.";

/// User-turn text recorded in place of the uploaded content
pub const PDF_UPLOADED: &str = "Uploaded a PDF";
pub const IMAGE_UPLOADED: &str = "Uploaded an image";

const TEXT_FAILURE_PREFIX: &str = "Error generating response";
const FILE_FAILURE_PREFIX: &str = "Error processing file";

/// A fault that was turned into an assistant message
#[derive(Debug, thiserror::Error)]
pub enum SubmitFault {
    #[error(transparent)]
    Gateway(#[from] LlmError),

    #[error(transparent)]
    File(#[from] UploadError),
}

/// Result of a submission that did not hit a storage fault
#[derive(Debug)]
pub struct SubmitOutcome {
    /// Messages appended by this submission, in order
    pub appended: Vec<Message>,
    pub fault: Option<SubmitFault>,
}

impl SubmitOutcome {
    /// The in-band error text, when the submission was recovered from a fault
    pub fn fault_message(&self) -> Option<&str> {
        self.fault.as_ref()?;
        self.appended.last().map(Message::text)
    }
}

/// Question sent for a PDF: the fixed prefix plus the first
/// `MAX_DOCUMENT_CHARS` characters of its text
pub fn document_prompt(text: &str) -> String {
    let cut = text
        .char_indices()
        .nth(MAX_DOCUMENT_CHARS)
        .map_or(text.len(), |(idx, _)| idx);
    format!("{}{}", DOCUMENT_PROMPT_PREFIX, &text[..cut])
}

struct FilePrompt {
    user_text: &'static str,
    question: String,
}

#[derive(Clone)]
pub struct ConversationManager {
    store: MessageRepository,
    gateway: CompletionGateway,
    documents: Arc<dyn DocumentExtractor>,
    images: Arc<dyn ImageDecoder>,
}

impl ConversationManager {
    /// Manager with the PDF and raster image collaborators
    pub fn new(store: MessageRepository, gateway: CompletionGateway) -> Self {
        Self::with_collaborators(
            store,
            gateway,
            Arc::new(PdfTextExtractor),
            Arc::new(RasterImageDecoder),
        )
    }

    pub fn with_collaborators(
        store: MessageRepository,
        gateway: CompletionGateway,
        documents: Arc<dyn DocumentExtractor>,
        images: Arc<dyn ImageDecoder>,
    ) -> Self {
        Self {
            store,
            gateway,
            documents,
            images,
        }
    }

    pub fn create_thread(&self, session: &mut Session) -> Uuid {
        let thread_id = session.create_thread();
        tracing::info!(
            session_id = %session.id(),
            thread_id = %thread_id,
            tabs = session.tabs().len(),
            "Thread created"
        );
        thread_id
    }

    pub fn switch_thread(&self, session: &mut Session, thread_id: Uuid) -> Result<()> {
        session.switch_thread(thread_id)?;
        tracing::debug!(
            session_id = %session.id(),
            thread_id = %thread_id,
            "Active thread switched"
        );
        Ok(())
    }

    /// Ask `text` on the active thread
    pub async fn submit_text(&self, session: &mut Session, text: &str) -> Result<SubmitOutcome> {
        if text.trim().is_empty() {
            return Err(Error::Validation(
                "Message text cannot be empty or whitespace-only".to_string(),
            ));
        }

        let thread_id = self.begin(session)?;
        let result = self
            .exchange(session, thread_id, text, text, TEXT_FAILURE_PREFIX)
            .await;
        self.end(session, thread_id, result.is_ok())?;
        result
    }

    /// Analyze an uploaded PDF or image on the active thread
    pub async fn submit_file(
        &self,
        session: &mut Session,
        file: &UploadedFile,
    ) -> Result<SubmitOutcome> {
        let thread_id = self.begin(session)?;
        tracing::info!(
            thread_id = %thread_id,
            file_name = %file.name,
            kind = %file.kind,
            bytes = file.size(),
            "Analyzing uploaded file"
        );

        let result = match self.prepare(file).await {
            Ok(prompt) => {
                self.exchange(
                    session,
                    thread_id,
                    prompt.user_text,
                    &prompt.question,
                    FILE_FAILURE_PREFIX,
                )
                .await
            }
            Err(e) => self.reject_file(session, thread_id, e).await,
        };
        self.end(session, thread_id, result.is_ok())?;
        result
    }

    /// Hold `file` on the session until it is analyzed
    pub fn attach_file(&self, session: &mut Session, file: UploadedFile) {
        tracing::info!(
            session_id = %session.id(),
            file_name = %file.name,
            kind = %file.kind,
            bytes = file.size(),
            "File attached"
        );
        session.set_pending_upload(file);
    }

    /// Analyze and clear the pending upload
    pub async fn analyze_pending(&self, session: &mut Session) -> Result<SubmitOutcome> {
        let file = session
            .take_pending_upload()
            .ok_or_else(|| Error::Validation("No file has been uploaded".to_string()))?;
        self.submit_file(session, &file).await
    }

    fn begin(&self, session: &mut Session) -> Result<Uuid> {
        let thread_id = session.active_thread_id();
        let thread = session.thread_mut(thread_id)?;
        if !thread.state().accepts_input() {
            return Err(Error::Validation(
                "This chat is still waiting for a reply".to_string(),
            ));
        }
        thread.begin().map_err(|e| Error::Internal(e.to_string()))?;
        Ok(thread_id)
    }

    fn end(&self, session: &mut Session, thread_id: Uuid, replied: bool) -> Result<()> {
        let thread = session.thread_mut(thread_id)?;
        if replied {
            thread.finish().map_err(|e| Error::Internal(e.to_string()))
        } else {
            thread.abandon();
            Ok(())
        }
    }

    async fn exchange(
        &self,
        session: &mut Session,
        thread_id: Uuid,
        user_text: &str,
        question: &str,
        failure_prefix: &str,
    ) -> Result<SubmitOutcome> {
        let mut appended = vec![
            self.append(session, Message::user(thread_id, user_text))
                .await?,
        ];

        let (reply, fault) = match self.gateway.complete(question).await {
            Ok(answer) => (answer, None),
            Err(e) => {
                tracing::warn!(thread_id = %thread_id, error = %e, "Completion failed");
                (format!("{}: {}", failure_prefix, e), Some(SubmitFault::Gateway(e)))
            }
        };

        appended.push(
            self.append(session, Message::assistant(thread_id, reply))
                .await?,
        );

        Ok(SubmitOutcome { appended, fault })
    }

    async fn reject_file(
        &self,
        session: &mut Session,
        thread_id: Uuid,
        error: UploadError,
    ) -> Result<SubmitOutcome> {
        tracing::warn!(thread_id = %thread_id, error = %error, "Uploaded file could not be read");

        let text = format!("{}: {}", FILE_FAILURE_PREFIX, error);
        let message = self
            .append(session, Message::assistant(thread_id, text))
            .await?;

        Ok(SubmitOutcome {
            appended: vec![message],
            fault: Some(SubmitFault::File(error)),
        })
    }

    async fn append(&self, session: &mut Session, message: Message) -> Result<Message> {
        self.store
            .append(message.thread_id(), message.role(), message.text())
            .await?;

        session
            .thread_mut(message.thread_id())?
            .push(message.clone());
        Ok(message)
    }

    async fn prepare(&self, file: &UploadedFile) -> std::result::Result<FilePrompt, UploadError> {
        let bytes = file.bytes.clone();

        match file.kind {
            FileKind::Pdf => {
                let documents = self.documents.clone();
                let text = tokio::task::spawn_blocking(move || documents.extract(&bytes))
                    .await
                    .map_err(|e| UploadError::Extraction(e.to_string()))??;

                Ok(FilePrompt {
                    user_text: PDF_UPLOADED,
                    question: document_prompt(&text),
                })
            }
            FileKind::Image => {
                let images = self.images.clone();
                tokio::task::spawn_blocking(move || images.decode(&bytes))
                    .await
                    .map_err(|e| UploadError::Decode(e.to_string()))??;

                // Only the fixed prompt is sent; the pixels never leave the server
                Ok(FilePrompt {
                    user_text: IMAGE_UPLOADED,
                    question: IMAGE_PROMPT.to_string(),
                })
            }
        }
    }
}
