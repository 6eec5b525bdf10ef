//! Per-client session state
//!
//! A session owns the ordered tab list, the active thread and an in-memory
//! cache of each thread's messages. It is created when a client connects and
//! dropped when it disconnects; nothing here is shared between sessions.
//! The cache is never rebuilt from the chat log.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use medchat_common::{Error, Result};
use medchat_uploads::UploadedFile;

use super::entities::Message;
use super::state::{StateError, ThreadEvent, ThreadState, ThreadStateMachine};

/// Cached messages of one thread plus its conversational state
#[derive(Debug, Clone, Default)]
pub struct ThreadCache {
    state: ThreadState,
    messages: Vec<Message>,
}

impl ThreadCache {
    pub fn state(&self) -> ThreadState {
        self.state
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub(crate) fn begin(&mut self) -> std::result::Result<(), StateError> {
        self.state = ThreadStateMachine::transition(self.state, ThreadEvent::Submit)?;
        Ok(())
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub(crate) fn finish(&mut self) -> std::result::Result<(), StateError> {
        self.state = ThreadStateMachine::transition(self.state, ThreadEvent::Reply)?;
        Ok(())
    }

    /// Leave `AwaitingResponse` after a submission was cut short by a fault
    pub(crate) fn abandon(&mut self) {
        self.state = if self.messages.is_empty() {
            ThreadState::Empty
        } else {
            ThreadState::IdleWithHistory
        };
    }
}

/// Session state for one connected client
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    tabs: Vec<Uuid>,
    active: Uuid,
    threads: HashMap<Uuid, ThreadCache>,
    pending_upload: Option<UploadedFile>,
}

impl Session {
    /// Create a session with its first, active thread
    pub fn new() -> Self {
        let first = Uuid::new_v4();
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            tabs: vec![first],
            active: first,
            threads: HashMap::from([(first, ThreadCache::default())]),
            pending_upload: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Thread ids in tab order
    pub fn tabs(&self) -> &[Uuid] {
        &self.tabs
    }

    pub fn active_thread_id(&self) -> Uuid {
        self.active
    }

    pub fn contains(&self, thread_id: Uuid) -> bool {
        self.threads.contains_key(&thread_id)
    }

    pub fn thread(&self, thread_id: Uuid) -> Option<&ThreadCache> {
        self.threads.get(&thread_id)
    }

    /// Cached messages of `thread_id`, empty for unknown threads
    pub fn messages(&self, thread_id: Uuid) -> &[Message] {
        self.threads
            .get(&thread_id)
            .map(ThreadCache::messages)
            .unwrap_or(&[])
    }

    pub fn active_messages(&self) -> &[Message] {
        self.messages(self.active)
    }

    pub fn pending_upload(&self) -> Option<&UploadedFile> {
        self.pending_upload.as_ref()
    }

    /// Open a new empty thread and make it active.
    ///
    /// Any pending upload is dropped.
    pub fn create_thread(&mut self) -> Uuid {
        let thread_id = Uuid::new_v4();
        self.tabs.push(thread_id);
        self.threads.insert(thread_id, ThreadCache::default());
        self.active = thread_id;
        self.pending_upload = None;
        thread_id
    }

    /// Make an existing thread active
    pub fn switch_thread(&mut self, thread_id: Uuid) -> Result<()> {
        if !self.contains(thread_id) {
            return Err(thread_not_open(thread_id));
        }
        self.active = thread_id;
        Ok(())
    }

    /// Hold `file` until it is analyzed, replacing any earlier upload
    pub fn set_pending_upload(&mut self, file: UploadedFile) {
        self.pending_upload = Some(file);
    }

    pub fn take_pending_upload(&mut self) -> Option<UploadedFile> {
        self.pending_upload.take()
    }

    pub(crate) fn thread_mut(&mut self, thread_id: Uuid) -> Result<&mut ThreadCache> {
        self.threads
            .get_mut(&thread_id)
            .ok_or_else(|| thread_not_open(thread_id))
    }
}

fn thread_not_open(thread_id: Uuid) -> Error {
    Error::NotFound(format!("Thread {} is not open in this session", thread_id))
}

impl Default for Session {
    #[mutants::skip] // Delegates to Session::new(); a default-returning mutant would recurse
    fn default() -> Self {
        Self::new()
    }
}
