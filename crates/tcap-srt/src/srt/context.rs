//! Transaction context store
//!
//! Contexts live in a capture-scoped arena and are addressed by [`ContextId`].
//! Closing a dialogue unlinks it from the indices but leaves the record in
//! the arena, so handles stay valid until the engine is reset.

use super::key::{AnsiKey, BeginKey, ContinueKey, EndKey};
use super::SubdissectorRef;
use crate::types::{FrameNumber, SessionId};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Stable handle of a context within one engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(usize);

/// Dialogue progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueState {
    /// Opened, nothing seen from the other side
    Unresponded,
    /// Answered, but not through a Continue (ANSI, or End pending)
    Responded,
    /// Answered through a Continue
    Continued,
    Closed,
}

/// Per-dialogue record
#[derive(Debug, Clone)]
pub struct TransactionContext {
    pub session_id: SessionId,
    pub first_frame: FrameNumber,
    pub last_frame: Option<FrameNumber>,
    pub begin_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub responded: bool,
    pub closed: bool,
    pub application_context_id: Option<String>,
    pub subdissector: Option<SubdissectorRef>,
    pub(crate) begin: Option<BeginKey>,
    pub(crate) cont: Option<ContinueKey>,
    pub(crate) end: Option<EndKey>,
    pub(crate) ansi: Option<AnsiKey>,
}

impl TransactionContext {
    fn new(session_id: SessionId, frame: FrameNumber, time: DateTime<Utc>) -> Self {
        Self {
            session_id,
            first_frame: frame,
            last_frame: None,
            begin_time: time,
            end_time: None,
            responded: false,
            closed: false,
            application_context_id: None,
            subdissector: None,
            begin: None,
            cont: None,
            end: None,
            ansi: None,
        }
    }

    pub fn state(&self) -> DialogueState {
        if self.closed {
            DialogueState::Closed
        } else if self.cont.is_some() {
            DialogueState::Continued
        } else if self.responded {
            DialogueState::Responded
        } else {
            DialogueState::Unresponded
        }
    }

    pub fn is_open(&self) -> bool {
        !self.closed
    }

    pub fn has_continue(&self) -> bool {
        self.cont.is_some()
    }

    /// Whether `frame` falls in `[first_frame, last_frame]`, open-ended
    /// while the dialogue has no last frame
    pub fn contains_frame(&self, frame: FrameNumber) -> bool {
        frame >= self.first_frame && self.last_frame.map_or(true, |last| frame <= last)
    }

    /// Capture time since the dialogue opened
    pub fn age_at(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.begin_time)
    }

    /// Service response time of a closed dialogue
    pub fn elapsed(&self) -> Option<Duration> {
        self.end_time
            .map(|end| end.signed_duration_since(self.begin_time).to_std().unwrap_or_default())
    }

    /// Record the application context; the first one seen wins.
    /// Returns whether it was stored.
    pub(crate) fn set_application_context(&mut self, ac: &str) -> bool {
        if self.application_context_id.is_some() {
            return false;
        }
        self.application_context_id = Some(ac.to_string());
        true
    }

    pub(crate) fn mark_closed(&mut self, frame: FrameNumber, time: DateTime<Utc>) {
        self.responded = true;
        self.closed = true;
        self.last_frame = Some(frame);
        self.end_time = Some(time);
    }
}

/// Arena of contexts plus the session counter
#[derive(Debug)]
pub struct ContextStore {
    contexts: Vec<TransactionContext>,
    next_session_id: SessionId,
}

impl ContextStore {
    pub fn new() -> Self {
        Self {
            contexts: Vec::new(),
            next_session_id: 1,
        }
    }

    /// Allocate a context for a dialogue opened at `frame`
    pub fn create_context(&mut self, frame: FrameNumber, time: DateTime<Utc>) -> ContextId {
        let session_id = self.next_session_id;
        self.next_session_id = self.next_session_id.wrapping_add(1);
        self.contexts.push(TransactionContext::new(session_id, frame, time));
        ContextId(self.contexts.len() - 1)
    }

    pub fn get(&self, id: ContextId) -> &TransactionContext {
        &self.contexts[id.0]
    }

    pub fn get_mut(&mut self, id: ContextId) -> &mut TransactionContext {
        &mut self.contexts[id.0]
    }

    /// Handle of the context carrying `session_id`
    pub fn find_session(&self, session_id: SessionId) -> Option<ContextId> {
        let idx = session_id.checked_sub(1)? as usize;
        self.contexts
            .get(idx)
            .filter(|ctx| ctx.session_id == session_id)
            .map(|_| ContextId(idx))
    }

    /// Find a context by its session id
    pub fn by_session(&self, session_id: SessionId) -> Option<&TransactionContext> {
        self.find_session(session_id).map(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn open_count(&self) -> usize {
        self.contexts.iter().filter(|ctx| ctx.is_open()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransactionContext> {
        self.contexts.iter()
    }

    /// Drop every context and restart session ids at 1
    pub fn clear(&mut self) {
        self.contexts.clear();
        self.next_session_id = 1;
    }
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new()
    }
}
