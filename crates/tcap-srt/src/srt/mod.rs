//! Transaction correlation and service response time
//!
//! One [`CorrelationEngine`] per capture. Each dissected TCAP message is fed
//! to [`CorrelationEngine::process`], which finds or creates the dialogue it
//! belongs to and returns the session it was correlated with.
//!
//! ITU dialogues are tracked through three indices:
//!
//! - Begin: originator endpoint + originating tid
//! - Continue: both endpoints + both tids, direction independent
//! - End: where a terminating message will be addressed
//!
//! ANSI dialogues use a single direction-independent index.

mod ansi;
mod begin;
mod cont;
mod context;
mod end;
mod index;
mod key;
mod lifecycle;
mod policy;
mod registry;
mod stats;
mod subdissector;

pub use context::{ContextId, ContextStore, DialogueState, TransactionContext};
pub use index::{ChainIndex, IndexEntry, IndexKind, Unlink};
pub use key::{
    ansi_key, begin_key, continue_key, end_key, endpoint_hash, AnsiKey, BeginKey, ContinueKey,
    EndKey, KeyDigest,
};
pub use policy::{classify, Reuse};
pub use registry::CaptureRegistry;
pub use stats::{ContextSrt, SrtSnapshot, SrtStats};
pub use subdissector::{SubdissectorRef, SubdissectorRegistry, SubdissectorResolver};

use crate::config::SrtConfig;
use crate::tcap::{Correlation, MessageKind, TcapEvent};
use crate::types::{FrameNumber, SessionId, TransactionId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, trace};
use uuid::Uuid;

/// How an event related to its dialogue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MatchOutcome {
    /// Opened a dialogue for an unknown key
    Created,
    /// Opened a dialogue for a key whose previous dialogue was closed or stale
    StaleReuse,
    /// Retransmission of an opening message of a live dialogue
    Duplicate,
    /// Attached to a live dialogue
    Correlated,
    /// Terminated the dialogue
    Closed,
    /// Same frame seen again
    Replayed,
}

#[derive(Debug, Clone, Copy)]
struct Matched {
    context: ContextId,
    outcome: MatchOutcome,
}

impl Matched {
    fn new(context: ContextId, outcome: MatchOutcome) -> Self {
        Self { context, outcome }
    }
}

/// Identity of a message within the capture, used to recognise re-dissection.
/// One frame may bundle several TCAP messages, so both endpoints are part of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FrameMark {
    frame: FrameNumber,
    kind: MessageKind,
    from: u64,
    to: u64,
    otid: TransactionId,
    dtid: TransactionId,
}

impl FrameMark {
    fn of(event: &TcapEvent) -> Self {
        Self {
            frame: event.frame_number,
            kind: event.message_kind,
            from: endpoint_hash(&event.local_endpoint),
            to: endpoint_hash(&event.peer_endpoint),
            otid: event.otid(),
            dtid: event.dtid(),
        }
    }
}

/// Number of keys held by each index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexSizes {
    pub begin: usize,
    pub cont: usize,
    pub end: usize,
    pub ansi: usize,
}

/// Correlation state of one capture
pub struct CorrelationEngine {
    capture_id: Uuid,
    config: SrtConfig,
    contexts: ContextStore,
    begin: ChainIndex<BeginKey>,
    cont: ChainIndex<ContinueKey>,
    end: ChainIndex<EndKey>,
    ansi: ChainIndex<AnsiKey>,
    /// Which dialogue every processed message resolved to, `None` for orphans
    seen: HashMap<FrameMark, Option<Matched>>,
    resolver: Arc<dyn SubdissectorResolver>,
    stats: SrtStats,
}

impl CorrelationEngine {
    pub fn new(config: SrtConfig) -> Self {
        Self::with_resolver(config, Arc::new(SubdissectorRegistry::new()))
    }

    pub fn with_resolver(config: SrtConfig, resolver: Arc<dyn SubdissectorResolver>) -> Self {
        Self {
            capture_id: Uuid::new_v4(),
            config,
            contexts: ContextStore::new(),
            begin: ChainIndex::new(IndexKind::Begin),
            cont: ChainIndex::new(IndexKind::Continue),
            end: ChainIndex::new(IndexKind::End),
            ansi: ChainIndex::new(IndexKind::Ansi),
            seen: HashMap::new(),
            resolver,
            stats: SrtStats::new(),
        }
    }

    pub fn capture_id(&self) -> Uuid {
        self.capture_id
    }

    pub fn config(&self) -> &SrtConfig {
        &self.config
    }

    /// Correlate one message. `None` means no dialogue could be associated
    /// (orphan Continue/End/Abort) or correlation is disabled.
    #[instrument(
        skip_all,
        fields(
            capture = %self.capture_id,
            frame = event.frame_number,
            kind = event.message_kind.as_str(),
        )
    )]
    pub fn process(&mut self, event: &TcapEvent) -> Option<Correlation> {
        if !self.config.enable_correlation {
            trace!("correlation disabled");
            return None;
        }

        let mark = FrameMark::of(event);
        if let Some(prev) = self.seen.get(&mark).copied() {
            let Some(prev) = prev else {
                trace!("frame already seen as orphan");
                return None;
            };
            trace!(session = self.contexts.get(prev.context).session_id, "frame already correlated");
            return Some(self.correlation(prev.context, event.frame_number, prev.outcome));
        }

        let matched = match event.message_kind {
            MessageKind::Begin => Some(self.match_begin(event)),
            MessageKind::Continue => self.match_continue(event),
            MessageKind::End | MessageKind::Abort => self.match_end(event),
            MessageKind::AnsiRequestOrResponse => Some(self.match_ansi(event)),
        };

        let Some(matched) = matched else {
            debug!(
                from = %event.local_endpoint,
                to = %event.peer_endpoint,
                otid = %event.otid(),
                dtid = %event.dtid(),
                "orphan message, no dialogue"
            );
            self.stats.record_orphan(event.message_kind);
            self.seen.insert(mark, None);
            return None;
        };

        self.seen.insert(mark, Some(matched));
        Some(self.correlation(matched.context, event.frame_number, matched.outcome))
    }

    /// Close a dialogue on behalf of the host, e.g. when its decoding failed
    /// for good. Returns false for an unknown or already closed session.
    pub fn close_session(&mut self, session_id: SessionId, frame: FrameNumber, time: DateTime<Utc>) -> bool {
        let Some(id) = self.contexts.find_session(session_id) else {
            return false;
        };
        if self.contexts.get(id).closed {
            return false;
        }
        self.close_context(id, frame, time);
        true
    }

    /// Forget everything: indices, contexts, frame memo, statistics. Session
    /// ids restart at 1.
    pub fn reset(&mut self) {
        self.begin.clear();
        self.cont.clear();
        self.end.clear();
        self.ansi.clear();
        self.contexts.clear();
        self.seen.clear();
        self.stats.reset();
        debug!(capture = %self.capture_id, "correlation state reset");
    }

    pub fn context(&self, session_id: SessionId) -> Option<&TransactionContext> {
        self.contexts.by_session(session_id)
    }

    pub fn contexts(&self) -> &ContextStore {
        &self.contexts
    }

    pub fn index_sizes(&self) -> IndexSizes {
        IndexSizes {
            begin: self.begin.len(),
            cont: self.cont.len(),
            end: self.end.len(),
            ansi: self.ansi.len(),
        }
    }

    pub fn begin_index(&self) -> &ChainIndex<BeginKey> {
        &self.begin
    }

    pub fn stats(&self) -> &SrtStats {
        &self.stats
    }

    pub fn snapshot(&self) -> SrtSnapshot {
        self.stats.snapshot()
    }

    /// Record what the event tells about its dialogue: the application
    /// context (first one wins) and, once, the decoder that owns the payload.
    fn annotate(&mut self, id: ContextId, event: &TcapEvent) {
        let ctx = self.contexts.get_mut(id);
        if let Some(ac) = event.application_context_id.as_deref() {
            if ctx.set_application_context(ac) {
                trace!(session = ctx.session_id, ac, "application context recorded");
            }
        }
        if ctx.subdissector.is_none() {
            ctx.subdissector = subdissector::resolve(
                self.resolver.as_ref(),
                ctx.application_context_id.as_deref(),
                &event.peer_endpoint,
                &event.local_endpoint,
            );
        }
    }

    fn correlation(&self, id: ContextId, frame: FrameNumber, outcome: MatchOutcome) -> Correlation {
        let ctx = self.contexts.get(id);
        Correlation {
            session_id: ctx.session_id,
            first_frame: ctx.first_frame,
            last_frame: ctx.last_frame,
            elapsed: if ctx.last_frame == Some(frame) { ctx.elapsed() } else { None },
            is_duplicate: outcome == MatchOutcome::Duplicate,
            application_context_id: ctx.application_context_id.clone(),
            subdissector: ctx.subdissector.clone(),
        }
    }
}

impl std::fmt::Debug for CorrelationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrelationEngine")
            .field("capture_id", &self.capture_id)
            .field("config", &self.config)
            .field("contexts", &self.contexts.len())
            .field("indices", &self.index_sizes())
            .finish()
    }
}
