//! Dialogue closing and index pruning

use super::context::ContextId;
use super::index::Unlink;
use super::CorrelationEngine;
use crate::types::FrameNumber;
use chrono::{DateTime, Utc};
use tracing::{debug, trace};

impl CorrelationEngine {
    /// Close a dialogue at `frame` and, unless retention is persistent, take
    /// its entries out of the four indices.
    pub(super) fn close_context(&mut self, id: ContextId, frame: FrameNumber, time: DateTime<Utc>) {
        self.contexts.get_mut(id).mark_closed(frame, time);

        let ctx = self.contexts.get(id);
        let elapsed = ctx.elapsed().unwrap_or_default();
        self.stats
            .record_closed(elapsed, ctx.application_context_id.as_deref());
        debug!(
            session = ctx.session_id,
            first_frame = ctx.first_frame,
            last_frame = frame,
            elapsed_ms = elapsed.as_millis() as u64,
            "dialogue closed"
        );

        if !self.config.persistent_retention {
            self.unlink(id);
        }
    }

    /// An origin that still has successors stays in its chain, and the
    /// context keeps its reference to it.
    fn unlink(&mut self, id: ContextId) {
        let ctx = self.contexts.get(id);
        let session = ctx.session_id;
        let (begin, cont, end, ansi) = (ctx.begin, ctx.cont, ctx.end, ctx.ansi);

        let begin = begin.map(|key| self.begin.unlink(&key, id));
        let cont = cont.map(|key| self.cont.unlink(&key, id));
        let end = end.map(|key| self.end.unlink(&key, id));
        let ansi = ansi.map(|key| self.ansi.unlink(&key, id));

        let detached = |result: Option<Unlink>| result.map_or(true, |r| r != Unlink::OriginRetained);
        let ctx = self.contexts.get_mut(id);
        if detached(begin) {
            ctx.begin = None;
        }
        if detached(cont) {
            ctx.cont = None;
        }
        if detached(end) {
            ctx.end = None;
        }
        if detached(ansi) {
            ctx.ansi = None;
        }

        trace!(session, ?begin, ?cont, ?end, ?ansi, "index entries unlinked");
    }
}
