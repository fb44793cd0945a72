//! TC-CONTINUE matching

use super::context::ContextId;
use super::key::{begin_key, continue_key, end_key, ContinueKey, EndKey, KeyDigest};
use super::{CorrelationEngine, MatchOutcome, Matched};
use crate::tcap::TcapEvent;
use crate::types::{Endpoint, FrameNumber, TransactionId};
use tracing::debug;

impl CorrelationEngine {
    pub(super) fn match_continue(&mut self, event: &TcapEvent) -> Option<Matched> {
        let (src, otid) = (&event.local_endpoint, event.otid());
        let (dst, dtid) = (&event.peer_endpoint, event.dtid());
        let frame = event.frame_number;
        let key = continue_key(src, otid, dst, dtid);

        let known = self.cont.chain(&key).and_then(|chain| {
            chain
                .iter()
                .rev()
                .map(|e| e.context)
                .find(|id| self.contexts.get(*id).contains_frame(frame))
        });
        if let Some(id) = known {
            self.annotate(id, event);
            return Some(Matched::new(id, MatchOutcome::Correlated));
        }

        // First Continue of the dialogue. Normally it answers a Begin sent
        // by its receiver; failing that, the sender may be the initiator.
        // The End entry goes on the side that is not already in the Begin
        // index.
        let (id, end_side) = if let Some(id) = self.unanswered_begin(dst, dtid, frame) {
            (id, end_key(src, otid))
        } else if let Some(id) = self.unanswered_begin(src, otid, frame) {
            (id, end_key(dst, dtid))
        } else {
            return None;
        };

        self.link_continue(id, key, end_side);
        self.annotate(id, event);
        Some(Matched::new(id, MatchOutcome::Correlated))
    }

    /// Newest open dialogue begun by (`endpoint`, `tid`) that has no
    /// Continue yet
    fn unanswered_begin(&self, endpoint: &Endpoint, tid: TransactionId, frame: FrameNumber) -> Option<ContextId> {
        let chain = self.begin.chain(&begin_key(endpoint, tid))?;
        chain.iter().rev().map(|e| e.context).find(|id| {
            let ctx = self.contexts.get(*id);
            ctx.is_open() && !ctx.has_continue() && ctx.contains_frame(frame)
        })
    }

    /// Attach the Continue entry and pre-link the End entry.
    ///
    /// The pre-link registers where a terminating message from the other
    /// side will be addressed, so it is matched in the End index without
    /// going back through the Begin index.
    fn link_continue(&mut self, id: ContextId, cont: ContinueKey, end: EndKey) {
        self.cont.append(cont, id);

        let ctx = self.contexts.get_mut(id);
        ctx.responded = true;
        ctx.cont = Some(cont);
        if ctx.end.is_none() {
            self.end.append(end, id);
            ctx.end = Some(end);
        }

        debug!(
            session = ctx.session_id,
            cont = cont.digest(),
            end = end.digest(),
            "dialogue continued"
        );
    }
}
