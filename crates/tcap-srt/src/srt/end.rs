//! TC-END and TC-ABORT matching

use super::context::{ContextId, ContextStore};
use super::index::IndexEntry;
use super::key::{begin_key, end_key};
use super::{CorrelationEngine, MatchOutcome, Matched};
use crate::tcap::TcapEvent;
use crate::types::FrameNumber;

impl CorrelationEngine {
    /// Terminating messages are keyed on their destination. The End index
    /// holds pre-linked entries; a dialogue that never saw a Continue is
    /// still only in the Begin index.
    pub(super) fn match_end(&mut self, event: &TcapEvent) -> Option<Matched> {
        let (dst, dtid) = (&event.peer_endpoint, event.dtid());
        let frame = event.frame_number;

        let (id, already_closed) = self
            .end
            .chain(&end_key(dst, dtid))
            .and_then(|chain| terminated_by(chain, &self.contexts, frame))
            .or_else(|| {
                self.begin
                    .chain(&begin_key(dst, dtid))
                    .and_then(|chain| terminated_by(chain, &self.contexts, frame))
            })?;

        self.annotate(id, event);
        if already_closed {
            return Some(Matched::new(id, MatchOutcome::Replayed));
        }

        self.close_context(id, frame, event.timestamp);
        Some(Matched::new(id, MatchOutcome::Closed))
    }
}

/// The dialogue closed at exactly `frame` if any, else the newest open one.
/// The flag tells which of the two was found.
fn terminated_by(chain: &[IndexEntry], contexts: &ContextStore, frame: FrameNumber) -> Option<(ContextId, bool)> {
    chain
        .iter()
        .find(|e| contexts.get(e.context).last_frame == Some(frame))
        .map(|e| (e.context, true))
        .or_else(|| {
            chain
                .iter()
                .rev()
                .find(|e| contexts.get(e.context).is_open())
                .map(|e| (e.context, false))
        })
}
