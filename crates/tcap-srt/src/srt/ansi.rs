//! ANSI TCAP matching
//!
//! ANSI packages carry no Begin/End framing, so the first package of a key
//! is taken as the request and the next later one as its response.

use super::key::{ansi_key, AnsiKey, KeyDigest};
use super::policy::{classify, Reuse};
use super::{CorrelationEngine, MatchOutcome, Matched};
use crate::tcap::TcapEvent;
use tracing::debug;

impl CorrelationEngine {
    pub(super) fn match_ansi(&mut self, event: &TcapEvent) -> Matched {
        let key = ansi_key(&event.local_endpoint, &event.peer_endpoint, event.ansi_tid());
        let frame = event.frame_number;

        let mut newest = None;
        if let Some(chain) = self.ansi.chain(&key) {
            let seen = chain.iter().map(|e| e.context).find(|id| {
                let ctx = self.contexts.get(*id);
                ctx.first_frame == frame || ctx.last_frame == Some(frame)
            });
            if let Some(id) = seen {
                return Matched::new(id, MatchOutcome::Replayed);
            }
            newest = chain.last().map(|e| e.context);
        }

        let Some(id) = newest else {
            return self.open_ansi(key, event, MatchOutcome::Created);
        };

        let ctx = self.contexts.get(id);
        let is_response = !ctx.closed && ctx.last_frame.is_none() && frame > ctx.first_frame;
        if is_response {
            self.annotate(id, event);
            self.close_context(id, frame, event.timestamp);
            return Matched::new(id, MatchOutcome::Closed);
        }

        match classify(ctx, event.timestamp, &self.config) {
            Reuse::Duplicate => {
                self.stats.record_duplicate();
                self.annotate(id, event);
                Matched::new(id, MatchOutcome::Duplicate)
            }
            verdict => {
                debug!(previous = ctx.session_id, ?verdict, tid = %event.ansi_tid(), "ANSI transaction id reused");
                self.stats.record_stale_reuse();
                self.open_ansi(key, event, MatchOutcome::StaleReuse)
            }
        }
    }

    fn open_ansi(&mut self, key: AnsiKey, event: &TcapEvent, outcome: MatchOutcome) -> Matched {
        let id = self.contexts.create_context(event.frame_number, event.timestamp);
        let origin = self.ansi.append(key, id);
        self.contexts.get_mut(id).ansi = Some(key);
        self.stats.record_opened();
        self.annotate(id, event);

        debug!(
            session = self.contexts.get(id).session_id,
            origin,
            key = key.digest(),
            "ANSI dialogue opened"
        );
        Matched::new(id, outcome)
    }
}
