//! TC-BEGIN matching

use super::key::{begin_key, BeginKey, KeyDigest};
use super::policy::{classify, Reuse};
use super::{CorrelationEngine, MatchOutcome, Matched};
use crate::tcap::TcapEvent;
use tracing::debug;

impl CorrelationEngine {
    /// A Begin always yields a dialogue: an existing one when the frame was
    /// seen before or the message is a retransmission, a new one otherwise.
    pub(super) fn match_begin(&mut self, event: &TcapEvent) -> Matched {
        let key = begin_key(&event.local_endpoint, event.otid());
        let frame = event.frame_number;

        let mut newest = None;
        if let Some(chain) = self.begin.chain(&key) {
            if let Some(entry) = chain
                .iter()
                .find(|e| self.contexts.get(e.context).first_frame == frame)
            {
                return Matched::new(entry.context, MatchOutcome::Replayed);
            }
            newest = chain.last().map(|e| e.context);
        }

        let Some(id) = newest else {
            return self.open_begin(key, event, MatchOutcome::Created);
        };

        match classify(self.contexts.get(id), event.timestamp, &self.config) {
            Reuse::Duplicate => {
                debug!(
                    session = self.contexts.get(id).session_id,
                    otid = %event.otid(),
                    "retransmitted Begin"
                );
                self.stats.record_duplicate();
                self.annotate(id, event);
                Matched::new(id, MatchOutcome::Duplicate)
            }
            verdict => {
                debug!(
                    previous = self.contexts.get(id).session_id,
                    ?verdict,
                    otid = %event.otid(),
                    "transaction id reused"
                );
                self.stats.record_stale_reuse();
                self.open_begin(key, event, MatchOutcome::StaleReuse)
            }
        }
    }

    fn open_begin(&mut self, key: BeginKey, event: &TcapEvent, outcome: MatchOutcome) -> Matched {
        let id = self.contexts.create_context(event.frame_number, event.timestamp);
        let origin = self.begin.append(key, id);
        self.contexts.get_mut(id).begin = Some(key);
        self.stats.record_opened();
        self.annotate(id, event);

        debug!(
            session = self.contexts.get(id).session_id,
            origin,
            key = key.digest(),
            "dialogue opened"
        );
        Matched::new(id, outcome)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::SrtConfig;
    use crate::srt::key::begin_key;
    use crate::srt::{CorrelationEngine, MatchOutcome};
    use crate::tcap::TcapEvent;
    use crate::types::{Endpoint, TransactionId};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn begin(frame: u32, secs: i64) -> TcapEvent {
        TcapEvent::begin(frame, at(secs), Endpoint::point_code(1), Endpoint::point_code(2), 5)
    }

    #[test]
    fn test_same_frame_is_replayed_from_index() {
        let mut engine = CorrelationEngine::new(SrtConfig::default());
        let first = engine.match_begin(&begin(1, 0));
        // Bypasses the frame memo on purpose
        let again = engine.match_begin(&begin(1, 0));
        assert_eq!(first.context, again.context);
        assert_eq!(again.outcome, MatchOutcome::Replayed);
    }

    #[test]
    fn test_reuse_appends_to_chain() {
        let mut engine = CorrelationEngine::new(SrtConfig::default());
        let first = engine.match_begin(&begin(1, 0));
        let second = engine.match_begin(&begin(2, 31));
        assert_ne!(first.context, second.context);
        assert_eq!(second.outcome, MatchOutcome::StaleReuse);

        let key = begin_key(&Endpoint::point_code(1), TransactionId(5));
        let chain = engine.begin_index().chain(&key).unwrap();
        assert_eq!(chain.len(), 2);
        assert!(chain[0].is_origin);
        assert!(!chain[1].is_origin);
    }
}
