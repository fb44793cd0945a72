//! Reuse policy for opening events whose key already has a chain.
//!
//! Two thresholds: a dialogue that got an answer is considered finished
//! after the repetition timeout, one that never got an answer only after the
//! (longer) lost timeout. Inside the window the event is a retransmission.

use super::context::TransactionContext;
use crate::config::SrtConfig;
use chrono::{DateTime, Utc};

/// Verdict for an opening event against the newest context of its key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reuse {
    /// Same dialogue, retransmitted
    Duplicate,
    /// Previous dialogue closed; the tid was legitimately reused
    AfterClose,
    /// Answered dialogue older than the repetition timeout
    RepetitionExpired,
    /// Unanswered dialogue older than the lost timeout
    LostExpired,
}

impl Reuse {
    /// Whether a new dialogue must be opened
    pub fn opens_new(&self) -> bool {
        !matches!(self, Self::Duplicate)
    }
}

pub fn classify(ctx: &TransactionContext, now: DateTime<Utc>, config: &SrtConfig) -> Reuse {
    if ctx.closed {
        return Reuse::AfterClose;
    }

    let age = ctx.age_at(now);
    let answered = ctx.responded || ctx.last_frame.is_some();

    if answered {
        if age > config.repetition_timeout() {
            Reuse::RepetitionExpired
        } else {
            Reuse::Duplicate
        }
    } else if age > config.lost_timeout() {
        Reuse::LostExpired
    } else {
        Reuse::Duplicate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::srt::context::ContextStore;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_closed_is_reused() {
        let mut store = ContextStore::new();
        let id = store.create_context(1, at(0));
        store.get_mut(id).mark_closed(2, at(1));
        assert_eq!(classify(store.get(id), at(1), &SrtConfig::default()), Reuse::AfterClose);
    }

    #[test]
    fn test_unanswered_uses_lost_timeout() {
        let config = SrtConfig::default();
        let mut store = ContextStore::new();
        let id = store.create_context(1, at(0));

        assert_eq!(classify(store.get(id), at(29), &config), Reuse::Duplicate);
        assert_eq!(classify(store.get(id), at(30), &config), Reuse::Duplicate);
        assert_eq!(classify(store.get(id), at(31), &config), Reuse::LostExpired);
    }

    #[test]
    fn test_answered_uses_repetition_timeout() {
        let config = SrtConfig::default();
        let mut store = ContextStore::new();
        let id = store.create_context(1, at(0));
        store.get_mut(id).responded = true;

        assert_eq!(classify(store.get(id), at(10), &config), Reuse::Duplicate);
        assert_eq!(classify(store.get(id), at(11), &config), Reuse::RepetitionExpired);
        assert!(Reuse::RepetitionExpired.opens_new());
        assert!(!Reuse::Duplicate.opens_new());
    }
}
