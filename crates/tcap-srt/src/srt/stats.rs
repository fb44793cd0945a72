//! Service response time statistics

use crate::tcap::MessageKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tcap_telemetry::{Counter, Histogram, HistogramSummary};

/// Response times of one application context
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextSrt {
    pub count: u64,
    pub min_secs: f64,
    pub max_secs: f64,
    pub total_secs: f64,
}

impl ContextSrt {
    fn record(&mut self, secs: f64) {
        if self.count == 0 {
            self.min_secs = secs;
            self.max_secs = secs;
        } else {
            self.min_secs = self.min_secs.min(secs);
            self.max_secs = self.max_secs.max(secs);
        }
        self.count += 1;
        self.total_secs += secs;
    }

    pub fn mean_secs(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_secs / self.count as f64
        }
    }
}

/// Serializable view of [`SrtStats`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SrtSnapshot {
    pub sessions_opened: u64,
    pub sessions_closed: u64,
    pub duplicates: u64,
    pub stale_reuses: u64,
    pub orphans: u64,
    pub response_time: HistogramSummary,
    pub by_application_context: BTreeMap<String, ContextSrt>,
}

/// Per-engine counters, mirrored to the `metrics` facade
#[derive(Debug)]
pub struct SrtStats {
    sessions_opened: Counter,
    sessions_closed: Counter,
    duplicates: Counter,
    stale_reuses: Counter,
    orphans: Counter,
    response_time: Histogram,
    by_context: HashMap<String, ContextSrt>,
}

impl SrtStats {
    pub fn new() -> Self {
        Self {
            sessions_opened: Counter::new("tcap_srt_sessions_opened_total"),
            sessions_closed: Counter::new("tcap_srt_sessions_closed_total"),
            duplicates: Counter::new("tcap_srt_duplicates_total"),
            stale_reuses: Counter::new("tcap_srt_stale_reuses_total"),
            orphans: Counter::new("tcap_srt_orphans_total"),
            response_time: Histogram::new("tcap_srt_response_seconds"),
            by_context: HashMap::new(),
        }
    }

    pub(crate) fn record_opened(&self) {
        self.sessions_opened.inc();
        metrics::counter!("tcap_srt_sessions_opened_total").increment(1);
    }

    pub(crate) fn record_closed(&mut self, elapsed: Duration, application_context: Option<&str>) {
        let secs = elapsed.as_secs_f64();
        self.sessions_closed.inc();
        self.response_time.record(secs);
        if let Some(ac) = application_context {
            self.by_context.entry(ac.to_string()).or_default().record(secs);
        }
        metrics::counter!("tcap_srt_sessions_closed_total").increment(1);
        metrics::histogram!("tcap_srt_response_seconds").record(secs);
    }

    pub(crate) fn record_duplicate(&self) {
        self.duplicates.inc();
        metrics::counter!("tcap_srt_duplicates_total").increment(1);
    }

    pub(crate) fn record_stale_reuse(&self) {
        self.stale_reuses.inc();
        metrics::counter!("tcap_srt_stale_reuses_total").increment(1);
    }

    pub(crate) fn record_orphan(&self, kind: MessageKind) {
        self.orphans.inc();
        metrics::counter!("tcap_srt_orphans_total", "kind" => kind.as_str()).increment(1);
    }

    pub fn snapshot(&self) -> SrtSnapshot {
        SrtSnapshot {
            sessions_opened: self.sessions_opened.get(),
            sessions_closed: self.sessions_closed.get(),
            duplicates: self.duplicates.get(),
            stale_reuses: self.stale_reuses.get(),
            orphans: self.orphans.get(),
            response_time: self.response_time.summary(),
            by_application_context: self
                .by_context
                .iter()
                .map(|(ac, srt)| (ac.clone(), srt.clone()))
                .collect(),
        }
    }

    pub fn reset(&mut self) {
        self.sessions_opened.reset();
        self.sessions_closed.reset();
        self.duplicates.reset();
        self.stale_reuses.reset();
        self.orphans.reset();
        self.response_time.reset();
        self.by_context.clear();
    }
}

impl Default for SrtStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_sessions_feed_histogram_and_context() {
        let mut stats = SrtStats::new();
        stats.record_opened();
        stats.record_opened();
        stats.record_closed(Duration::from_millis(200), Some("map-sms"));
        stats.record_closed(Duration::from_millis(600), Some("map-sms"));
        stats.record_orphan(MessageKind::End);

        let snap = stats.snapshot();
        assert_eq!(snap.sessions_opened, 2);
        assert_eq!(snap.sessions_closed, 2);
        assert_eq!(snap.orphans, 1);
        assert_eq!(snap.response_time.count, 2);

        let sms = &snap.by_application_context["map-sms"];
        assert_eq!(sms.count, 2);
        assert!((sms.min_secs - 0.2).abs() < 1e-9);
        assert!((sms.max_secs - 0.6).abs() < 1e-9);
        assert!((sms.mean_secs() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_reset() {
        let mut stats = SrtStats::new();
        stats.record_duplicate();
        stats.record_stale_reuse();
        stats.record_closed(Duration::from_secs(1), None);
        stats.reset();
        assert_eq!(stats.snapshot(), SrtSnapshot::default());
    }
}
