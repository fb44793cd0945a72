//! Engines for several captures analysed side by side
//!
//! Each capture owns one [`CorrelationEngine`] behind its own mutex: chain
//! splicing touches several entries at once, so all mutation of one capture
//! is serialized, while different captures proceed independently.

use super::{CorrelationEngine, SrtSnapshot, SubdissectorRegistry, SubdissectorResolver};
use crate::config::SrtConfig;
use crate::errors::{Result, SrtError};
use crate::tcap::{Correlation, TcapEvent};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct CaptureRegistry {
    engines: DashMap<Uuid, Arc<Mutex<CorrelationEngine>>>,
    config: SrtConfig,
    resolver: Arc<dyn SubdissectorResolver>,
}

impl CaptureRegistry {
    pub fn new(config: SrtConfig) -> Self {
        Self::with_resolver(config, Arc::new(SubdissectorRegistry::new()))
    }

    pub fn with_resolver(config: SrtConfig, resolver: Arc<dyn SubdissectorResolver>) -> Self {
        Self {
            engines: DashMap::new(),
            config,
            resolver,
        }
    }

    /// Start correlating a new capture
    pub fn open_capture(&self) -> Uuid {
        let engine = CorrelationEngine::with_resolver(self.config.clone(), Arc::clone(&self.resolver));
        let capture_id = engine.capture_id();
        self.engines.insert(capture_id, Arc::new(Mutex::new(engine)));
        info!(capture = %capture_id, "capture opened");
        capture_id
    }

    pub fn process(&self, capture_id: Uuid, event: &TcapEvent) -> Result<Option<Correlation>> {
        let engine = self.engine(capture_id)?;
        let mut engine = engine.lock();
        Ok(engine.process(event))
    }

    /// Reinitialize a capture, e.g. on reload
    pub fn reset(&self, capture_id: Uuid) -> Result<()> {
        self.engine(capture_id)?.lock().reset();
        Ok(())
    }

    pub fn snapshot(&self, capture_id: Uuid) -> Result<SrtSnapshot> {
        Ok(self.engine(capture_id)?.lock().snapshot())
    }

    /// Tear a capture down, returning its final statistics
    pub fn close_capture(&self, capture_id: Uuid) -> Result<SrtSnapshot> {
        let (_, engine) = self
            .engines
            .remove(&capture_id)
            .ok_or(SrtError::UnknownCapture(capture_id))?;
        let snapshot = engine.lock().snapshot();
        info!(
            capture = %capture_id,
            sessions = snapshot.sessions_opened,
            closed = snapshot.sessions_closed,
            "capture closed"
        );
        Ok(snapshot)
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    // Clone the Arc out so the shard lock is released before the engine is
    // locked.
    fn engine(&self, capture_id: Uuid) -> Result<Arc<Mutex<CorrelationEngine>>> {
        self.engines
            .get(&capture_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(SrtError::UnknownCapture(capture_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Endpoint;
    use chrono::Utc;

    #[test]
    fn test_captures_are_isolated() {
        let registry = CaptureRegistry::new(SrtConfig::default());
        let a = registry.open_capture();
        let b = registry.open_capture();
        assert_eq!(registry.len(), 2);

        let begin = TcapEvent::begin(1, Utc::now(), Endpoint::point_code(1), Endpoint::point_code(2), 5);
        let first = registry.process(a, &begin).unwrap().unwrap();
        let second = registry.process(b, &begin).unwrap().unwrap();
        // Each capture numbers its own sessions
        assert_eq!(first.session_id, 1);
        assert_eq!(second.session_id, 1);

        let snapshot = registry.close_capture(a).unwrap();
        assert_eq!(snapshot.sessions_opened, 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_capture() {
        let registry = CaptureRegistry::new(SrtConfig::default());
        let missing = Uuid::new_v4();
        let begin = TcapEvent::begin(1, Utc::now(), Endpoint::point_code(1), Endpoint::point_code(2), 5);
        assert!(matches!(
            registry.process(missing, &begin),
            Err(SrtError::UnknownCapture(id)) if id == missing
        ));
        assert!(registry.close_capture(missing).is_err());
    }

    #[test]
    fn test_reset_restarts_sessions() {
        let registry = CaptureRegistry::new(SrtConfig::default());
        let capture = registry.open_capture();
        let at = Utc::now();
        registry
            .process(capture, &TcapEvent::begin(1, at, Endpoint::point_code(1), Endpoint::point_code(2), 5))
            .unwrap();
        registry.reset(capture).unwrap();

        let again = registry
            .process(capture, &TcapEvent::begin(2, at, Endpoint::point_code(1), Endpoint::point_code(2), 6))
            .unwrap()
            .unwrap();
        assert_eq!(again.session_id, 1);
        assert_eq!(registry.snapshot(capture).unwrap().sessions_opened, 1);
    }
}
