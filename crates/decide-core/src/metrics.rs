//! Global atomic counters for stream and ranking activity.
//!
//! Counters are incremented at the call site. Call [`Metrics::flush`] to
//! emit current values as a single `tracing::info!` event.

use std::sync::atomic::{AtomicU64, Ordering};

pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    streams_opened: AtomicU64,
    events_reduced: AtomicU64,
    events_ignored: AtomicU64,
    candidates_scored: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            streams_opened: AtomicU64::new(0),
            events_reduced: AtomicU64::new(0),
            events_ignored: AtomicU64::new(0),
            candidates_scored: AtomicU64::new(0),
        }
    }

    pub fn inc_streams_opened(&self) {
        self.streams_opened.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "streams_opened", "counter incremented");
    }

    /// Events folded into the analysis state through their typed payload.
    pub fn inc_events_reduced(&self) {
        self.events_reduced.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "events_reduced", "counter incremented");
    }

    /// Events with an unknown type or an unusable payload, and events
    /// that arrive after the run failed. Unusable payloads are still logged
    /// as raw text.
    pub fn inc_events_ignored(&self) {
        self.events_ignored.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "events_ignored", "counter incremented");
    }

    pub fn inc_candidates_scored(&self) {
        self.candidates_scored.fetch_add(1, Ordering::Relaxed);
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            streams_opened = self.streams_opened(),
            events_reduced = self.events_reduced(),
            events_ignored = self.events_ignored(),
            candidates_scored = self.candidates_scored(),
        );
    }

    pub fn streams_opened(&self) -> u64 {
        self.streams_opened.load(Ordering::Relaxed)
    }

    pub fn events_reduced(&self) -> u64 {
        self.events_reduced.load(Ordering::Relaxed)
    }

    pub fn events_ignored(&self) -> u64 {
        self.events_ignored.load(Ordering::Relaxed)
    }

    pub fn candidates_scored(&self) -> u64 {
        self.candidates_scored.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.streams_opened.store(0, Ordering::Relaxed);
        self.events_reduced.store(0, Ordering::Relaxed);
        self.events_ignored.store(0, Ordering::Relaxed);
        self.candidates_scored.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = Metrics::new();
        m.inc_streams_opened();
        m.inc_events_reduced();
        m.inc_events_reduced();
        m.inc_events_ignored();
        for _ in 0..5 {
            m.inc_candidates_scored();
        }
        assert_eq!(m.streams_opened(), 1);
        assert_eq!(m.events_reduced(), 2);
        assert_eq!(m.events_ignored(), 1);
        assert_eq!(m.candidates_scored(), 5);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_streams_opened();
        m.inc_events_reduced();
        m.inc_candidates_scored();
        m.reset();
        assert_eq!(m.streams_opened(), 0);
        assert_eq!(m.events_reduced(), 0);
        assert_eq!(m.candidates_scored(), 0);
    }
}
