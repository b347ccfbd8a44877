//! Structured lifecycle events for analysis runs.
//!
//! - `RunSpan` enters a span tagged with the run id for the duration of a stream
//! - `emit_*` functions log the key moments of a run at `info!` level
//!
//! Filter with `DECIDE_LOG` (see [`crate::telemetry`]).

use tracing::info;

/// RAII guard that enters a run-scoped tracing span.
///
/// ```ignore
/// let _span = RunSpan::enter("run-12345");
/// // tracing calls made here carry run_id = "run-12345"
/// ```
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    pub fn enter(run_id: &str) -> Self {
        let span = tracing::info_span!("decide.run", run_id = %run_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: an event stream was opened for a run.
pub fn emit_stream_opened(run_id: &str, resumed: bool) {
    info!(event = "stream.opened", run_id = %run_id, resumed = resumed);
}

/// Emit event: a single stream event was folded into the analysis state.
pub fn emit_event_reduced(event_type: &str, seq: u64) {
    tracing::debug!(event = "stream.event_reduced", kind = %event_type, seq = seq);
}

/// Emit event: run reached `decision_card.assigned`.
pub fn emit_run_completed(run_id: &str, card_id: Option<&str>, total_events: u64) {
    info!(
        event = "run.completed",
        run_id = %run_id,
        card_id = card_id.unwrap_or("-"),
        total_events = total_events,
    );
}

/// Emit event: stream failed or closed before completion (warning level).
pub fn emit_stream_failed(run_id: &str, error: &dyn std::fmt::Display) {
    tracing::warn!(event = "stream.failed", run_id = %run_id, error = %error);
}

/// Emit event: a candidate pool was ranked.
pub fn emit_ranking_computed(pool: usize, candidates: usize, decision_set: usize) {
    info!(
        event = "ranking.computed",
        pool = pool,
        candidates = candidates,
        decision_set = decision_set,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_span_enters() {
        let _span = RunSpan::enter("run-test");
        emit_stream_opened("run-test", false);
        emit_run_completed("run-test", None, 0);
    }
}
