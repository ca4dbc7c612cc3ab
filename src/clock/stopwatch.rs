//! Count-up stopwatch

/// Count-up stopwatch over wall-clock timestamps.
///
/// `elapsed = accumulated + (now - started_at)` while running. The stopwatch
/// never samples time itself; callers pass `now` in, so it can be polled at
/// any cadence without drifting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stopwatch {
    started_at: Option<i64>,
    accumulated_ms: u64,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// A stopwatch that has been running since `started_at`, with
    /// `paused_ms` of that span excluded.
    pub fn running_since(started_at: i64, paused_ms: u64) -> Self {
        Self {
            started_at: Some(started_at.saturating_add(paused_ms as i64)),
            accumulated_ms: 0,
        }
    }

    /// Start or resume. No-op when already running.
    pub fn start(&mut self, now_ms: i64) {
        if self.started_at.is_none() {
            self.started_at = Some(now_ms);
        }
    }

    /// Fold the current run into the accumulator. No-op when stopped.
    pub fn stop(&mut self, now_ms: i64) {
        if let Some(started) = self.started_at.take() {
            self.accumulated_ms += span_ms(started, now_ms);
        }
    }

    pub fn reset(&mut self) {
        self.started_at = None;
        self.accumulated_ms = 0;
    }

    pub fn elapsed_ms(&self, now_ms: i64) -> u64 {
        match self.started_at {
            Some(started) => self.accumulated_ms + span_ms(started, now_ms),
            None => self.accumulated_ms,
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }
}

// A wall clock can step backwards; clamp instead of going negative.
fn span_ms(from: i64, to: i64) -> u64 {
    to.saturating_sub(from).max(0) as u64
}
