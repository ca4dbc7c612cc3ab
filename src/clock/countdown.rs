//! Countdown to an absolute end time

/// Countdown over wall-clock timestamps.
///
/// Starting fixes `end_at = now + total`. Stopping folds what is left back into
/// `total`, so a later start resumes where it left off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    total_ms: u64,
    end_at: Option<i64>,
}

impl Countdown {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            total_ms: duration_ms,
            end_at: None,
        }
    }

    /// A countdown that is already running towards `end_at`.
    pub fn running_until(end_at: i64) -> Self {
        Self {
            total_ms: 0,
            end_at: Some(end_at),
        }
    }

    pub fn set_duration(&mut self, duration_ms: u64) {
        self.total_ms = duration_ms;
    }

    /// No-op when already running.
    pub fn start(&mut self, now_ms: i64) {
        if self.end_at.is_none() {
            let total = i64::try_from(self.total_ms).unwrap_or(i64::MAX);
            self.end_at = Some(now_ms.saturating_add(total));
        }
    }

    /// No-op when not running.
    pub fn stop(&mut self, now_ms: i64) {
        if let Some(end) = self.end_at.take() {
            self.total_ms = remaining_between(now_ms, end);
        }
    }

    pub fn reset(&mut self, duration_ms: Option<u64>) {
        if let Some(ms) = duration_ms {
            self.total_ms = ms;
        }
        self.end_at = None;
    }

    /// Never negative.
    pub fn remaining_ms(&self, now_ms: i64) -> u64 {
        match self.end_at {
            Some(end) => remaining_between(now_ms, end),
            None => self.total_ms,
        }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        match self.end_at {
            Some(end) => now_ms >= end,
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.end_at.is_some()
    }

    pub fn end_at(&self) -> Option<i64> {
        self.end_at
    }
}

fn remaining_between(now_ms: i64, end_ms: i64) -> u64 {
    end_ms.saturating_sub(now_ms).max(0) as u64
}
