//! Timer state record and derived values

use serde::{Deserialize, Serialize};

use crate::clock::{Countdown, Stopwatch};

/// What the timer is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Exercising,
    Resting,
    /// Final stretch of a rest countdown
    Alert,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Exercising => "exercising",
            Phase::Resting => "resting",
            Phase::Alert => "alert",
        }
    }

    /// Resting or Alert: a rest countdown is running
    pub fn is_resting(&self) -> bool {
        matches!(self, Phase::Resting | Phase::Alert)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single source of timing truth.
///
/// Only absolute timestamps (epoch ms) and durations are stored; elapsed and
/// remaining time are always derived from them against the current time. The
/// serialized form is the persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    #[serde(default)]
    pub phase: Phase,
    #[serde(default)]
    pub exercise_id: Option<String>,
    #[serde(default)]
    pub exercise_started_at: Option<i64>,
    #[serde(default)]
    pub paused_duration: u64,
    /// Elapsed exercise time captured when leaving Exercising
    #[serde(default)]
    pub exercise_elapsed_frozen: u64,
    #[serde(default)]
    pub rest_end_at: Option<i64>,
    /// Last configured rest length, kept while idle
    #[serde(default)]
    pub rest_duration_ms: u64,
}

impl TimerState {
    /// Create an idle state with every field at its default
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            exercise_id: None,
            exercise_started_at: None,
            paused_duration: 0,
            exercise_elapsed_frozen: 0,
            rest_end_at: None,
            rest_duration_ms: 0,
        }
    }

    /// Stopwatch over the current exercising span, if there is one
    pub fn exercise_stopwatch(&self) -> Option<Stopwatch> {
        match (self.phase, self.exercise_started_at) {
            (Phase::Exercising, Some(started)) => {
                Some(Stopwatch::running_since(started, self.paused_duration))
            }
            _ => None,
        }
    }

    /// Countdown towards the end of the current rest, if there is one
    pub fn rest_countdown(&self) -> Option<Countdown> {
        match self.rest_end_at {
            Some(end) if self.phase.is_resting() => Some(Countdown::running_until(end)),
            _ => None,
        }
    }

    /// Live elapsed time while exercising, otherwise the frozen snapshot
    pub fn exercise_elapsed_ms(&self, now_ms: i64) -> u64 {
        self.exercise_stopwatch()
            .map(|sw| sw.elapsed_ms(now_ms))
            .unwrap_or(self.exercise_elapsed_frozen)
    }

    /// Rest left while resting, otherwise 0
    pub fn rest_remaining_ms(&self, now_ms: i64) -> u64 {
        self.rest_countdown()
            .map(|cd| cd.remaining_ms(now_ms))
            .unwrap_or(0)
    }

    /// Check that exactly the timestamp matching the phase is set
    pub fn is_consistent(&self) -> bool {
        match self.phase {
            Phase::Idle => self.exercise_started_at.is_none() && self.rest_end_at.is_none(),
            Phase::Exercising => self.exercise_started_at.is_some() && self.rest_end_at.is_none(),
            Phase::Resting | Phase::Alert => {
                self.exercise_started_at.is_none() && self.rest_end_at.is_some()
            }
        }
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new()
    }
}
