//! Read-only view of the timer at one instant

use serde::{Deserialize, Serialize};

use super::{Phase, TimerState};
use crate::clock::format_ms;

/// Everything a display needs, derived from a [`TimerState`] and the time it
/// was taken at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub phase: Phase,
    pub exercise_id: Option<String>,
    pub is_idle: bool,
    pub is_exercising: bool,
    /// Resting or Alert
    pub is_resting: bool,
    pub is_alert: bool,
    pub is_running: bool,
    pub exercise_elapsed_ms: u64,
    pub rest_remaining_ms: u64,
    pub rest_duration_ms: u64,
    pub exercise_display: String,
    pub rest_display: String,
    pub flash_idx: usize,
    pub flash_color: Option<String>,
    /// Epoch ms this snapshot was computed at
    pub taken_at: i64,
}

impl TimerSnapshot {
    pub fn capture(state: &TimerState, now_ms: i64, flash_idx: usize, flash_color: Option<&str>) -> Self {
        let exercise_elapsed_ms = state.exercise_elapsed_ms(now_ms);
        let rest_remaining_ms = state.rest_remaining_ms(now_ms);

        Self {
            phase: state.phase,
            exercise_id: state.exercise_id.clone(),
            is_idle: state.phase == Phase::Idle,
            is_exercising: state.phase == Phase::Exercising,
            is_resting: state.phase.is_resting(),
            is_alert: state.phase == Phase::Alert,
            is_running: state.phase != Phase::Idle,
            exercise_elapsed_ms,
            rest_remaining_ms,
            rest_duration_ms: state.rest_duration_ms,
            exercise_display: format_ms(exercise_elapsed_ms as i64),
            rest_display: format_ms(rest_remaining_ms as i64),
            flash_idx,
            flash_color: flash_color.map(str::to_string),
            taken_at: now_ms,
        }
    }
}

impl Default for TimerSnapshot {
    fn default() -> Self {
        Self::capture(&TimerState::new(), 0, 0, None)
    }
}
