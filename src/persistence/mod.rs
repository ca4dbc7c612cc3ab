//! Persistence and recovery of the timer record
//!
//! The record is written on every state change and deleted when the timer goes
//! idle. On startup it is read back and checked against the wall clock before
//! it is trusted.

pub mod store;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    error::StoreError,
    state::{machine::SAFETY_CUTOFF_MS, Phase, TimerState},
};

pub use store::{FileStore, KeyValueStore, MemoryStore};

/// Store key holding the persisted timer record
pub const TIMER_STATE_KEY: &str = "workoutTimerState";

/// Why a persisted record was not resumed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discard {
    /// Exercise has been running longer than the safety cutoff
    ExerciseExpired,
    /// Rest finished while the process was not running
    RestElapsed,
    /// Timestamps do not match the phase
    Inconsistent,
}

/// Check a restored record against the current time
pub fn validate_restored(state: &TimerState, now_ms: i64) -> Result<(), Discard> {
    if !state.is_consistent() {
        return Err(Discard::Inconsistent);
    }
    if state.phase == Phase::Exercising && state.exercise_elapsed_ms(now_ms) > SAFETY_CUTOFF_MS {
        return Err(Discard::ExerciseExpired);
    }
    if let (true, Some(end)) = (state.phase.is_resting(), state.rest_end_at) {
        if now_ms >= end {
            return Err(Discard::RestElapsed);
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct PersistenceAdapter {
    store: Arc<dyn KeyValueStore>,
}

impl PersistenceAdapter {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Write the record, or delete it when idle
    pub fn save(&self, state: &TimerState) -> Result<(), StoreError> {
        if state.phase == Phase::Idle {
            return self.clear();
        }
        let json = serde_json::to_string(state)?;
        self.store.set(TIMER_STATE_KEY, &json)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(TIMER_STATE_KEY)
    }

    /// Read the persisted record. Missing, unreadable and corrupted records
    /// all read as `None`.
    pub fn load(&self) -> Option<TimerState> {
        let raw = match self.store.get(TIMER_STATE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read persisted timer state: {}", e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!("Ignoring corrupted timer state: {}", e);
                None
            }
        }
    }

    /// Build the state to start from: the persisted record if it is still
    /// live at `now_ms`, otherwise defaults. Discarded records are deleted.
    pub fn build_initial_state(&self, now_ms: i64) -> TimerState {
        let Some(saved) = self.load() else {
            return TimerState::new();
        };
        if saved.phase == Phase::Idle {
            return TimerState::new();
        }

        match validate_restored(&saved, now_ms) {
            Ok(()) => {
                info!("Resuming {} timer from persisted state", saved.phase);
                saved
            }
            Err(reason) => {
                info!("Discarding persisted {} timer: {:?}", saved.phase, reason);
                if let Err(e) = self.clear() {
                    warn!("Failed to clear stale timer state: {}", e);
                }
                debug!("Stale record: {:?}", saved);
                TimerState::new()
            }
        }
    }
}

impl std::fmt::Debug for PersistenceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceAdapter")
            .field("key", &TIMER_STATE_KEY)
            .finish()
    }
}
