//! User preferences read by the timer
//!
//! Written by the settings surface, read by the timer at transition time.

use std::{collections::HashMap, sync::Arc};

use tracing::{debug, info};

use crate::{error::StoreError, persistence::KeyValueStore};

const AUTO_START_KEY: &str = "timerAutoStart";
const REST_DEFAULTS_KEY: &str = "timerRestDefaults";

/// Rest length for exercises without a saved default
pub const DEFAULT_REST_SECS: u64 = 90;

#[derive(Clone)]
pub struct PreferenceStore {
    store: Arc<dyn KeyValueStore>,
}

impl PreferenceStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Whether a finished rest chains straight into the next exercise.
    /// Unreadable values read as `false`.
    pub fn auto_start(&self) -> bool {
        matches!(self.store.get(AUTO_START_KEY), Ok(Some(v)) if v == "true")
    }

    pub fn set_auto_start(&self, enabled: bool) -> Result<(), StoreError> {
        info!("Setting auto-start to: {}", enabled);
        self.store
            .set(AUTO_START_KEY, if enabled { "true" } else { "false" })
    }

    /// All saved per-exercise rest lengths in seconds
    pub fn rest_defaults(&self) -> HashMap<String, u64> {
        match self.store.get(REST_DEFAULTS_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                debug!("Ignoring unreadable rest defaults: {}", e);
                HashMap::new()
            }),
            _ => HashMap::new(),
        }
    }

    pub fn rest_default_secs(&self, exercise_id: &str) -> u64 {
        self.rest_defaults()
            .get(exercise_id)
            .copied()
            .unwrap_or(DEFAULT_REST_SECS)
    }

    /// Rest length in ms for the given exercise, or the global default
    pub fn rest_default_ms(&self, exercise_id: Option<&str>) -> u64 {
        exercise_id
            .map(|id| self.rest_default_secs(id))
            .unwrap_or(DEFAULT_REST_SECS)
            .saturating_mul(1000)
    }

    pub fn set_rest_default_secs(&self, exercise_id: &str, secs: u64) -> Result<(), StoreError> {
        let mut defaults = self.rest_defaults();
        defaults.insert(exercise_id.to_string(), secs);
        self.store
            .set(REST_DEFAULTS_KEY, &serde_json::to_string(&defaults)?)
    }
}

impl std::fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore").finish_non_exhaustive()
    }
}
