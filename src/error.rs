//! Error types for the workout timer.
//!
//! None of these are fatal to the timer itself: persistence, mirror and
//! alert failures are logged by the caller and the timer keeps running on
//! its in-memory state.

use thiserror::Error;

/// Errors surfaced by the timer's public actions.
#[derive(Error, Debug)]
pub enum TimerError {
    /// Reading or writing the durable store failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid input to an action
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// Key-value store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to lock in-memory store")]
    Poisoned,
}

/// Remote mirror errors. Always logged, never propagated into a transition.
#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote store rejected upsert with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Audio/haptic cue errors.
#[derive(Error, Debug)]
pub enum AlertError {
    #[error("{0} is not available on this device")]
    Unavailable(&'static str),

    #[error("Cue failed: {0}")]
    Failed(#[from] std::io::Error),
}

/// Result type alias for TimerError
pub type Result<T, E = TimerError> = std::result::Result<T, E>;
