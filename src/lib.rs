//! Workout Timer - A persistent exercise/rest timer service
//!
//! This library provides a dual exercise/rest clock whose truth is stored as
//! absolute timestamps, so it survives restarts and sleeps without drifting.
//! It alerts as rest runs out, optionally chains into the next exercise, and
//! mirrors its state to a remote store on a best-effort basis.

pub mod alerts;
pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod persistence;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::TimerError;
pub use state::{AppState, Phase, TimerPorts, TimerSnapshot, TimerState};
pub use utils::signals::shutdown_signal;
