//! State management module
//!
//! The timer record, the phase machine that mutates it, snapshots derived
//! from it, and the shared application state that runs side effects.

pub mod app_state;
pub mod machine;
pub mod snapshot;
pub mod timer_state;

// Re-export main types
pub use app_state::{AppState, TimerPorts};
pub use machine::{PhaseMachine, TickEvent, Transition, ALERT_THRESHOLD_MS, MAX_REST_MS, SAFETY_CUTOFF_MS};
pub use snapshot::TimerSnapshot;
pub use timer_state::{Phase, TimerState};
