//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod display_refresher;

// Re-export main functions
pub use display_refresher::{display_refresher_task, DEFAULT_TICK};
