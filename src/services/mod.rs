//! External collaborators
//!
//! Preference storage and the remote state mirror. The timer reads the first
//! and writes the second; neither is a source of timing truth.

pub mod mirror;
pub mod preferences;

// Re-export main types
pub use mirror::{HttpMirror, MirrorHandle, NoopMirror, RemoteMirror};
pub use preferences::{PreferenceStore, DEFAULT_REST_SECS};
