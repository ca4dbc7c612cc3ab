//! Best-effort remote copy of the timer state
//!
//! One-way push keyed by user identity. The remote copy is never read back by
//! the timer and a failed push never affects the local transition.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    error::MirrorError,
    state::{Phase, TimerState},
};

/// Remote store the timer state is copied to
pub trait RemoteMirror: Send + Sync {
    /// Upsert `state` for `user_id`. The returned future owns everything it
    /// needs so it can be spawned.
    fn upsert(&self, user_id: &str, state: &TimerState) -> BoxFuture<'static, Result<(), MirrorError>>;
}

/// Mirror that drops every push
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMirror;

impl RemoteMirror for NoopMirror {
    fn upsert(&self, _user_id: &str, _state: &TimerState) -> BoxFuture<'static, Result<(), MirrorError>> {
        Box::pin(async { Ok(()) })
    }
}

/// Row written to the remote table; `state` is null while idle
#[derive(Debug, Serialize)]
struct MirrorRow<'a> {
    user_id: &'a str,
    state: Option<&'a TimerState>,
    updated_at: DateTime<Utc>,
}

/// Upserts into a REST table (`<base_url>/workout_timer_state`)
#[derive(Debug, Clone)]
pub struct HttpMirror {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpMirror {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn table_url(&self) -> String {
        format!("{}/workout_timer_state?on_conflict=user_id", self.base_url)
    }
}

impl RemoteMirror for HttpMirror {
    fn upsert(&self, user_id: &str, state: &TimerState) -> BoxFuture<'static, Result<(), MirrorError>> {
        let row = MirrorRow {
            user_id,
            state: (state.phase != Phase::Idle).then_some(state),
            updated_at: Utc::now(),
        };

        let mut request = self
            .client
            .post(self.table_url())
            .header("Prefer", "resolution=merge-duplicates")
            .json(&row);
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key).bearer_auth(key);
        }

        Box::pin(async move {
            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(MirrorError::Rejected {
                    status: status.as_u16(),
                    body,
                });
            }
            Ok(())
        })
    }
}

/// Fire-and-forget pusher bound to one user identity
#[derive(Clone)]
pub struct MirrorHandle {
    mirror: Arc<dyn RemoteMirror>,
    user_id: Option<String>,
}

impl MirrorHandle {
    pub fn new(mirror: Arc<dyn RemoteMirror>, user_id: Option<String>) -> Self {
        Self { mirror, user_id }
    }

    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopMirror), None)
    }

    /// Push `state` in the background. Without a user identity, or outside a
    /// tokio runtime, this does nothing.
    pub fn push(&self, state: &TimerState) {
        let Some(user_id) = self.user_id.as_deref() else {
            return;
        };

        let upsert = self.mirror.upsert(user_id, state);
        let phase = state.phase;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    match upsert.await {
                        Ok(()) => debug!("Mirrored {} timer state", phase),
                        Err(e) => warn!("Remote mirror sync failed: {}", e),
                    }
                });
            }
            Err(_) => debug!("No runtime, skipping remote mirror push"),
        }
    }
}

impl std::fmt::Debug for MirrorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MirrorHandle")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}
