//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/exercise/start", post(start_exercise_handler))
        .route("/rest/start", post(start_rest_handler))
        .route("/reset", post(reset_handler))
        .route("/stop", post(stop_all_handler))
        .route("/exercise-id", put(set_exercise_id_handler))
        .route("/rest-duration", put(set_rest_duration_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .route("/preferences", get(preferences_handler))
        .route("/preferences/auto-start", put(set_auto_start_handler))
        .route("/preferences/rest-default", put(set_rest_default_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
