//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde::de::DeserializeOwned;
use tracing::{error, info, warn};

use crate::{
    error::TimerError,
    services::DEFAULT_REST_SECS,
    state::{AppState, TimerSnapshot, MAX_REST_MS},
};
use super::responses::{
    ApiResponse, HealthResponse, PreferencesResponse, SetAutoStartRequest, SetExerciseIdRequest,
    SetRestDefaultRequest, SetRestDurationRequest, StartExerciseRequest, StartRestRequest,
    StatusResponse,
};

type ApiResult<T> = Result<Json<T>, StatusCode>;

fn respond(
    action: &str,
    message: &str,
    result: Result<TimerSnapshot, TimerError>,
) -> ApiResult<ApiResponse> {
    match result {
        Ok(snapshot) => {
            info!("{} endpoint called - timer is {}", action, snapshot.phase);
            Ok(Json(ApiResponse::new(message, snapshot)))
        }
        Err(TimerError::InvalidValue { field, message: reason }) => {
            warn!("Rejected {} request: {}: {}", action, field, reason);
            Err(StatusCode::BAD_REQUEST)
        }
        Err(e) => {
            error!("Failed to handle {}: {}", action, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Body of an action whose request is optional. An empty body means
/// defaults; anything else has to parse.
fn optional_body<T: DeserializeOwned + Default>(action: &str, body: &Bytes) -> Result<T, StatusCode> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        warn!("Rejected {} body: {}", action, e);
        StatusCode::BAD_REQUEST
    })
}

/// Handle POST /exercise/start - Start an exercise interval
pub async fn start_exercise_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<ApiResponse> {
    let request: StartExerciseRequest = optional_body("start-exercise", &body)?;
    respond(
        "start-exercise",
        "Exercise started",
        state.start_exercise(request.exercise_id),
    )
}

/// Handle POST /rest/start - Start a rest countdown
pub async fn start_rest_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<ApiResponse> {
    let request: StartRestRequest = optional_body("start-rest", &body)?;
    respond("start-rest", "Rest started", state.start_rest(request.duration_ms))
}

/// Handle POST /reset - Reset the timer to idle
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    respond("reset", "Timer reset", state.reset())
}

/// Handle POST /stop - Stop everything and clear persisted state
pub async fn stop_all_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    respond("stop", "All timers stopped", state.stop_all())
}

/// Handle PUT /exercise-id - Change the exercise the timer belongs to
pub async fn set_exercise_id_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetExerciseIdRequest>,
) -> ApiResult<ApiResponse> {
    respond(
        "set-exercise-id",
        "Exercise updated",
        state.set_exercise_id(request.exercise_id),
    )
}

/// Handle PUT /rest-duration - Change the configured rest length
pub async fn set_rest_duration_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetRestDurationRequest>,
) -> ApiResult<ApiResponse> {
    respond(
        "set-rest-duration",
        "Rest duration updated",
        state.set_rest_duration(request.duration_ms),
    )
}

/// Handle GET /status - Return the current timer snapshot
pub async fn status_handler(State(state): State<Arc<AppState>>) -> ApiResult<StatusResponse> {
    let timer = match state.snapshot() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to get timer state: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    Ok(Json(StatusResponse {
        timer,
        auto_start: state.preferences().auto_start(),
        uptime: state.get_uptime(),
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

fn preferences_response(state: &AppState) -> PreferencesResponse {
    let preferences = state.preferences();
    PreferencesResponse {
        auto_start: preferences.auto_start(),
        rest_defaults: preferences.rest_defaults(),
        default_rest_secs: DEFAULT_REST_SECS,
    }
}

/// Handle GET /preferences - Return timer preferences
pub async fn preferences_handler(State(state): State<Arc<AppState>>) -> Json<PreferencesResponse> {
    Json(preferences_response(&state))
}

/// Handle PUT /preferences/auto-start - Toggle auto-start after rest
pub async fn set_auto_start_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetAutoStartRequest>,
) -> ApiResult<PreferencesResponse> {
    if let Err(e) = state.preferences().set_auto_start(request.enabled) {
        error!("Failed to save auto-start preference: {}", e);
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    Ok(Json(preferences_response(&state)))
}

/// Handle PUT /preferences/rest-default - Save an exercise's default rest
pub async fn set_rest_default_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetRestDefaultRequest>,
) -> ApiResult<PreferencesResponse> {
    if request.exercise_id.is_empty()
        || request.seconds == 0
        || request.seconds > MAX_REST_MS / 1000
    {
        warn!("Rejected rest default: {:?}", request);
        return Err(StatusCode::BAD_REQUEST);
    }
    if let Err(e) = state
        .preferences()
        .set_rest_default_secs(&request.exercise_id, request.seconds)
    {
        error!("Failed to save rest default: {}", e);
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    Ok(Json(preferences_response(&state)))
}
