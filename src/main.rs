//! Workout Timer - A persistent exercise/rest timer service
//!
//! This is the main entry point for the workout-timer application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use workout_timer::{
    alerts::{AudioCue, NoAudio, NoHaptics, TerminalBell},
    api::create_router,
    config::Config,
    persistence::FileStore,
    services::{HttpMirror, NoopMirror, RemoteMirror},
    state::{AppState, TimerPorts},
    tasks::display_refresher_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("workout_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting workout-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, data_dir={}, tick={}ms",
          config.host, config.port, config.data_dir.display(), config.tick_ms);

    let mirror: Arc<dyn RemoteMirror> = match &config.mirror_url {
        Some(url) if config.mirror_enabled() => {
            info!("Mirroring timer state to {}", url);
            Arc::new(HttpMirror::new(url.clone(), config.mirror_key.clone()))
        }
        _ => Arc::new(NoopMirror),
    };
    let audio: Arc<dyn AudioCue> = if config.bell {
        Arc::new(TerminalBell)
    } else {
        Arc::new(NoAudio)
    };

    let ports = TimerPorts::in_memory()
        .with_store(Arc::new(FileStore::new(&config.data_dir)))
        .with_mirror(mirror, config.user_id.clone())
        .with_cues(audio, Arc::new(NoHaptics));

    // Create application state, resuming any persisted timer
    let state = Arc::new(AppState::new(ports));
    let snapshot = state.snapshot()?;
    info!("Timer is {} ({})", snapshot.phase,
          if snapshot.is_resting { &snapshot.rest_display } else { &snapshot.exercise_display });

    // Start the display refresher background task
    let refresher_state = Arc::clone(&state);
    let cadence = config.tick();
    tokio::spawn(async move {
        display_refresher_task(refresher_state, cadence).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /exercise/start          - Start an exercise interval");
    info!("  POST /rest/start              - Start a rest countdown");
    info!("  POST /reset                   - Reset the timer");
    info!("  POST /stop                    - Stop everything and clear saved state");
    info!("  PUT  /exercise-id             - Change the current exercise");
    info!("  PUT  /rest-duration           - Change the configured rest length");
    info!("  GET  /status                  - Current timer snapshot");
    info!("  GET  /preferences             - Auto-start and rest defaults");
    info!("  PUT  /preferences/auto-start  - Toggle auto-start");
    info!("  PUT  /preferences/rest-default - Save an exercise's rest default");
    info!("  GET  /health                  - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
