//! Main application state management

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{
    machine::{TickEvent, Transition, MAX_REST_MS},
    PhaseMachine, TimerSnapshot, TimerState,
};
use crate::{
    alerts::{AlertDriver, AudioCue, Haptics, NoAudio, NoHaptics},
    clock::{Clock, SystemClock},
    error::{Result, TimerError},
    persistence::{KeyValueStore, MemoryStore, PersistenceAdapter},
    services::{MirrorHandle, NoopMirror, PreferenceStore, RemoteMirror},
};

/// Capabilities the timer is wired to. Every platform concern is a port with
/// a no-op or in-memory default.
pub struct TimerPorts {
    pub clock: Arc<dyn Clock>,
    pub store: Arc<dyn KeyValueStore>,
    pub mirror: Arc<dyn RemoteMirror>,
    pub user_id: Option<String>,
    pub audio: Arc<dyn AudioCue>,
    pub haptics: Arc<dyn Haptics>,
}

impl TimerPorts {
    /// System clock, in-memory store, no mirror, no audio or haptics
    pub fn in_memory() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            store: Arc::new(MemoryStore::new()),
            mirror: Arc::new(NoopMirror),
            user_id: None,
            audio: Arc::new(NoAudio),
            haptics: Arc::new(NoHaptics),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_mirror(mut self, mirror: Arc<dyn RemoteMirror>, user_id: Option<String>) -> Self {
        self.mirror = mirror;
        self.user_id = user_id;
        self
    }

    pub fn with_cues(mut self, audio: Arc<dyn AudioCue>, haptics: Arc<dyn Haptics>) -> Self {
        self.audio = audio;
        self.haptics = haptics;
        self
    }
}

/// Owns the phase machine and runs every side effect of its transitions.
///
/// Each action: stop the flash if the action cancels it, apply the
/// transition, persist, sync the alert driver, push to the mirror when the
/// phase changed, and publish a snapshot to subscribers. The machine lock is
/// held until the record is persisted so writes land in transition order.
pub struct AppState {
    machine: Mutex<PhaseMachine>,
    clock: Arc<dyn Clock>,
    persistence: PersistenceAdapter,
    preferences: PreferenceStore,
    alerts: AlertDriver,
    mirror: MirrorHandle,
    /// Server metadata
    pub start_time: Instant,
    /// Channel for snapshot updates
    snapshot_tx: watch::Sender<TimerSnapshot>,
    /// Keep the receiver alive to prevent channel closure
    _snapshot_rx: watch::Receiver<TimerSnapshot>,
}

impl AppState {
    /// Create the app state, resuming from the persisted record if it is
    /// still valid
    pub fn new(ports: TimerPorts) -> Self {
        let persistence = PersistenceAdapter::new(Arc::clone(&ports.store));
        let now = ports.clock.now_ms();
        let initial = persistence.build_initial_state(now);

        let alerts = AlertDriver::new(ports.audio, ports.haptics);
        alerts.sync(initial.phase, now);

        let snapshot = TimerSnapshot::capture(
            &initial,
            now,
            alerts.flash_index(now),
            alerts.flash_color(now),
        );
        let (snapshot_tx, snapshot_rx) = watch::channel(snapshot);

        Self {
            machine: Mutex::new(PhaseMachine::new(initial)),
            clock: ports.clock,
            persistence,
            preferences: PreferenceStore::new(ports.store),
            alerts,
            mirror: MirrorHandle::new(ports.mirror, ports.user_id),
            start_time: Instant::now(),
            snapshot_tx,
            _snapshot_rx: snapshot_rx,
        }
    }

    /// Lock the machine. A holder that panicked leaves the timer Idle with
    /// its persisted record cleared.
    fn lock_machine(&self) -> MutexGuard<'_, PhaseMachine> {
        self.machine.lock().unwrap_or_else(|poisoned| {
            warn!("Timer state lock poisoned, resetting to idle");
            let mut machine = poisoned.into_inner();
            machine.reset();
            self.alerts.stop_flash();
            if let Err(e) = self.persistence.clear() {
                warn!("Failed to clear persisted timer state: {}", e);
            }
            self.machine.clear_poison();
            machine
        })
    }

    /// Apply a transition and run its side effects
    fn apply<F>(&self, action: &str, cancels_alert: bool, transition: F) -> Result<TimerSnapshot>
    where
        F: FnOnce(&mut PhaseMachine, i64) -> Transition,
    {
        let mut machine = self.lock_machine();
        if cancels_alert {
            self.alerts.stop_flash();
        }

        let now = self.clock.now_ms();
        let transition = transition(&mut *machine, now);
        debug!("{}: {:?}", action, transition);
        self.after_transition(machine.state(), transition, now);

        let state = machine.state().clone();
        drop(machine); // Release the lock before notifying
        Ok(self.publish(&state, now))
    }

    /// Runs with the machine lock held, so records reach the store in
    /// transition order. `FileStore` writes block the calling thread.
    fn after_transition(&self, state: &TimerState, transition: Transition, now: i64) {
        if let Err(e) = self.persistence.save(state) {
            warn!("Failed to persist timer state: {}", e);
        }
        self.alerts.sync(state.phase, now);
        if transition.phase_changed() {
            self.mirror.push(state);
        }
    }

    fn publish(&self, state: &TimerState, now: i64) -> TimerSnapshot {
        let snapshot = TimerSnapshot::capture(
            state,
            now,
            self.alerts.flash_index(now),
            self.alerts.flash_color(now),
        );
        self.snapshot_tx.send_replace(snapshot.clone());
        snapshot
    }

    /// Start (or restart) an exercise interval, cancelling any rest
    pub fn start_exercise(&self, exercise_id: Option<String>) -> Result<TimerSnapshot> {
        self.apply("start-exercise", true, |machine, now| {
            machine.start_exercise(exercise_id, now)
        })
    }

    /// Start a rest countdown. Duration falls back to the configured rest
    /// length, then the exercise's saved default.
    pub fn start_rest(&self, duration_ms: Option<u64>) -> Result<TimerSnapshot> {
        if let Some(ms) = duration_ms {
            check_rest_duration(ms)?;
        }
        self.apply("start-rest", true, |machine, now| {
            let fallback = self
                .preferences
                .rest_default_ms(machine.state().exercise_id.as_deref());
            let duration = machine.resolve_rest_duration(duration_ms, fallback);
            machine.start_rest(duration, now)
        })
    }

    /// Clear everything back to idle
    pub fn reset(&self) -> Result<TimerSnapshot> {
        self.apply("reset", true, |machine, _| machine.reset())
    }

    /// Reset, delete the persisted record and push the cleared state to the
    /// mirror even if the timer was already idle
    pub fn stop_all(&self) -> Result<TimerSnapshot> {
        let mut machine = self.lock_machine();
        self.alerts.stop_flash();

        let now = self.clock.now_ms();
        let transition = machine.reset();
        self.after_transition(machine.state(), transition, now);
        if let Err(e) = self.persistence.clear() {
            warn!("Failed to clear persisted timer state: {}", e);
        }
        // after_transition only pushes on a phase change
        if !transition.phase_changed() {
            self.mirror.push(machine.state());
        }

        let state = machine.state().clone();
        drop(machine);
        info!("All timers stopped");
        Ok(self.publish(&state, now))
    }

    /// Change the exercise the timer belongs to; `None` clears it
    pub fn set_exercise_id(&self, exercise_id: Option<String>) -> Result<TimerSnapshot> {
        if exercise_id.as_deref() == Some("") {
            return Err(TimerError::InvalidValue {
                field: "exerciseId",
                message: "must not be empty".to_string(),
            });
        }
        self.apply("set-exercise-id", false, |machine, _| {
            machine.set_exercise_id(exercise_id)
        })
    }

    pub fn set_rest_duration(&self, duration_ms: u64) -> Result<TimerSnapshot> {
        check_rest_duration(duration_ms)?;
        self.apply("set-rest-duration", false, |machine, _| {
            machine.set_rest_duration(duration_ms)
        })
    }

    /// One refresher tick: evaluate the time-driven guards, fire the end cue
    /// if rest just ended, and publish fresh display values
    pub fn tick(&self) -> Result<TimerSnapshot> {
        let mut machine = self.lock_machine();
        let now = self.clock.now_ms();
        let from = machine.phase();

        let event = machine.tick(now, || self.preferences.auto_start());
        if let Some(event) = event {
            let transition = Transition::between(from, machine.phase());
            match event {
                TickEvent::EnteredAlert => info!("Rest almost over, alerting"),
                TickEvent::RestEnded { auto_started } => {
                    info!("Rest ended (auto-start: {})", auto_started);
                    self.alerts.stop_flash();
                    self.alerts.fire_end_cue();
                }
                TickEvent::SafetyCutoff { elapsed_ms } => {
                    warn!("Exercise timer left running for {}ms, reset", elapsed_ms);
                }
            }
            self.after_transition(machine.state(), transition, now);
        } else {
            // Restored Alert states start flashing here
            self.alerts.sync(machine.phase(), now);
        }

        let state = machine.state().clone();
        drop(machine);
        Ok(self.publish(&state, now))
    }

    /// Subscribe to snapshots published on every transition and tick
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Current snapshot, recomputed at the current time
    pub fn snapshot(&self) -> Result<TimerSnapshot> {
        let now = self.clock.now_ms();
        let machine = self.lock_machine();
        Ok(TimerSnapshot::capture(
            machine.state(),
            now,
            self.alerts.flash_index(now),
            self.alerts.flash_color(now),
        ))
    }

    /// Copy of the stored timer record
    pub fn timer_state(&self) -> Result<TimerState> {
        Ok(self.lock_machine().state().clone())
    }

    pub fn preferences(&self) -> &PreferenceStore {
        &self.preferences
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("machine", &self.machine)
            .field("alerts", &self.alerts)
            .field("mirror", &self.mirror)
            .finish_non_exhaustive()
    }
}

fn check_rest_duration(duration_ms: u64) -> Result<()> {
    if duration_ms > MAX_REST_MS {
        return Err(TimerError::InvalidValue {
            field: "durationMs",
            message: format!("must be at most {}ms", MAX_REST_MS),
        });
    }
    Ok(())
}
