//! End-to-end timer scenarios driven by a manual clock

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use futures::future::BoxFuture;
use workout_timer::{
    alerts::{AudioCue, Haptics},
    clock::{Clock, ManualClock},
    error::{AlertError, MirrorError},
    persistence::{FileStore, KeyValueStore, MemoryStore, PersistenceAdapter, TIMER_STATE_KEY},
    services::RemoteMirror,
    state::{AppState, Phase, TimerPorts, TimerState, SAFETY_CUTOFF_MS},
};

const T0: i64 = 1_700_000_000_000;
const TICK: i64 = 100;

#[derive(Default)]
struct CueCounter {
    beeps: AtomicUsize,
    pulses: AtomicUsize,
}

impl AudioCue for CueCounter {
    fn play(&self) -> Result<(), AlertError> {
        self.beeps.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Haptics for CueCounter {
    fn pulse(&self, _pattern_ms: &[u64]) -> Result<(), AlertError> {
        self.pulses.fetch_add(1, Ordering::SeqCst);
        Err(AlertError::Unavailable("haptics"))
    }
}

#[derive(Default)]
struct RecordingMirror {
    pushes: Mutex<Vec<(String, Phase)>>,
}

impl RemoteMirror for RecordingMirror {
    fn upsert(&self, user_id: &str, state: &TimerState) -> BoxFuture<'static, Result<(), MirrorError>> {
        self.pushes
            .lock()
            .unwrap()
            .push((user_id.to_string(), state.phase));
        Box::pin(async { Ok(()) })
    }
}

struct Harness {
    clock: ManualClock,
    store: Arc<MemoryStore>,
    cues: Arc<CueCounter>,
    mirror: Arc<RecordingMirror>,
    app: AppState,
}

impl Harness {
    fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), T0)
    }

    fn with_store(store: Arc<MemoryStore>, now: i64) -> Self {
        let clock = ManualClock::new(now);
        let cues = Arc::new(CueCounter::default());
        let mirror = Arc::new(RecordingMirror::default());
        let app = AppState::new(
            TimerPorts::in_memory()
                .with_clock(Arc::new(clock.clone()))
                .with_store(store.clone())
                .with_mirror(mirror.clone(), Some("user-1".to_string()))
                .with_cues(cues.clone(), cues.clone()),
        );
        Self { clock, store, cues, mirror, app }
    }

    /// Advance the clock to `target` one refresher tick at a time
    fn tick_until(&self, target: i64) {
        while self.clock.now_ms() < target {
            let step = TICK.min(target - self.clock.now_ms());
            self.clock.advance(step);
            self.app.tick().unwrap();
        }
    }

    fn mirrored_phases(&self) -> Vec<Phase> {
        self.mirror.pushes.lock().unwrap().iter().map(|(_, p)| *p).collect()
    }
}

#[test]
fn squat_session_ends_idle_without_auto_start() {
    let h = Harness::new();

    h.app.start_exercise(Some("squat".to_string())).unwrap();
    h.tick_until(T0 + 65_000);
    let snapshot = h.app.snapshot().unwrap();
    let reading = snapshot.exercise_elapsed_ms;
    assert!((65_000..=65_000 + TICK as u64).contains(&reading));

    let snapshot = h.app.start_rest(Some(90_000)).unwrap();
    assert_eq!(h.app.timer_state().unwrap().exercise_elapsed_frozen, reading);
    assert_eq!(snapshot.rest_remaining_ms, 90_000);
    assert_eq!(snapshot.rest_display, "1:30");

    let rest_end = h.app.timer_state().unwrap().rest_end_at.unwrap();
    h.tick_until(rest_end - 4_000);
    let snapshot = h.app.snapshot().unwrap();
    assert_eq!(snapshot.phase, Phase::Alert);
    assert!(snapshot.flash_color.is_some());

    h.tick_until(rest_end);
    let snapshot = h.app.snapshot().unwrap();
    assert_eq!(snapshot.phase, Phase::Idle);
    assert_eq!(snapshot.exercise_id.as_deref(), Some("squat"));
    assert_eq!(snapshot.flash_idx, 0);
    assert_eq!(snapshot.flash_color, None);

    // End cue fires exactly once even with more ticks
    h.tick_until(rest_end + 1_000);
    assert_eq!(h.cues.beeps.load(Ordering::SeqCst), 1);
    assert_eq!(h.cues.pulses.load(Ordering::SeqCst), 1);

    // Idle deletes the persisted record
    assert_eq!(h.store.get(TIMER_STATE_KEY).unwrap(), None);
}

#[test]
fn auto_start_chains_into_next_exercise() {
    let h = Harness::new();
    h.app.preferences().set_auto_start(true).unwrap();

    h.app.start_exercise(Some("bench".to_string())).unwrap();
    h.tick_until(T0 + 30_000);
    h.app.start_rest(Some(60_000)).unwrap();
    h.tick_until(T0 + 90_000);

    let state = h.app.timer_state().unwrap();
    assert_eq!(state.phase, Phase::Exercising);
    assert_eq!(state.exercise_started_at, Some(T0 + 90_000));
    assert_eq!(state.exercise_id.as_deref(), Some("bench"));
    assert_eq!(h.cues.beeps.load(Ordering::SeqCst), 1);
    assert_eq!(
        h.mirrored_phases(),
        vec![Phase::Exercising, Phase::Resting, Phase::Alert, Phase::Exercising]
    );
}

#[test]
fn rest_falls_back_to_saved_exercise_default() {
    let h = Harness::new();
    h.app.preferences().set_rest_default_secs("deadlift", 180).unwrap();

    h.app.start_exercise(Some("deadlift".to_string())).unwrap();
    let snapshot = h.app.start_rest(None).unwrap();
    assert_eq!(snapshot.rest_duration_ms, 180_000);

    // The configured length wins once set
    h.app.set_rest_duration(45_000).unwrap();
    h.app.start_exercise(None).unwrap();
    let snapshot = h.app.start_rest(None).unwrap();
    assert_eq!(snapshot.rest_duration_ms, 45_000);
}

#[test]
fn manual_start_during_alert_cancels_flash() {
    let h = Harness::new();
    h.app.start_exercise(Some("row".to_string())).unwrap();
    h.app.start_rest(Some(10_000)).unwrap();
    h.tick_until(T0 + 7_000);
    assert!(h.app.snapshot().unwrap().is_alert);

    let snapshot = h.app.start_exercise(None).unwrap();
    assert_eq!(snapshot.phase, Phase::Exercising);
    assert_eq!(snapshot.flash_color, None);
    h.tick_until(T0 + 20_000);
    assert_eq!(h.cues.beeps.load(Ordering::SeqCst), 0);
}

#[test]
fn safety_cutoff_resets_live_exercise() {
    let h = Harness::new();
    h.app.start_exercise(Some("plank".to_string())).unwrap();
    h.clock.advance(SAFETY_CUTOFF_MS as i64 + 1);
    let snapshot = h.app.tick().unwrap();
    assert!(snapshot.is_idle);
    assert_eq!(h.app.timer_state().unwrap(), TimerState::new());
}

#[test]
fn recovery_reproduces_live_state() {
    let store = Arc::new(MemoryStore::new());
    let first = Harness::with_store(store.clone(), T0);
    first.app.start_exercise(Some("squat".to_string())).unwrap();
    first.tick_until(T0 + 20_000);
    first.app.start_rest(Some(90_000)).unwrap();
    first.tick_until(T0 + 50_000);
    let before = first.app.snapshot().unwrap();

    let second = Harness::with_store(store, T0 + 50_000);
    let after = second.app.snapshot().unwrap();
    assert_eq!(after.phase, before.phase);
    assert_eq!(after.exercise_id, before.exercise_id);
    assert!(after.rest_remaining_ms.abs_diff(before.rest_remaining_ms) <= TICK as u64);
    assert_eq!(after.exercise_elapsed_ms, before.exercise_elapsed_ms);
}

#[test]
fn restored_alert_resumes_flashing() {
    let store = Arc::new(MemoryStore::new());
    let first = Harness::with_store(store.clone(), T0);
    first.app.start_exercise(Some("squat".to_string())).unwrap();
    first.app.start_rest(Some(10_000)).unwrap();
    first.tick_until(T0 + 6_000);
    assert!(first.app.snapshot().unwrap().is_alert);

    let second = Harness::with_store(store, T0 + 7_000);
    let snapshot = second.app.snapshot().unwrap();
    assert!(snapshot.is_alert);
    assert!(snapshot.flash_color.is_some());
}

#[test]
fn stale_rest_record_reconstructs_idle() {
    let store = Arc::new(MemoryStore::new());
    let stale = TimerState {
        phase: Phase::Resting,
        exercise_id: Some("squat".to_string()),
        rest_end_at: Some(T0 - 10 * 60 * 1000),
        rest_duration_ms: 90_000,
        ..TimerState::new()
    };
    PersistenceAdapter::new(store.clone()).save(&stale).unwrap();

    let h = Harness::with_store(store, T0);
    assert_eq!(h.app.snapshot().unwrap().phase, Phase::Idle);
    assert_eq!(h.store.get(TIMER_STATE_KEY).unwrap(), None);
}

#[test]
fn stop_all_always_mirrors_cleared_state() {
    let h = Harness::new();
    h.app.stop_all().unwrap();
    assert_eq!(h.mirrored_phases(), vec![Phase::Idle]);

    h.app.start_exercise(Some("squat".to_string())).unwrap();
    h.app.stop_all().unwrap();
    assert_eq!(
        h.mirrored_phases(),
        vec![Phase::Idle, Phase::Exercising, Phase::Idle]
    );
    assert_eq!(h.store.get(TIMER_STATE_KEY).unwrap(), None);
}

#[test]
fn metadata_changes_persist_without_mirroring() {
    let h = Harness::new();
    h.app.start_exercise(Some("squat".to_string())).unwrap();
    h.app.set_exercise_id(Some("front-squat".to_string())).unwrap();
    assert!(h.app.set_exercise_id(Some(String::new())).is_err());

    let saved = PersistenceAdapter::new(h.store.clone()).load().unwrap();
    assert_eq!(saved.exercise_id.as_deref(), Some("front-squat"));
    assert_eq!(h.mirrored_phases(), vec![Phase::Exercising]);
}

#[test]
fn file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(T0);
    let ports = || {
        TimerPorts::in_memory()
            .with_clock(Arc::new(clock.clone()))
            .with_store(Arc::new(FileStore::new(dir.path())))
    };

    let app = AppState::new(ports());
    app.start_exercise(Some("ohp".to_string())).unwrap();
    drop(app);

    clock.advance(42_000);
    let app = AppState::new(ports());
    let snapshot = app.snapshot().unwrap();
    assert!(snapshot.is_exercising);
    assert_eq!(snapshot.exercise_elapsed_ms, 42_000);
    assert_eq!(snapshot.exercise_display, "0:42");
}
