//! Phase state machine
//!
//! Owns one [`TimerState`] and applies every transition to it. All methods
//! take the current wall-clock time as an argument; nothing in here samples a
//! clock, persists, or fires side effects. Those are the caller's job.
//!
//! ```text
//! Idle -> Exercising -> Resting -> Alert -> Idle
//!            ^                        |
//!            +------ auto-start ------+
//! ```

use tracing::{debug, info};

use super::{Phase, TimerState};

/// Remaining rest at or below which the timer enters Alert
pub const ALERT_THRESHOLD_MS: u64 = 5_000;

/// Exercising longer than this is treated as a forgotten timer
pub const SAFETY_CUTOFF_MS: u64 = 30 * 60 * 1000;

/// Longest rest the timer will count down
pub const MAX_REST_MS: u64 = 24 * 60 * 60 * 1000;

/// Phase change produced by an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Phase,
    pub to: Phase,
}

impl Transition {
    pub fn between(from: Phase, to: Phase) -> Self {
        Self { from, to }
    }

    pub fn phase_changed(&self) -> bool {
        self.from != self.to
    }
}

/// What a refresher tick caused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEvent {
    /// Rest dropped into the alert window
    EnteredAlert,
    /// Rest reached zero. Produced by the transition out of Resting/Alert, so
    /// it can only be observed once per rest.
    RestEnded { auto_started: bool },
    /// Exercise ran past the safety cutoff and was reset
    SafetyCutoff { elapsed_ms: u64 },
}

#[derive(Debug, Clone, Default)]
pub struct PhaseMachine {
    state: TimerState,
}

impl PhaseMachine {
    pub fn new(state: TimerState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Begin an exercise interval. Legal from any phase; a missing or empty id
    /// falls back to the previously recorded one.
    pub fn start_exercise(&mut self, exercise_id: Option<String>, now_ms: i64) -> Transition {
        let from = self.state.phase;
        let exercise_id = exercise_id
            .filter(|id| !id.is_empty())
            .or_else(|| self.state.exercise_id.take());

        self.enter_exercising(now_ms);
        self.state.exercise_id = exercise_id;

        info!(
            "Exercise started ({:?}) from {}",
            self.state.exercise_id, from
        );
        Transition::between(from, Phase::Exercising)
    }

    /// Begin a rest countdown of `duration_ms`, freezing the exercise time.
    /// Durations above [`MAX_REST_MS`] are clamped.
    pub fn start_rest(&mut self, duration_ms: u64, now_ms: i64) -> Transition {
        let from = self.state.phase;
        let duration_ms = duration_ms.min(MAX_REST_MS);
        let frozen = self.state.exercise_elapsed_ms(now_ms);

        self.state.phase = Phase::Resting;
        self.state.exercise_elapsed_frozen = frozen;
        self.state.exercise_started_at = None;
        self.state.paused_duration = 0;
        let duration = i64::try_from(duration_ms).unwrap_or(i64::MAX);
        self.state.rest_end_at = Some(now_ms.saturating_add(duration));
        self.state.rest_duration_ms = duration_ms;

        info!(
            "Rest started for {}ms after {}ms of exercise",
            duration_ms, frozen
        );
        Transition::between(from, Phase::Resting)
    }

    /// Clear every field back to defaults
    pub fn reset(&mut self) -> Transition {
        let from = self.state.phase;
        self.state = TimerState::new();
        info!("Timer reset from {}", from);
        Transition::between(from, Phase::Idle)
    }

    /// Metadata only, legal in any phase
    pub fn set_exercise_id(&mut self, exercise_id: Option<String>) -> Transition {
        self.state.exercise_id = exercise_id;
        Transition::between(self.state.phase, self.state.phase)
    }

    /// Update the configured rest length without touching a running countdown
    pub fn set_rest_duration(&mut self, duration_ms: u64) -> Transition {
        self.state.rest_duration_ms = duration_ms;
        Transition::between(self.state.phase, self.state.phase)
    }

    /// Rest length for a `start_rest` request: explicit value, then the
    /// configured length, then `fallback`. Never above [`MAX_REST_MS`].
    pub fn resolve_rest_duration(&self, requested_ms: Option<u64>, fallback_ms: u64) -> u64 {
        requested_ms
            .filter(|ms| *ms > 0)
            .or(Some(self.state.rest_duration_ms).filter(|ms| *ms > 0))
            .unwrap_or(fallback_ms)
            .min(MAX_REST_MS)
    }

    /// Evaluate the time-driven guards.
    ///
    /// Order is fixed: safety cutoff for Exercising, then alert entry, then
    /// rest end. Alert entry needs `remaining > 0` and rest end needs
    /// `remaining == 0`, so one tick can never both enter and leave Alert.
    /// `auto_start` is only consulted when the rest actually ends.
    pub fn tick<F>(&mut self, now_ms: i64, auto_start: F) -> Option<TickEvent>
    where
        F: FnOnce() -> bool,
    {
        match self.state.phase {
            Phase::Idle => None,
            Phase::Exercising => {
                let elapsed_ms = self.state.exercise_elapsed_ms(now_ms);
                if elapsed_ms >= SAFETY_CUTOFF_MS {
                    info!("Exercise ran for {}ms, forcing reset", elapsed_ms);
                    self.state = TimerState::new();
                    Some(TickEvent::SafetyCutoff { elapsed_ms })
                } else {
                    None
                }
            }
            Phase::Resting | Phase::Alert => {
                let remaining = self.state.rest_remaining_ms(now_ms);

                if self.state.phase == Phase::Resting
                    && remaining <= ALERT_THRESHOLD_MS
                    && remaining > 0
                {
                    debug!("{}ms of rest left, entering alert", remaining);
                    self.state.phase = Phase::Alert;
                    return Some(TickEvent::EnteredAlert);
                }

                if remaining == 0 {
                    let auto_started = auto_start();
                    self.end_rest(auto_started, now_ms);
                    return Some(TickEvent::RestEnded { auto_started });
                }

                None
            }
        }
    }

    fn end_rest(&mut self, auto_start: bool, now_ms: i64) {
        if auto_start {
            info!("Rest ended, auto-starting {:?}", self.state.exercise_id);
            self.enter_exercising(now_ms);
        } else {
            info!("Rest ended, going idle");
            let exercise_id = self.state.exercise_id.take();
            let rest_duration_ms = self.state.rest_duration_ms;
            self.state = TimerState {
                exercise_id,
                rest_duration_ms,
                ..TimerState::new()
            };
        }
    }

    fn enter_exercising(&mut self, now_ms: i64) {
        self.state.phase = Phase::Exercising;
        self.state.exercise_started_at = Some(now_ms);
        self.state.paused_duration = 0;
        self.state.exercise_elapsed_frozen = 0;
        self.state.rest_end_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_700_000_000_000;

    fn exercising(id: &str) -> PhaseMachine {
        let mut machine = PhaseMachine::default();
        machine.start_exercise(Some(id.to_string()), T0);
        machine
    }

    #[test]
    fn start_exercise_from_idle() {
        let machine = exercising("squat");
        let state = machine.state();
        assert_eq!(state.phase, Phase::Exercising);
        assert_eq!(state.exercise_started_at, Some(T0));
        assert_eq!(state.exercise_id.as_deref(), Some("squat"));
        assert!(state.is_consistent());
    }

    #[test]
    fn start_exercise_without_id_keeps_previous() {
        let mut machine = exercising("bench");
        machine.start_rest(60_000, T0 + 1_000);
        machine.start_exercise(None, T0 + 2_000);
        assert_eq!(machine.state().exercise_id.as_deref(), Some("bench"));

        machine.start_exercise(Some(String::new()), T0 + 3_000);
        assert_eq!(machine.state().exercise_id.as_deref(), Some("bench"));
    }

    #[test]
    fn start_rest_freezes_elapsed() {
        let mut machine = exercising("squat");
        let transition = machine.start_rest(90_000, T0 + 65_000);
        assert!(transition.phase_changed());

        let state = machine.state();
        assert_eq!(state.phase, Phase::Resting);
        assert_eq!(state.exercise_elapsed_frozen, 65_000);
        assert_eq!(state.exercise_started_at, None);
        assert_eq!(state.rest_end_at, Some(T0 + 155_000));
        assert_eq!(state.rest_duration_ms, 90_000);
        assert_eq!(state.rest_remaining_ms(T0 + 65_000), 90_000);
        assert!(state.is_consistent());
    }

    #[test]
    fn restarting_rest_keeps_frozen_exercise_time() {
        let mut machine = exercising("squat");
        machine.start_rest(90_000, T0 + 30_000);
        machine.start_rest(45_000, T0 + 40_000);
        assert_eq!(machine.state().exercise_elapsed_frozen, 30_000);
        assert_eq!(machine.state().rest_end_at, Some(T0 + 85_000));
    }

    #[test]
    fn manual_start_during_rest_cancels_countdown() {
        let mut machine = exercising("squat");
        machine.start_rest(90_000, T0 + 10_000);
        let transition = machine.start_exercise(None, T0 + 20_000);
        assert_eq!(transition.from, Phase::Resting);
        assert_eq!(machine.state().rest_end_at, None);
        assert_eq!(machine.state().exercise_started_at, Some(T0 + 20_000));
        assert_eq!(machine.state().exercise_elapsed_frozen, 0);
    }

    #[test]
    fn tick_enters_alert_then_ends_rest() {
        let mut machine = exercising("squat");
        machine.start_rest(90_000, T0);
        let end = T0 + 90_000;

        assert_eq!(machine.tick(end - 6_000, || false), None);
        assert_eq!(machine.phase(), Phase::Resting);

        assert_eq!(machine.tick(end - 4_000, || false), Some(TickEvent::EnteredAlert));
        assert_eq!(machine.phase(), Phase::Alert);
        assert_eq!(machine.tick(end - 3_000, || false), None);

        assert_eq!(
            machine.tick(end, || false),
            Some(TickEvent::RestEnded { auto_started: false })
        );
        let state = machine.state();
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.exercise_id.as_deref(), Some("squat"));
        assert_eq!(state.rest_duration_ms, 90_000);
        assert!(state.is_consistent());

        // Nothing left to end
        assert_eq!(machine.tick(end + 100, || false), None);
    }

    #[test]
    fn rest_end_fires_once_across_consecutive_ticks() {
        let mut machine = exercising("row");
        machine.start_rest(10_000, T0);
        let events: Vec<_> = (0..5)
            .filter_map(|i| machine.tick(T0 + 10_000 + i * 100, || false))
            .collect();
        assert_eq!(events, vec![TickEvent::RestEnded { auto_started: false }]);
    }

    #[test]
    fn tick_past_alert_window_ends_rest_directly() {
        let mut machine = exercising("row");
        machine.start_rest(10_000, T0);
        assert_eq!(
            machine.tick(T0 + 60_000, || false),
            Some(TickEvent::RestEnded { auto_started: false })
        );
    }

    #[test]
    fn auto_start_chains_into_exercise() {
        let mut machine = exercising("deadlift");
        machine.start_rest(60_000, T0);
        let event = machine.tick(T0 + 60_000, || true);
        assert_eq!(event, Some(TickEvent::RestEnded { auto_started: true }));

        let state = machine.state();
        assert_eq!(state.phase, Phase::Exercising);
        assert_eq!(state.exercise_started_at, Some(T0 + 60_000));
        assert_eq!(state.exercise_id.as_deref(), Some("deadlift"));
        assert_eq!(state.rest_end_at, None);
    }

    #[test]
    fn auto_start_only_read_when_rest_ends() {
        let mut machine = exercising("deadlift");
        machine.start_rest(60_000, T0);
        machine.tick(T0 + 1_000, || panic!("read too early"));
        machine.tick(T0 + 58_000, || panic!("read too early"));
    }

    #[test]
    fn safety_cutoff_resets_forgotten_exercise() {
        let mut machine = exercising("plank");
        assert_eq!(machine.tick(T0 + SAFETY_CUTOFF_MS as i64 - 1, || false), None);
        let event = machine.tick(T0 + SAFETY_CUTOFF_MS as i64, || false);
        assert!(matches!(event, Some(TickEvent::SafetyCutoff { .. })));
        assert_eq!(machine.state(), &TimerState::new());
    }

    #[test]
    fn reset_clears_everything() {
        let mut machine = exercising("squat");
        machine.set_rest_duration(120_000);
        let transition = machine.reset();
        assert_eq!(transition, Transition { from: Phase::Exercising, to: Phase::Idle });
        assert_eq!(machine.state(), &TimerState::new());
        assert!(!machine.reset().phase_changed());
    }

    #[test]
    fn set_rest_duration_leaves_countdown_alone() {
        let mut machine = exercising("squat");
        machine.start_rest(90_000, T0);
        let transition = machine.set_rest_duration(30_000);
        assert!(!transition.phase_changed());
        assert_eq!(machine.state().rest_end_at, Some(T0 + 90_000));
        assert_eq!(machine.state().rest_duration_ms, 30_000);
    }

    #[test]
    fn rest_duration_resolution_order() {
        let mut machine = PhaseMachine::default();
        assert_eq!(machine.resolve_rest_duration(None, 90_000), 90_000);
        machine.set_rest_duration(45_000);
        assert_eq!(machine.resolve_rest_duration(None, 90_000), 45_000);
        assert_eq!(machine.resolve_rest_duration(Some(0), 90_000), 45_000);
        assert_eq!(machine.resolve_rest_duration(Some(20_000), 90_000), 20_000);
    }

    #[test]
    fn oversized_rest_is_clamped_and_keeps_resting() {
        let mut machine = exercising("squat");
        machine.start_rest(u64::MAX, T0 + 1_000);
        let state = machine.state();
        assert_eq!(state.rest_duration_ms, MAX_REST_MS);
        assert_eq!(state.rest_end_at, Some(T0 + 1_000 + MAX_REST_MS as i64));

        assert_eq!(machine.tick(T0 + 1_100, || true), None);
        assert_eq!(machine.phase(), Phase::Resting);
    }

    #[test]
    fn resolved_rest_never_exceeds_max() {
        let mut machine = PhaseMachine::default();
        assert_eq!(machine.resolve_rest_duration(Some(u64::MAX), 90_000), MAX_REST_MS);
        assert_eq!(machine.resolve_rest_duration(None, u64::MAX), MAX_REST_MS);
        machine.set_rest_duration(u64::MAX);
        assert_eq!(machine.resolve_rest_duration(None, 90_000), MAX_REST_MS);
    }

    #[test]
    fn phase_exclusivity_holds_through_a_session() {
        let mut machine = PhaseMachine::default();
        let mut now = T0;
        let check = |m: &PhaseMachine| assert!(m.state().is_consistent(), "{:?}", m.state());

        machine.start_exercise(Some("squat".into()), now);
        check(&machine);
        now += 40_000;
        machine.start_rest(20_000, now);
        check(&machine);
        while machine.phase() != Phase::Idle {
            now += 100;
            machine.tick(now, || false);
            check(&machine);
        }
    }
}
