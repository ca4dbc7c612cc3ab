//! Alert and notification driver
//!
//! Consumes phase changes only: it flashes while the timer is in Alert and
//! plays the end-of-rest cue when told to. It never changes timer state.

pub mod cues;
pub mod flash;

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::state::Phase;

pub use cues::{AudioCue, Haptics, NoAudio, NoHaptics, TerminalBell, VIBRATION_PATTERN_MS};
pub use flash::{FlashCycle, FLASH_COLORS, FLASH_INTERVAL_MS};

pub struct AlertDriver {
    flash: Mutex<FlashCycle>,
    audio: Arc<dyn AudioCue>,
    haptics: Arc<dyn Haptics>,
}

impl AlertDriver {
    pub fn new(audio: Arc<dyn AudioCue>, haptics: Arc<dyn Haptics>) -> Self {
        Self {
            flash: Mutex::new(FlashCycle::default()),
            audio,
            haptics,
        }
    }

    /// Driver with no audio or haptics; only the flash cycle runs
    pub fn silent() -> Self {
        Self::new(Arc::new(NoAudio), Arc::new(NoHaptics))
    }

    /// Run the flash while `phase` is Alert and stop it otherwise
    pub fn sync(&self, phase: Phase, now_ms: i64) {
        let Ok(mut flash) = self.flash.lock() else {
            return;
        };
        match (phase == Phase::Alert, flash.is_running()) {
            (true, false) => {
                debug!("Starting alert flash");
                flash.start(now_ms);
            }
            (false, true) => {
                debug!("Stopping alert flash");
                flash.stop();
            }
            _ => {}
        }
    }

    pub fn stop_flash(&self) {
        if let Ok(mut flash) = self.flash.lock() {
            flash.stop();
        }
    }

    pub fn flash_index(&self, now_ms: i64) -> usize {
        self.flash.lock().map(|f| f.index(now_ms)).unwrap_or(0)
    }

    pub fn flash_color(&self, now_ms: i64) -> Option<&'static str> {
        self.flash.lock().ok().and_then(|f| f.color(now_ms))
    }

    /// Haptic pulse then audio. Failures are ignored: the flash and the
    /// countdown remain the authoritative feedback.
    pub fn fire_end_cue(&self) {
        if let Err(e) = self.haptics.pulse(&VIBRATION_PATTERN_MS) {
            debug!("Haptic cue skipped: {}", e);
        }
        if let Err(e) = self.audio.play() {
            debug!("Audio cue skipped: {}", e);
        }
    }
}

impl std::fmt::Debug for AlertDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertDriver")
            .field("flash", &self.flash)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AlertError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl AudioCue for Counting {
        fn play(&self) -> Result<(), AlertError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(AlertError::Unavailable("audio"))
        }
    }

    impl Haptics for Counting {
        fn pulse(&self, pattern_ms: &[u64]) -> Result<(), AlertError> {
            assert_eq!(pattern_ms, &VIBRATION_PATTERN_MS);
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn flash_follows_alert_phase() {
        let driver = AlertDriver::silent();
        driver.sync(Phase::Resting, 0);
        assert_eq!(driver.flash_color(0), None);

        driver.sync(Phase::Alert, 1_000);
        assert_eq!(driver.flash_index(1_400), 1);
        driver.sync(Phase::Alert, 1_500);
        assert_eq!(driver.flash_index(1_800), 2);

        driver.sync(Phase::Idle, 2_000);
        assert_eq!(driver.flash_index(2_400), 0);
        assert_eq!(driver.flash_color(2_400), None);
    }

    #[test]
    fn failing_cues_are_swallowed() {
        let audio = Arc::new(Counting::default());
        let haptics = Arc::new(Counting::default());
        let driver = AlertDriver::new(audio.clone(), haptics.clone());
        driver.fire_end_cue();
        assert_eq!(audio.0.load(Ordering::SeqCst), 1);
        assert_eq!(haptics.0.load(Ordering::SeqCst), 1);
    }
}
