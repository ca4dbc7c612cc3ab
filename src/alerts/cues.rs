//! Audio and haptic cue ports

use std::io::Write;

use crate::error::AlertError;

/// Number of beeps played when a rest ends
pub const BEEP_COUNT: usize = 3;

/// Vibration pattern in ms, alternating on/off
pub const VIBRATION_PATTERN_MS: [u64; 5] = [200, 100, 200, 100, 400];

/// Plays the end-of-rest sound
pub trait AudioCue: Send + Sync {
    fn play(&self) -> Result<(), AlertError>;
}

/// Drives the device's vibration motor
pub trait Haptics: Send + Sync {
    fn pulse(&self, pattern_ms: &[u64]) -> Result<(), AlertError>;
}

/// Silent fallback
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAudio;

impl AudioCue for NoAudio {
    fn play(&self) -> Result<(), AlertError> {
        Err(AlertError::Unavailable("audio"))
    }
}

/// Fallback for devices without a vibration motor
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHaptics;

impl Haptics for NoHaptics {
    fn pulse(&self, _pattern_ms: &[u64]) -> Result<(), AlertError> {
        Err(AlertError::Unavailable("haptics"))
    }
}

/// Rings the terminal bell on stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalBell;

impl AudioCue for TerminalBell {
    fn play(&self) -> Result<(), AlertError> {
        let mut stderr = std::io::stderr().lock();
        stderr.write_all("\x07".repeat(BEEP_COUNT).as_bytes())?;
        stderr.flush()?;
        Ok(())
    }
}
