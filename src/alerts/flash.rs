//! Alert flash cycle

/// Colors cycled through while in Alert, starting with the first
pub const FLASH_COLORS: [&str; 3] = ["#ffffff", "#00cc44", "#000000"];

/// Time each flash color is shown
pub const FLASH_INTERVAL_MS: i64 = 400;

/// Cyclic flash anchored to the instant it was started.
///
/// The current color is derived from `now - started_at`, so a late or missed
/// tick shows the right color rather than falling behind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlashCycle {
    started_at: Option<i64>,
}

impl FlashCycle {
    /// No-op when already running
    pub fn start(&mut self, now_ms: i64) {
        if self.started_at.is_none() {
            self.started_at = Some(now_ms);
        }
    }

    pub fn stop(&mut self) {
        self.started_at = None;
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Index into [`FLASH_COLORS`]; 0 when stopped
    pub fn index(&self, now_ms: i64) -> usize {
        match self.started_at {
            Some(started) => {
                let steps = now_ms.saturating_sub(started).max(0) / FLASH_INTERVAL_MS;
                (steps % FLASH_COLORS.len() as i64) as usize
            }
            None => 0,
        }
    }

    pub fn color(&self, now_ms: i64) -> Option<&'static str> {
        self.is_running().then(|| FLASH_COLORS[self.index(now_ms)])
    }
}
