//! Clock primitives
//!
//! Pure timestamp arithmetic: a count-up stopwatch, a countdown, the wall-clock
//! source they are fed from, and display formatting.

pub mod countdown;
pub mod source;
pub mod stopwatch;

pub use countdown::Countdown;
pub use source::{Clock, ManualClock, SystemClock};
pub use stopwatch::Stopwatch;

/// Format milliseconds as "M:SS". Negative input reads as zero.
pub fn format_ms(ms: i64) -> String {
    let total_secs = ms.max(0) / 1000;
    let m = total_secs / 60;
    let s = total_secs % 60;
    format!("{}:{:02}", m, s)
}
