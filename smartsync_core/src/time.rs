//! Helpers to convert between the engine clock and the float seconds used by the interpolation math
use core::time::Duration;

/// Seconds as f32
pub fn secs(duration: Duration) -> f32 {
    duration.as_secs_f32()
}

/// `end - start`, or zero if `end` is earlier
pub fn elapsed(start: Duration, end: Duration) -> Duration {
    end.saturating_sub(start)
}
