use core::time::Duration;
use smartsync_core::frame::Snapshot;
use smartsync_core::time::{elapsed, secs};

/// Tracks the interpolation currently running towards the latest snapshot.
///
/// The interpolation starts when a snapshot is received (or, on the authority, when it is
/// published) and lasts for the estimated one-way latency of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InterpolationWindow {
    pub start_time: Duration,
    pub end_time: Duration,
    /// estimated latency at the start of the interpolation
    pub lag: Duration,
    /// pose and velocities of the local copy when the interpolation started,
    /// expressed in the parent frame of the state
    pub start: Snapshot,
    /// set by the falling state when the new snapshot looks like an impact
    pub bounce: bool,
}

impl InterpolationWindow {
    pub fn begin(now: Duration, lag: Duration, start: Snapshot) -> Self {
        Self {
            start_time: now,
            end_time: now + lag,
            lag,
            start,
            bounce: false,
        }
    }

    /// Interpolation fraction in `[0, 1]`. A zero lag is immediately complete.
    pub fn fraction(&self, now: Duration) -> f32 {
        if self.lag.is_zero() {
            return 1.0;
        }
        (secs(elapsed(self.start_time, now)) / secs(self.lag)).clamp(0.0, 1.0)
    }

    pub fn is_finished(&self, now: Duration) -> bool {
        now >= self.end_time
    }

    pub fn lag_secs(&self) -> f32 {
        secs(self.lag)
    }

    /// Seconds elapsed since the start, capped at the lag
    pub fn elapsed_secs(&self, now: Duration) -> f32 {
        secs(elapsed(self.start_time, now).min(self.lag))
    }
}
