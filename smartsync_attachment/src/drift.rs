//! Drift correction for attached objects
//!
//! The authority of a held object renders it straight from the tracked hand, and only publishes
//! on state changes. Over time the offset between the object and its parent frame can drift away
//! from the one the other peers are interpolating towards; when it does we publish again.
use core::time::Duration;
use smartsync_core::config::SyncConfig;
use smartsync_core::frame::Pose;
use smartsync_core::time::elapsed;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftThresholds {
    /// Maximum distance between the current and the published offset
    pub position: f32,
    /// Minimum absolute dot product between the current and the published rotation
    pub rotation: f32,
}

impl Default for DriftThresholds {
    fn default() -> Self {
        Self {
            position: 0.015,
            rotation: 0.995,
        }
    }
}

impl From<&SyncConfig> for DriftThresholds {
    fn from(config: &SyncConfig) -> Self {
        Self {
            position: config.resync_position_threshold,
            rotation: config.resync_rotation_threshold,
        }
    }
}

impl DriftThresholds {
    pub fn has_drifted(&self, current: &Pose, published: &Pose) -> bool {
        current.position.distance(published.position) > self.position
            || current.rotation.dot(published.rotation).abs() < self.rotation
    }
}

/// Rate-limits drift resyncs to at most one per latency window
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DriftMonitor {
    last_resync: Option<Duration>,
}

impl DriftMonitor {
    /// Returns true if a resync publish should be issued now
    pub fn check(
        &mut self,
        current: &Pose,
        published: &Pose,
        now: Duration,
        lag: Duration,
        thresholds: &DriftThresholds,
    ) -> bool {
        if !thresholds.has_drifted(current, published) {
            return false;
        }
        if self
            .last_resync
            .is_some_and(|last| elapsed(last, now) < lag)
        {
            return false;
        }
        trace!(
            current = ?current.position,
            published = ?published.position,
            "attached object drifted, resyncing"
        );
        self.last_resync = Some(now);
        true
    }

    pub fn reset(&mut self) {
        self.last_resync = None;
    }
}
