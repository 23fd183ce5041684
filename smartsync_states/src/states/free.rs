//! Free flight: `Interpolating` and `Falling`
//!
//! On the authority, physics drives the object and these states only decide when it has come to
//! rest. The other peers follow the spline towards the latest snapshot and hand the body back to
//! physics with the synced velocity at the end.
use crate::error::Result;
use crate::object::ReplicatedObject;
use smartsync_core::frame::Pose;
use smartsync_core::state::MotionState;
use smartsync_core::time::{elapsed, secs};
use smartsync_interpolation::spline::{ballistic_velocity, hermite_position, hermite_rotation};
use tracing::debug;

impl ReplicatedObject {
    pub(super) fn free_enter(&mut self) {
        if self.is_local_authority() {
            self.body.wake();
        }
    }

    pub(super) fn free_step(&mut self, t: f32) {
        if !self.is_local_authority() {
            self.follow_hermite(t);
        }
    }

    pub(super) fn free_end(&mut self) -> Result<bool> {
        if !self.is_local_authority() {
            self.apply_synced_velocity();
            return Ok(false);
        }
        if self.body.is_kinematic() || self.is_at_rest() {
            self.change_state(MotionState::Sleeping)?;
        }
        Ok(false)
    }

    /// Detect whether the new snapshot looks like an impact.
    ///
    /// Between two snapshots of a projectile the velocity only changes by gravity. If it changed
    /// by more than what gravity adds over the interpolation window (or one physics step if
    /// that is longer), the object bounced off something.
    pub(super) fn falling_interpolation_start(&mut self) {
        if self.is_local_authority() {
            return;
        }
        let Some((previous, previous_sent_at)) = self.previous else {
            return;
        };
        let Some(window) = self.window.as_mut() else {
            return;
        };
        let gravity = self.config.gravity;
        let dt = secs(elapsed(previous_sent_at, self.sent_at));
        let expected = ballistic_velocity(previous.velocity, gravity, dt);
        let threshold = gravity.length() * secs(window.lag.max(self.config.fixed_timestep));
        let change = (self.snapshot.velocity - expected).length();
        window.bounce = change > threshold;
        if window.bounce {
            debug!(object = ?self.id, ?change, ?threshold, "bounce detected");
        }
    }

    /// Projectile motion. After a bounce the end tangent of the spline is the extrapolated
    /// velocity, and the velocity jumps to the synced one only when the interpolation ends.
    pub(super) fn falling_step(&mut self, t: f32) {
        if self.is_local_authority() {
            return;
        }
        let Some(window) = self.window else {
            return;
        };
        if !window.bounce {
            self.follow_hermite(t);
            return;
        }
        let gravity = self.config.gravity;
        let lag = window.lag_secs();
        let end_velocity = ballistic_velocity(window.start.velocity, gravity, lag);
        let position = hermite_position(
            window.start.position,
            window.start.velocity,
            self.snapshot.position,
            end_velocity,
            lag,
            t,
        );
        let rotation = hermite_rotation(
            window.start.rotation,
            window.start.spin,
            self.snapshot.rotation,
            self.snapshot.spin,
            lag,
            t,
        );
        self.body.set_pose(Pose::new(position, rotation));
        self.body.set_velocity(
            ballistic_velocity(window.start.velocity, gravity, window.elapsed_secs(self.now)),
            window.start.spin,
        );
    }
}
