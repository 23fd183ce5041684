use crate::object::ReplicatedObject;
use bevy_math::Vec3;
use smartsync_core::frame::Snapshot;
use smartsync_interpolation::spline::hermite_pose;
use tracing::trace;

impl ReplicatedObject {
    pub(super) fn sleeping_enter(&mut self) {
        if self.is_local_authority() {
            self.body.set_velocity(Vec3::ZERO, Vec3::ZERO);
            self.body.sleep();
        }
    }

    pub(super) fn sleeping_serialize(&mut self) {
        self.set_snapshot(Snapshot::at_rest(self.body.pose()));
    }

    /// Glide to the resting pose, slowing down to a stop
    pub(super) fn sleeping_step(&mut self, t: f32) {
        let Some(window) = self.window else {
            return;
        };
        // the end of the window is handled by `sleeping_end`
        if t >= 1.0 || self.is_local_authority() {
            return;
        }
        let target = Snapshot::at_rest(self.snapshot.pose());
        let pose = hermite_pose(&window.start, &target, window.lag_secs(), t);
        self.body.set_pose(pose);
        self.body.set_velocity(
            window.start.velocity.lerp(Vec3::ZERO, t),
            window.start.spin.lerp(Vec3::ZERO, t),
        );
    }

    /// Returns true while physics refuses to settle the body, so that the pose keeps
    /// being enforced every frame
    pub(super) fn sleeping_end(&mut self) -> bool {
        let unsettled = !self.body.is_sleeping() || !self.is_at_rest();
        self.hold_resting_pose();
        if unsettled && self.config.prevent_sleep_jitter {
            trace!(object = ?self.id, "body did not settle, holding its pose");
            return true;
        }
        false
    }

    fn hold_resting_pose(&mut self) {
        self.body.set_pose(self.snapshot.pose());
        self.body.set_velocity(Vec3::ZERO, Vec3::ZERO);
        self.body.sleep();
    }
}
