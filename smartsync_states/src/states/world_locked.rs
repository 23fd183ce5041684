use crate::object::ReplicatedObject;
use bevy_math::Vec3;
use smartsync_core::frame::{Pose, Snapshot};

impl ReplicatedObject {
    pub(super) fn world_locked_enter(&mut self) {
        if self.is_local_authority() {
            self.body.set_velocity(Vec3::ZERO, Vec3::ZERO);
        }
    }

    pub(super) fn world_locked_serialize(&mut self) {
        self.set_snapshot(Snapshot::at_rest(self.body.pose()));
    }

    /// Hold the world pose
    pub(super) fn world_locked_step(&mut self, t: f32) {
        let pose = match self.window {
            Some(window) if !self.is_local_authority() => Pose::new(
                window.start.position.lerp(self.snapshot.position, t),
                window.start.rotation.slerp(self.snapshot.rotation, t),
            ),
            _ => self.snapshot.pose(),
        };
        self.body.set_pose(pose);
        self.body.set_velocity(Vec3::ZERO, Vec3::ZERO);
    }
}
