use crate::object::ReplicatedObject;

impl ReplicatedObject {
    pub(super) fn teleporting_enter(&mut self) {
        self.teleport_settled = false;
    }

    /// Teleports are never interpolated: the local copy jumps to the snapshot and the
    /// interpolation loop is not started
    pub(super) fn teleporting_interpolation_start(&mut self) {
        if !self.is_local_authority() {
            self.teleporting_snap();
        }
        self.window = None;
    }

    pub(super) fn teleporting_snap(&mut self) {
        if self.is_local_authority() {
            return;
        }
        self.body.set_pose(self.snapshot.pose());
        self.body.wake();
        self.body
            .set_velocity(self.snapshot.velocity, self.snapshot.spin);
    }
}
