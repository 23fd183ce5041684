//! States that follow a player: held in a hand, attached to a bone or to the playspace.
//!
//! The pose is replicated as an offset from the parent frame. The authority of a held object
//! renders it from the tracked hand; everyone else (and the authority of an attached object)
//! places it at the offset from the freshly resolved parent frame every frame.
use crate::error::Result;
use crate::object::ReplicatedObject;
use bevy_math::Vec3;
use smartsync_attachment::drift::DriftThresholds;
use smartsync_core::frame::{Pose, Snapshot};
use smartsync_core::time::elapsed;
use tracing::trace;

impl ReplicatedObject {
    pub(super) fn attached_enter(&mut self) {
        self.drift.reset();
        if self.is_local_authority() {
            if self.state.forbids_pickup() {
                self.force_drop();
            }
            self.body.set_velocity(Vec3::ZERO, Vec3::ZERO);
        }
    }

    pub(super) fn attached_exit(&mut self) {
        self.follow_offset = None;
    }

    pub(super) fn attached_serialize(&mut self) {
        let frame = self.parent_frame().frame;
        self.set_snapshot(Snapshot::at_rest(frame.to_local(self.body.pose())));
    }

    pub(super) fn attached_step(&mut self, t: f32) -> Result<()> {
        if !self.is_local_authority() {
            let Some(window) = self.window else {
                return Ok(());
            };
            let offset = Pose::new(
                window.start.position.lerp(self.snapshot.position, t),
                window.start.rotation.slerp(self.snapshot.rotation, t),
            );
            self.follow(offset);
            return Ok(());
        }
        if self.state.is_held() {
            return self.held_authority_step();
        }
        self.follow(self.snapshot.pose());
        Ok(())
    }

    fn follow(&mut self, offset: Pose) {
        let frame = self.parent_frame().frame;
        self.follow_offset = Some(offset);
        self.body.set_pose(frame.to_world(offset));
        self.body.set_velocity(Vec3::ZERO, Vec3::ZERO);
    }

    /// The hand drives the object: republish when the offset drifted away from the published
    /// one, and optionally pin it back onto the published offset after a grace period.
    fn held_authority_step(&mut self) -> Result<()> {
        let frame = self.parent_frame().frame;
        let published = self.snapshot.pose();
        let current = frame.to_local(self.body.pose());
        let lag = self.transport.lag_estimate();
        let thresholds = DriftThresholds::from(&self.config);
        if self
            .drift
            .check(&current, &published, self.now, lag, &thresholds)
        {
            self.publish()?;
            return Ok(());
        }
        let Some(grace) = self.config.held_jitter_grace else {
            return Ok(());
        };
        let Some(last_publish) = self.channel.last_publish_time() else {
            return Ok(());
        };
        if elapsed(last_publish, self.now) >= grace && current != published {
            trace!(object = ?self.id, "pinning held object onto its published offset");
            self.body.set_pose(frame.to_world(published));
        }
        Ok(())
    }
}
