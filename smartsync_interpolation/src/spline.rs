//! Hermite-style interpolation of positions and rotations.
//!
//! Only the pose and velocity of both endpoints are known. We place one control point on each
//! side, pushed along the endpoint velocity by a third of the elapsed/remaining latency, and blend
//! linearly between them. The curve goes through both endpoints and leaves/enters them along the
//! endpoint velocities, so the motion doesn't "pop" when a new snapshot arrives.
use bevy_math::{Quat, Vec3};
use smartsync_core::frame::{Pose, Snapshot};
use tracing::trace;

/// Interpolate a position between `p0` (moving at `v0`) and `p1` (moving at `v1`).
///
/// - `lag`: estimated one-way latency in seconds, i.e. the duration of the interpolation
/// - `t`: interpolation fraction, clamped to `[0, 1]`
///
/// A non-positive `lag` means there is nothing to interpolate: `p1` is returned directly.
pub fn hermite_position(p0: Vec3, v0: Vec3, p1: Vec3, v1: Vec3, lag: f32, t: f32) -> Vec3 {
    if lag <= 0.0 {
        return p1;
    }
    let t = t.clamp(0.0, 1.0);
    let control_start = p0 + v0 * (lag * t / 3.0);
    let control_end = p1 - v1 * (lag * (1.0 - t) / 3.0);
    control_start.lerp(control_end, t)
}

/// Interpolate a rotation between `r0` (spinning at `w0`) and `r1` (spinning at `w1`).
///
/// Spins are world-space angular velocities (scaled axis, radians per second).
pub fn hermite_rotation(r0: Quat, w0: Vec3, r1: Quat, w1: Vec3, lag: f32, t: f32) -> Quat {
    if lag <= 0.0 {
        return r1;
    }
    let t = t.clamp(0.0, 1.0);
    let control_start = Quat::from_scaled_axis(w0 * (lag * t / 3.0)) * r0;
    let control_end = Quat::from_scaled_axis(-w1 * (lag * (1.0 - t) / 3.0)) * r1;
    control_start.normalize().slerp(control_end.normalize(), t)
}

/// Interpolate the pose between two snapshots
pub fn hermite_pose(start: &Snapshot, end: &Snapshot, lag: f32, t: f32) -> Pose {
    let pose = Pose::new(
        hermite_position(
            start.position,
            start.velocity,
            end.position,
            end.velocity,
            lag,
            t,
        ),
        hermite_rotation(start.rotation, start.spin, end.rotation, end.spin, lag, t),
    );
    trace!(?t, ?lag, position = ?pose.position, "hermite pose");
    pose
}

/// Velocity of a projectile that started at `v0` after `elapsed` seconds under `gravity`
pub fn ballistic_velocity(v0: Vec3, gravity: Vec3, elapsed: f32) -> Vec3 {
    v0 + gravity * elapsed.max(0.0)
}
