//! Handles interpolation of replicated objects between two synced states
//!
//! A peer that does not own an object only ever learns about it through sparse snapshots
//! (pose + velocities). Instead of snapping to each snapshot, the local copy follows a spline that
//! starts at the pose the object had when the snapshot arrived and ends at the snapshot,
//! stretched over the estimated one-way latency so that the motion stays continuous.

pub mod spline;
pub mod window;

/// Commonly used items for interpolation.
pub mod prelude {
    pub use crate::spline::{ballistic_velocity, hermite_pose, hermite_position, hermite_rotation};
    pub use crate::window::InterpolationWindow;
}
