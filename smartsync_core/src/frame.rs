//! Poses, reference frames and the replicated snapshot
use bevy_math::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position and rotation of an object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }
}

/// A (possibly moving) reference frame: world origin, a player's root or one of their bones.
///
/// Poses of attached objects are replicated as offsets relative to such a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Frame {
    fn default() -> Self {
        Self::WORLD
    }
}

impl Frame {
    /// The world origin
    pub const WORLD: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Avatars report a zero position for bones that they don't have
    pub fn is_degenerate(&self) -> bool {
        self.position == Vec3::ZERO
    }

    /// Express a world-space pose relative to this frame
    pub fn to_local(&self, world: Pose) -> Pose {
        let inverse = self.rotation.inverse();
        Pose {
            position: inverse * (world.position - self.position),
            rotation: (inverse * world.rotation).normalize(),
        }
    }

    /// Express a pose relative to this frame in world space
    pub fn to_world(&self, local: Pose) -> Pose {
        Pose {
            position: self.position + self.rotation * local.position,
            rotation: (self.rotation * local.rotation).normalize(),
        }
    }

    /// Rotate a world-space direction (velocity, spin) into this frame
    pub fn direction_to_local(&self, direction: Vec3) -> Vec3 {
        self.rotation.inverse() * direction
    }

    /// Rotate a direction expressed in this frame into world space
    pub fn direction_to_world(&self, direction: Vec3) -> Vec3 {
        self.rotation * direction
    }
}

/// Pose and velocities of an object, expressed in the parent frame of its current state.
///
/// This is what the authority publishes and what the other peers interpolate towards.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub position: Vec3,
    pub rotation: Quat,
    /// linear velocity
    pub velocity: Vec3,
    /// angular velocity, as a scaled axis in radians per second
    pub spin: Vec3,
}

impl Snapshot {
    pub fn new(pose: Pose, velocity: Vec3, spin: Vec3) -> Self {
        Self {
            position: pose.position,
            rotation: pose.rotation,
            velocity,
            spin,
        }
    }

    pub fn at_rest(pose: Pose) -> Self {
        Self::new(pose, Vec3::ZERO, Vec3::ZERO)
    }

    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.rotation)
    }

    /// Express a world-space snapshot relative to `frame`
    pub fn to_local(&self, frame: &Frame) -> Self {
        Self::new(
            frame.to_local(self.pose()),
            frame.direction_to_local(self.velocity),
            frame.direction_to_local(self.spin),
        )
    }

    /// Express a snapshot relative to `frame` in world space
    pub fn to_world(&self, frame: &Frame) -> Self {
        Self::new(
            frame.to_world(self.pose()),
            frame.direction_to_world(self.velocity),
            frame.direction_to_world(self.spin),
        )
    }
}
