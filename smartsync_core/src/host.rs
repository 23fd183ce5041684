//! Capabilities provided by the host engine.
//!
//! The sync engine never queries ambient global state: everything it needs to know about
//! the local peer, the rigid body it drives or the players' avatars is injected through these traits.
use crate::frame::{Frame, Pose};
use crate::id::{ObjectId, PeerId};
use crate::state::Bone;
use bevy_math::Vec3;

/// Identity of the local peer, and the host's view of who owns what
pub trait IdentityProvider: Send + Sync {
    fn local_peer(&self) -> PeerId;

    /// The authority the host currently reports for `object`.
    ///
    /// Only consulted when the previous authority disconnected.
    fn observed_authority(&self, object: ObjectId) -> Option<PeerId>;
}

/// The simulated rigid body of the object (the "local copy")
pub trait RigidBody: Send + Sync {
    fn pose(&self) -> Pose;
    fn set_pose(&mut self, pose: Pose);
    fn velocity(&self) -> Vec3;
    /// angular velocity, as a scaled axis in radians per second
    fn spin(&self) -> Vec3;
    fn set_velocity(&mut self, velocity: Vec3, spin: Vec3);
    fn is_kinematic(&self) -> bool;
    fn uses_gravity(&self) -> bool;
    fn is_sleeping(&self) -> bool;
    fn sleep(&mut self);
    fn wake(&mut self);
}

/// Lookup of the players' avatars
pub trait PlayerRig: Send + Sync {
    /// Root (playspace) transform of the player
    fn root(&self, player: PeerId) -> Option<Frame>;

    /// Pose of one of the player's bones. Avatars without that bone may return `None`
    /// or a degenerate (zero-position) frame.
    fn bone(&self, player: PeerId, bone: Bone) -> Option<Frame>;
}

/// The pickup component of the object, if it can be grabbed
pub trait Interactable: Send + Sync {
    fn is_held_locally(&self) -> bool;

    /// Release the object from the local player's hand without any further callbacks
    fn force_drop(&mut self);
}

