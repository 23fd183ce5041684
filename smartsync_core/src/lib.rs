//! Contains a set of shared types

pub mod config;
pub mod frame;
pub mod host;
pub mod id;
pub mod state;
pub mod time;

pub mod prelude {
    pub use crate::config::SyncConfig;
    pub use crate::frame::{Frame, Pose, Snapshot};
    pub use crate::host::{IdentityProvider, Interactable, PlayerRig, RigidBody};
    pub use crate::id::{ObjectId, PeerId};
    pub use crate::state::{AttachmentTarget, Bone, Hand, MotionState};
}
