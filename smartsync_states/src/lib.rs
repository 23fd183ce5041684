//! # Smartsync States
//!
//! The motion state machine of replicated objects.
//!
//! Each [`ReplicatedObject`](object::ReplicatedObject) is in one [`MotionState`] at a time. The
//! state decides in which frame the pose is replicated (world, player root, bone), how the local
//! copy interpolates towards the latest snapshot, and what the authority does when the object
//! comes to rest, gets dropped or falls out of the world.
//!
//! [`MotionState`]: smartsync_core::state::MotionState

pub mod custom;
pub mod error;
pub mod listener;
pub mod object;
pub mod schedule;
mod states;

/// Commonly used items for the state machine.
pub mod prelude {
    pub use crate::custom::{CustomState, CustomStateTable, HookResult};
    pub use crate::error::{CustomStateError, SyncError};
    pub use crate::listener::{ListenerSet, SyncListener};
    pub use crate::object::{ReplicatedObject, StateTransition, SyncHost, TransitionOrigin};
    pub use crate::schedule::{Continuation, Scheduler};
}
