/*! # Smartsync

Smartsync replicates individual physics objects between the peers of a multiplayer session.

One peer (the authority) simulates each object and publishes snapshots of its pose and
velocities; every other peer moves its local copy along a spline towards the latest snapshot so
that the motion stays smooth despite latency and packet loss. Authority can change hands at
runtime (pickups, collisions, disconnections), and objects can be held or attached to players.

The crate is split in several sub-crates, re-exported here:
- [`core`]: ids, poses, motion states, host capabilities, configuration
- [`interpolation`]: the spline used to move towards snapshots
- [`replication`]: authority and publish/receive bookkeeping
- [`attachment`]: parent frames of held or attached objects
- [`states`]: the state machine of a replicated object

The [`plugin::SmartSyncPlugin`] drives every [`plugin::SyncedObject`] from the Bevy schedules.
*/
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod plugin;

pub use smartsync_attachment as attachment;
pub use smartsync_core as core;
pub use smartsync_interpolation as interpolation;
pub use smartsync_replication as replication;
pub use smartsync_states as states;
pub use smartsync_utils as utils;

/// Prelude containing commonly used types
pub mod prelude {
    pub use crate::plugin::{SmartSyncPlugin, SyncSet, SyncedObject};
    pub use smartsync_attachment::prelude::*;
    pub use smartsync_core::prelude::*;
    pub use smartsync_interpolation::prelude::*;
    pub use smartsync_replication::prelude::*;
    pub use smartsync_states::prelude::*;
}
