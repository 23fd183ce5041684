//! Bevy integration
//!
//! Every entity with a [`SyncedObject`] is ticked once per frame in `Update`, once per physics
//! step in `FixedUpdate`, and once more in `PostUpdate` to write back the pose of objects that
//! follow a player after every parent has moved.
use bevy_app::{App, FixedUpdate, Plugin, PostUpdate, Update};
use bevy_derive::{Deref, DerefMut};
use bevy_ecs::error::Result;
use bevy_ecs::prelude::*;
use bevy_time::Time;
use smartsync_states::object::ReplicatedObject;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// A replicated object driven by the [`SmartSyncPlugin`]
#[derive(Component, Deref, DerefMut, Debug)]
pub struct SyncedObject(pub ReplicatedObject);

impl SyncedObject {
    pub fn new(object: ReplicatedObject) -> Self {
        Self(object)
    }
}

/// System sets used by the [`SmartSyncPlugin`]
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub enum SyncSet {
    /// Run continuations: interpolation loop, deferred drops, retries and resync requests
    Tick,
    /// React to the physics step: rest detection, periodic publish, respawn
    Physics,
    /// Write back the pose of objects that follow a player
    Late,
}

#[derive(Default)]
pub struct SmartSyncPlugin;

impl SmartSyncPlugin {
    fn tick(time: Res<Time>, mut objects: Query<&mut SyncedObject>) -> Result {
        let now = time.elapsed();
        for mut object in objects.iter_mut() {
            object.tick(now)?;
        }
        Ok(())
    }

    fn physics_tick(time: Res<Time>, mut objects: Query<&mut SyncedObject>) -> Result {
        let now = time.elapsed();
        for mut object in objects.iter_mut() {
            object.physics_tick(now)?;
        }
        Ok(())
    }

    fn late_tick(time: Res<Time>, mut objects: Query<&mut SyncedObject>) -> Result {
        let now = time.elapsed();
        for mut object in objects.iter_mut() {
            object.late_tick(now)?;
        }
        Ok(())
    }

    /// Stop the deferred work of objects whose entity was despawned
    fn despawn(trigger: On<Remove, SyncedObject>, mut objects: Query<&mut SyncedObject>) {
        if let Ok(mut object) = objects.get_mut(trigger.entity) {
            trace!(entity = ?trigger.entity, object = ?object.id(), "despawning synced object");
            object.despawn();
        }
    }
}

impl Plugin for SmartSyncPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(Update, SyncSet::Tick);
        app.configure_sets(FixedUpdate, SyncSet::Physics);
        app.configure_sets(PostUpdate, SyncSet::Late);

        app.add_systems(Update, Self::tick.in_set(SyncSet::Tick));
        app.add_systems(FixedUpdate, Self::physics_tick.in_set(SyncSet::Physics));
        app.add_systems(PostUpdate, Self::late_tick.in_set(SyncSet::Late));
        app.add_observer(Self::despawn);
    }
}
