use crate::host::*;
use bevy_app::{App, FixedUpdate};
use bevy_time::Time;
use core::time::Duration;
use smartsync::prelude::*;
use std::sync::Arc;
use test_log::test;

fn synced_object(owner: PeerId, local: PeerId, link: &PeerTransport) -> SyncedObject {
    let directory = AuthorityDirectory::default();
    directory.set(ObjectId(0), owner);
    let object = ReplicatedObject::spawn(
        ObjectId(0),
        owner,
        SyncConfig::default().with_rng_seed(7),
        SyncHost {
            identity: Arc::new(TestIdentity { local, directory }),
            transport: Box::new(link.clone()),
            body: Box::new(TestBody::default()),
            rig: Arc::new(TestRig::default()),
            interactable: None,
        },
        Duration::ZERO,
    )
    .unwrap();
    SyncedObject::new(object)
}

fn app() -> App {
    let mut app = App::new();
    app.add_plugins(SmartSyncPlugin);
    app.insert_resource(Time::<()>::default());
    app
}

#[test]
fn test_plugin_ticks_objects() {
    let mut app = app();
    let link = PeerTransport::with_lag(Duration::from_millis(100));
    let entity = app
        .world_mut()
        .spawn(synced_object(PeerId(0), PeerId(0), &link))
        .id();

    app.update();
    let object = app.world().get::<SyncedObject>(entity).unwrap();
    assert_eq!(object.frame(), 1);
    assert_eq!(object.state(), MotionState::Teleporting);

    // the physics tick settles the object
    app.world_mut().run_schedule(FixedUpdate);
    let object = app.world().get::<SyncedObject>(entity).unwrap();
    assert_eq!(object.state(), MotionState::Sleeping);
    assert_eq!(link.published_count(), 2);
}

/// Removing the component stops every deferred task of the object
#[test]
fn test_despawn_clears_continuations() {
    let mut app = app();
    let link = PeerTransport::with_lag(Duration::from_millis(100));
    let entity = app
        .world_mut()
        .spawn(synced_object(PeerId(0), PeerId(1), &link))
        .id();
    app.update();
    assert!(
        app.world()
            .get::<SyncedObject>(entity)
            .unwrap()
            .scheduler()
            .contains(|c| *c == Continuation::ResyncRequest)
    );

    let object = app
        .world_mut()
        .entity_mut(entity)
        .take::<SyncedObject>()
        .unwrap();
    assert!(object.scheduler().is_empty());
}
