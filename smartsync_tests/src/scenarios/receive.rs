use crate::host::RecordingListener;
use crate::stepper::*;
use bevy_math::Vec3;
use core::time::Duration;
use smartsync::prelude::*;
use std::sync::Arc;
use test_log::test;

fn settled() -> SyncStepper {
    let mut stepper = SyncStepper::two_peers();
    stepper.frame_step(10);
    stepper
}

/// Snapshots older than (or equal to) the last applied one are dropped
#[test]
fn test_stale_snapshot_is_ignored() {
    let mut stepper = settled();
    let latest = stepper.link(0).last_published().unwrap();
    assert_eq!(latest.revision, Revision::new(2, 2));
    let position = stepper.body(1, 0).position();

    let mut older = latest;
    older.revision = Revision::new(1, 1);
    older.state = MotionState::Falling;
    older.snapshot.position = Vec3::new(10.0, 10.0, 10.0);
    let outcome = stepper.object_mut(1, 0).on_receive(&older).unwrap();
    assert_eq!(outcome, ReceiveOutcome::Stale);

    // same change counter but an older sequence
    older.revision = Revision::new(2, 1);
    let outcome = stepper.object_mut(1, 0).on_receive(&older).unwrap();
    assert_eq!(outcome, ReceiveOutcome::Stale);

    stepper.frame_step(10);
    assert_eq!(stepper.object(1, 0).state(), MotionState::Sleeping);
    assert_eq!(stepper.object(1, 0).revision(), Revision::new(2, 2));
    assert_eq!(stepper.body(1, 0).position(), position);
}

/// Applying the same snapshot twice has the effect of applying it once
#[test]
fn test_duplicate_snapshot() {
    let mut stepper = settled();
    let latest = stepper.link(0).last_published().unwrap();
    let received = stepper.object(1, 0).channel().received();
    let outcome = stepper.object_mut(1, 0).on_receive(&latest).unwrap();
    assert_eq!(outcome, ReceiveOutcome::Stale);
    assert_eq!(stepper.object(1, 0).channel().received(), received);
}

/// Snapshots are applied in revision order regardless of the order they arrive in
#[test]
fn test_reordered_snapshots() {
    let mut stepper = settled();
    let latest = stepper.link(0).last_published().unwrap();
    let at = |sequence: u32, x: f32| {
        let mut message = latest;
        message.state = MotionState::Interpolating;
        message.revision = Revision::new(3, sequence);
        message.snapshot.position = Vec3::new(x, 1.0, 0.0);
        message
    };
    let object = stepper.object_mut(1, 0);
    assert_eq!(object.on_receive(&at(4, 2.0)).unwrap(), ReceiveOutcome::Apply);
    assert_eq!(object.on_receive(&at(3, 1.0)).unwrap(), ReceiveOutcome::Stale);
    assert_eq!(object.state(), MotionState::Interpolating);
    assert_eq!(object.snapshot().position, Vec3::new(2.0, 1.0, 0.0));
    assert_eq!(object.on_receive(&at(5, 3.0)).unwrap(), ReceiveOutcome::Apply);
    assert_eq!(object.snapshot().position, Vec3::new(3.0, 1.0, 0.0));
}

#[test]
fn test_snapshot_for_another_object() {
    let mut stepper = settled();
    let mut message = stepper.link(0).last_published().unwrap();
    message.object = ObjectId(7);
    message.revision = Revision::new(10, 10);
    let outcome = stepper.object_mut(1, 0).on_receive(&message).unwrap();
    assert_eq!(outcome, ReceiveOutcome::Ignored);
}

/// The authority never applies snapshots about its own object
#[test]
fn test_authority_ignores_snapshots() {
    let mut stepper = settled();
    let mut message = stepper.link(0).last_published().unwrap();
    message.revision = Revision::new(10, 10);
    let outcome = stepper.object_mut(0, 0).on_receive(&message).unwrap();
    assert_eq!(outcome, ReceiveOutcome::Ignored);
}

#[test]
fn test_receive_bytes() {
    let mut stepper = settled();
    let mut message = stepper.link(0).last_published().unwrap();
    message.state = MotionState::Interpolating;
    message.revision = Revision::new(3, 3);
    message.snapshot.velocity = Vec3::new(0.0, 0.0, 1.0);
    let bytes = message.to_bytes().unwrap();

    let outcome = stepper.object_mut(1, 0).receive_bytes(&bytes).unwrap();
    assert_eq!(outcome, ReceiveOutcome::Apply);
    assert_eq!(stepper.object(1, 0).state(), MotionState::Interpolating);

    assert!(matches!(
        stepper.object_mut(1, 0).receive_bytes(&bytes[..bytes.len() / 2]),
        Err(SyncError::Serialization(_))
    ));
}

/// A publish rejected by the transport is retried until it goes through
#[test]
fn test_failed_publish_is_retried() {
    let mut stepper = settled();
    stepper.link(0).fail_next_publish();
    let target = Pose::from_position(Vec3::new(3.0, 2.0, 1.0));
    stepper.object_mut(0, 0).teleport_to(target).unwrap();
    let published = stepper.link(0).published_count();

    stepper.frame_step(1);
    assert!(stepper.object(0, 0).pending_publish());
    assert!(
        stepper
            .object(0, 0)
            .scheduler()
            .contains(|c| *c == Continuation::RetryPublish)
    );
    // the teleported object settled, which publishes again
    assert_eq!(stepper.object(0, 0).state(), MotionState::Sleeping);
    assert_eq!(stepper.link(0).published_count(), published + 1);

    stepper.frame_step(1);
    assert!(!stepper.object(0, 0).pending_publish());
    stepper.frame_step(20);
    assert_eq!(stepper.object(1, 0).state(), MotionState::Sleeping);
    assert!(stepper.body(1, 0).position().distance(target.position) < 1e-3);
}

/// While congested, the retry republishes the latest state once the link clears
#[test]
fn test_deferred_publish_is_retried() {
    let mut stepper = settled();
    stepper.link(0).set_congested(true);
    stepper.body(0, 0).0.lock().velocity = Vec3::new(0.0, 0.0, 1.0);
    stepper.object_mut(0, 0).on_collision(None).unwrap();
    assert_eq!(
        stepper.object_mut(0, 0).publish().unwrap(),
        PublishOutcome::Deferred
    );
    let published = stepper.link(0).published_count();
    stepper.frame_step(20);
    assert_eq!(stepper.link(0).published_count(), published);
    assert!(stepper.object(0, 0).pending_publish());

    stepper.link(0).set_congested(false);
    stepper.advance_time(Duration::from_millis(500));
    stepper.frame_step(2);
    assert!(stepper.link(0).published_count() > published);
    assert!(!stepper.object(0, 0).pending_publish());
    assert_eq!(stepper.object(1, 0).state(), MotionState::Interpolating);
}

/// Re-entering the current state with the same snapshot leaves the pose untouched and fires a
/// single notification on each peer
#[test]
fn test_reentering_state_is_idempotent() {
    let mut stepper = settled();
    let recorders: Vec<Arc<RecordingListener>> = (0..2)
        .map(|peer| {
            let recorder = Arc::new(RecordingListener::default());
            let listener: Arc<dyn SyncListener> = recorder.clone();
            stepper.object_mut(peer, 0).add_listener(&listener);
            // adding the same listener twice is a no-op
            assert!(!stepper.object_mut(peer, 0).add_listener(&listener));
            recorder
        })
        .collect();
    let positions = [stepper.body(0, 0).position(), stepper.body(1, 0).position()];

    stepper.object_mut(0, 0).sleep().unwrap();
    stepper.frame_step(10);
    let message = stepper.link(0).last_published().unwrap();
    assert_eq!(
        stepper.object_mut(1, 0).on_receive(&message).unwrap(),
        ReceiveOutcome::Stale
    );

    for peer in 0..2 {
        assert_eq!(
            recorders[peer].states(),
            vec![(ObjectId(0), MotionState::Sleeping, MotionState::Sleeping)]
        );
        assert_eq!(stepper.body(peer, 0).position(), positions[peer]);
        assert_eq!(stepper.object(peer, 0).state(), MotionState::Sleeping);
    }
}
