use crate::stepper::*;
use approx::assert_relative_eq;
use bevy_math::Vec3;
use smartsync::prelude::*;
use test_log::test;

fn falling(stepper: &SyncStepper, revision: Revision, position: Vec3, velocity: Vec3) -> SnapshotMessage {
    SnapshotMessage {
        object: ObjectId(0),
        state: MotionState::Falling,
        revision,
        sent_at: stepper.current_time,
        snapshot: Snapshot::new(Pose::from_position(position), velocity, Vec3::ZERO),
    }
}

/// A velocity change larger than what gravity explains is a bounce: the receiver keeps its
/// ballistic motion and only takes the synced velocity once the interpolation ends
#[test]
fn test_bounce_ends_with_synced_velocity() {
    let mut stepper = SyncStepper::two_peers();
    stepper.frame_step(10);

    let first = falling(
        &stepper,
        Revision::new(10, 10),
        Vec3::new(0.0, 3.0, 0.0),
        Vec3::new(0.0, -2.0, 0.0),
    );
    stepper.object_mut(1, 0).on_receive(&first).unwrap();
    assert_eq!(stepper.object(1, 0).state(), MotionState::Falling);
    stepper.frame_step(3);

    let bounced = falling(
        &stepper,
        Revision::new(10, 11),
        Vec3::new(0.0, 2.9, 0.0),
        Vec3::new(0.0, 3.0, 0.0),
    );
    stepper.object_mut(1, 0).on_receive(&bounced).unwrap();
    assert!(stepper.object(1, 0).window().unwrap().bounce);

    // mid-flight the velocity is still the extrapolated one
    stepper.frame_step(2);
    assert!(stepper.body(1, 0).state().velocity.y < 0.0);

    stepper.frame_step(5);
    assert!(!stepper.object(1, 0).is_interpolating());
    assert_relative_eq!(
        stepper.body(1, 0).state().velocity,
        Vec3::new(0.0, 3.0, 0.0),
        epsilon = 1e-5
    );
    assert!(!stepper.body(1, 0).state().sleeping);
}

#[test]
fn test_ballistic_flight_is_not_a_bounce() {
    let mut stepper = SyncStepper::two_peers();
    stepper.frame_step(10);
    let gravity = stepper.config.gravity;

    let first = falling(
        &stepper,
        Revision::new(10, 10),
        Vec3::new(0.0, 3.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
    );
    stepper.object_mut(1, 0).on_receive(&first).unwrap();
    stepper.frame_step(3);

    let velocity = ballistic_velocity(first.snapshot.velocity, gravity, 0.06);
    let next = falling(
        &stepper,
        Revision::new(10, 11),
        Vec3::new(0.06, 2.98, 0.0),
        velocity,
    );
    stepper.object_mut(1, 0).on_receive(&next).unwrap();
    assert!(!stepper.object(1, 0).window().unwrap().bounce);

    stepper.frame_step(7);
    assert!(!stepper.object(1, 0).is_interpolating());
    assert_relative_eq!(stepper.body(1, 0).state().velocity, velocity, epsilon = 1e-5);
    assert_relative_eq!(
        stepper.body(1, 0).position(),
        Vec3::new(0.06, 2.98, 0.0),
        epsilon = 1e-4
    );
}

/// The authority brings back objects that fell out of the world
#[test]
fn test_respawn_below_floor() {
    let mut stepper = SyncStepper::two_peers();
    stepper.frame_step(10);
    let spawn = stepper.object(0, 0).spawn_pose();
    stepper.body(0, 0).set_position(Vec3::new(4.0, -150.0, 0.0));

    stepper.frame_step(1);
    assert_eq!(stepper.object(0, 0).state(), MotionState::Teleporting);
    assert_eq!(stepper.body(0, 0).position(), spawn.position);
    assert_eq!(stepper.body(0, 0).state().velocity, Vec3::ZERO);

    stepper.frame_step(1);
    assert_eq!(stepper.object(0, 0).state(), MotionState::Sleeping);
    assert_eq!(stepper.object(1, 0).state(), MotionState::Teleporting);
    assert_eq!(stepper.body(1, 0).position(), spawn.position);
}

/// Objects that follow a player are never respawned
#[test]
fn test_no_respawn_while_held() {
    let mut stepper = SyncStepper::two_peers();
    stepper.frame_step(10);
    stepper.interactable(0, 0).set_held(true);
    stepper.object_mut(0, 0).on_pickup(Hand::Left).unwrap();
    stepper.body(0, 0).set_position(Vec3::new(0.0, -150.0, 0.0));

    stepper.frame_step(1);
    assert_eq!(stepper.object(0, 0).state(), MotionState::HeldLeftHand);
    assert_eq!(stepper.body(0, 0).position().y, -150.0);
}
