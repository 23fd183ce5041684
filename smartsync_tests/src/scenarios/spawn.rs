use crate::stepper::*;
use approx::assert_relative_eq;
use bevy_math::Vec3;
use core::time::Duration;
use smartsync::prelude::*;
use test_log::test;

/// The authority publishes the spawn pose once, then settles the object
#[test]
fn test_spawn_settles() {
    let mut stepper = SyncStepper::two_peers();
    let published = stepper.link(0).published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].state, MotionState::Teleporting);
    assert_eq!(published[0].revision, Revision::new(1, 1));
    assert_eq!(stepper.link(1).published_count(), 0);

    stepper.frame_step(1);
    assert_eq!(stepper.object(0, 0).state(), MotionState::Sleeping);
    assert_eq!(stepper.link(0).published_count(), 2);
    assert!(stepper.body(0, 0).state().sleeping);

    // the receiver snaps to the spawn pose, then glides into Sleeping
    assert_eq!(stepper.object(1, 0).state(), MotionState::Teleporting);
    assert_relative_eq!(stepper.body(1, 0).position(), Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-4);
    stepper.frame_step(10);
    assert_eq!(stepper.object(1, 0).state(), MotionState::Sleeping);
    assert_eq!(stepper.object(1, 0).revision(), Revision::new(2, 2));
    assert!(stepper.body(1, 0).state().sleeping);
    assert!(!stepper.object(1, 0).is_interpolating());
    assert_relative_eq!(stepper.body(1, 0).position(), Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-4);

    // nothing else is published while the object rests
    stepper.frame_step(50);
    assert_eq!(stepper.link(0).published_count(), 2);
}

#[test]
fn test_spawn_moving_object() {
    let mut stepper = SyncStepper::two_peers();
    stepper.body(0, 0).0.lock().velocity = Vec3::new(1.0, 0.0, 0.0);

    stepper.frame_step(1);
    assert_eq!(stepper.object(0, 0).state(), MotionState::Interpolating);
    stepper.frame_step(1);
    assert_eq!(stepper.object(1, 0).state(), MotionState::Interpolating);

    // the authority keeps publishing at the configured interval while the object moves
    let before = stepper.link(0).published_count();
    stepper.frame_step(25);
    assert!(stepper.link(0).published_count() >= before + 1);
    assert!(stepper.body(1, 0).position().x > 0.0);
}

/// The non-authority asks for the state until something arrives, then stops asking
#[test]
fn test_resync_until_received() {
    let mut stepper = SyncStepper::new(StepperConfig::default());
    stepper.link(0).set_blocked(true);
    stepper.frame_step(150);
    assert!(!stepper.object(1, 0).channel().has_received());
    assert!(stepper.link(1).resync_requests() >= 2);
    // the authority answered every request, but the answers were lost
    assert!(stepper.link(0).published_count() > 2);

    stepper.link(0).set_blocked(false);
    assert!(stepper.step_until(100, |s| s.object(1, 0).channel().has_received()));
    assert!(
        !stepper
            .object(1, 0)
            .scheduler()
            .contains(|c| *c == Continuation::ResyncRequest)
    );
    let requests = stepper.link(1).resync_requests();
    stepper.frame_step(100);
    assert_eq!(stepper.link(1).resync_requests(), requests);
}

#[test]
fn test_resync_postponed_while_congested() {
    let mut stepper = SyncStepper::two_peers();
    stepper.link(0).set_blocked(true);
    stepper.link(1).set_congested(true);
    stepper.frame_step(150);
    assert_eq!(stepper.link(1).resync_requests(), 0);
    assert!(
        stepper
            .object(1, 0)
            .scheduler()
            .contains(|c| *c == Continuation::ResyncRequest)
    );

    stepper.link(1).set_congested(false);
    assert!(stepper.step_until(100, |s| s.link(1).resync_requests() > 0));
}

/// Spawning with the same seed yields the same resync schedule
#[test]
fn test_seeded_resync_delay() {
    let schedule = || {
        let mut stepper = SyncStepper::two_peers();
        stepper.link(0).set_blocked(true);
        stepper.step_until(100, |s| s.link(1).resync_requests() > 0);
        stepper.current_time
    };
    let first = schedule();
    assert_eq!(first, schedule());
    assert!(first >= Duration::from_millis(200));
}

/// Wake the resting body of the authority and push it along +z
fn nudge(stepper: &SyncStepper) {
    let mut body = stepper.body(0, 0).0.lock();
    body.sleeping = false;
    body.velocity = Vec3::new(0.0, 0.0, 0.5);
}

/// A body that physics keeps waking up is held at its resting pose
#[test]
fn test_sleep_jitter_hold() {
    let mut stepper = SyncStepper::two_peers();
    stepper.frame_step(1);
    assert_eq!(stepper.object(0, 0).state(), MotionState::Sleeping);

    for _ in 0..20 {
        nudge(&stepper);
        stepper.frame_step(1);
    }
    assert_eq!(stepper.object(0, 0).state(), MotionState::Sleeping);
    assert!(stepper.object(0, 0).is_interpolating());
    assert_relative_eq!(stepper.body(0, 0).position(), Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-4);
    assert!(stepper.body(0, 0).state().sleeping);

    // once physics leaves it alone, the hold ends
    stepper.frame_step(2);
    assert!(!stepper.object(0, 0).is_interpolating());
}

#[test]
fn test_sleep_jitter_hold_disabled() {
    let config = SyncConfig::default()
        .with_rng_seed(42)
        .with_prevent_sleep_jitter(false);
    let mut stepper = SyncStepper::new(StepperConfig::default().with_config(config));
    stepper.frame_step(1);

    for _ in 0..20 {
        nudge(&stepper);
        stepper.frame_step(1);
    }
    assert!(!stepper.object(0, 0).is_interpolating());
    assert!(stepper.body(0, 0).position().z > 0.1);
}
