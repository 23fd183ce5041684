use crate::stepper::*;
use approx::assert_relative_eq;
use bevy_math::{Quat, Vec3};
use core::time::Duration;
use smartsync::prelude::*;
use test_log::test;

fn held(hand: Hand) -> SyncStepper {
    let mut stepper = SyncStepper::two_peers();
    stepper.frame_step(10);
    stepper.interactable(0, 0).set_held(true);
    stepper.object_mut(0, 0).on_pickup(hand).unwrap();
    stepper
}

fn nudge(stepper: &SyncStepper, peer: usize, delta: Vec3) {
    let position = stepper.body(peer, 0).position();
    stepper.body(peer, 0).set_position(position + delta);
}

#[test]
fn test_pickup_follows_the_hand() {
    let mut stepper = held(Hand::Right);
    assert_eq!(stepper.object(0, 0).state(), MotionState::HeldRightHand);
    // the offset from the hand is replicated
    let hand = stepper.rig.bone(PeerId(0), Bone::RightHand).unwrap();
    let offset = stepper.link(0).last_published().unwrap().snapshot.pose();
    assert_relative_eq!(
        hand.to_world(offset).position,
        Vec3::new(0.0, 1.0, 0.0),
        epsilon = 1e-5
    );

    stepper.frame_step(10);
    assert_eq!(stepper.object(1, 0).state(), MotionState::HeldRightHand);
    assert_relative_eq!(
        stepper.body(1, 0).position(),
        Vec3::new(0.0, 1.0, 0.0),
        epsilon = 1e-4
    );

    // the holder moves: the copy follows within the same frame
    let moved = Frame::new(hand.position + Vec3::new(1.0, 0.0, 0.0), Quat::IDENTITY);
    stepper.rig.set_bone(PeerId(0), Bone::RightHand, moved);
    stepper.frame_step(1);
    assert_relative_eq!(
        stepper.body(1, 0).position(),
        Vec3::new(1.0, 1.0, 0.0),
        epsilon = 1e-4
    );
}

/// A held object that drifted away from its published offset is republished, at most once per
/// lag window
#[test]
fn test_drift_triggers_resync() {
    let mut stepper = held(Hand::Right);
    stepper.frame_step(1);
    let published = stepper.link(0).published_count();

    nudge(&stepper, 0, Vec3::new(0.02, 0.0, 0.0));
    stepper.frame_step(1);
    assert_eq!(stepper.link(0).published_count(), published + 1);

    // drifting again right away waits for the lag window
    nudge(&stepper, 0, Vec3::new(0.02, 0.0, 0.0));
    stepper.frame_step(3);
    assert_eq!(stepper.link(0).published_count(), published + 1);
    stepper.frame_step(2);
    assert_eq!(stepper.link(0).published_count(), published + 2);

    // small jitter is not republished
    nudge(&stepper, 0, Vec3::new(0.005, 0.0, 0.0));
    stepper.frame_step(10);
    assert_eq!(stepper.link(0).published_count(), published + 2);

    stepper.frame_step(5);
    assert_relative_eq!(
        stepper.body(1, 0).position(),
        Vec3::new(0.04, 1.0, 0.0),
        epsilon = 1e-4
    );
}

#[test]
fn test_held_jitter_grace() {
    let config = SyncConfig::default()
        .with_rng_seed(3)
        .with_held_jitter_grace(Duration::from_millis(50));
    let mut stepper = SyncStepper::new(StepperConfig::default().with_config(config));
    stepper.frame_step(10);
    stepper.interactable(0, 0).set_held(true);
    stepper.object_mut(0, 0).on_pickup(Hand::Left).unwrap();
    stepper.frame_step(1);

    nudge(&stepper, 0, Vec3::new(0.0, 0.01, 0.0));
    stepper.frame_step(5);
    assert_relative_eq!(
        stepper.body(0, 0).position(),
        Vec3::new(0.0, 1.0, 0.0),
        epsilon = 1e-4
    );
}

/// Switching hands releases and grabs within one frame: the object is never dropped
#[test]
fn test_hand_swap_is_not_a_drop() {
    let mut stepper = held(Hand::Right);
    stepper.frame_step(5);
    let changes = stepper.object(0, 0).revision().change;

    stepper.object_mut(0, 0).on_drop().unwrap();
    stepper.object_mut(0, 0).on_pickup(Hand::Left).unwrap();
    stepper.frame_step(2);
    assert_eq!(stepper.object(0, 0).state(), MotionState::HeldLeftHand);
    assert_eq!(stepper.object(0, 0).revision().change, changes + 1);
    assert_eq!(stepper.object(1, 0).state(), MotionState::HeldLeftHand);
}

#[test]
fn test_drop() {
    let mut stepper = held(Hand::Right);
    stepper.frame_step(5);
    stepper.interactable(0, 0).set_held(false);
    stepper.object_mut(0, 0).on_drop().unwrap();
    assert_eq!(stepper.object(0, 0).state(), MotionState::HeldRightHand);
    stepper.frame_step(1);
    assert_eq!(stepper.object(0, 0).state(), MotionState::Interpolating);
    stepper.frame_step(1);
    assert_eq!(stepper.object(1, 0).state(), MotionState::Interpolating);

    // bodies under gravity fall
    let mut stepper = held(Hand::Left);
    stepper.body(0, 0).0.lock().gravity = true;
    stepper.interactable(0, 0).set_held(false);
    stepper.object_mut(0, 0).on_drop().unwrap();
    stepper.frame_step(1);
    assert_eq!(stepper.object(0, 0).state(), MotionState::Falling);
}

#[test]
fn test_pickup_without_hand_bone() {
    let mut stepper = SyncStepper::two_peers();
    stepper.frame_step(10);
    stepper.rig.remove_bone(PeerId(0), Bone::LeftHand);
    stepper.object_mut(0, 0).on_pickup(Hand::Left).unwrap();
    assert_eq!(stepper.object(0, 0).state(), MotionState::HeldNoHand);

    // the copy follows the player root instead
    stepper.frame_step(10);
    assert_eq!(stepper.object(1, 0).state(), MotionState::HeldNoHand);
    assert_relative_eq!(
        stepper.body(1, 0).position(),
        Vec3::new(0.0, 1.0, 0.0),
        epsilon = 1e-4
    );
    stepper.rig.set_root(
        PeerId(0),
        Frame::new(Vec3::new(0.0, 0.0, 2.0), Quat::IDENTITY),
    );
    stepper.frame_step(1);
    assert_relative_eq!(
        stepper.body(1, 0).position(),
        Vec3::new(0.0, 1.0, 2.0),
        epsilon = 1e-4
    );
}

#[test]
fn test_attach_to_bone() {
    let mut stepper = held(Hand::Right);
    stepper.object_mut(0, 0).attach_to_bone(Bone::Head).unwrap();
    assert_eq!(stepper.object(0, 0).state(), MotionState::AttachedToBone(Bone::Head));
    // attached objects can't stay in the hand
    assert_eq!(stepper.interactable(0, 0).state().force_drops, 1);
    stepper.frame_step(10);
    assert_eq!(
        stepper.object(1, 0).state(),
        MotionState::AttachedToBone(Bone::Head)
    );

    // both copies follow the head
    let head = stepper.rig.bone(PeerId(0), Bone::Head).unwrap();
    stepper.rig.set_bone(
        PeerId(0),
        Bone::Head,
        Frame::new(head.position + Vec3::new(0.0, 0.0, 1.0), Quat::IDENTITY),
    );
    stepper.frame_step(1);
    for peer in 0..2 {
        assert_relative_eq!(
            stepper.body(peer, 0).position(),
            Vec3::new(0.0, 1.0, 1.0),
            epsilon = 1e-4
        );
    }

    stepper.object_mut(0, 0).detach().unwrap();
    stepper.frame_step(1);
    assert_eq!(stepper.object(0, 0).state(), MotionState::Interpolating);
    assert_eq!(stepper.object(1, 0).state(), MotionState::Interpolating);
}

#[test]
fn test_attach_to_missing_bone() {
    let mut stepper = SyncStepper::two_peers();
    stepper.frame_step(10);
    stepper.object_mut(0, 0).attach_to_bone(Bone::Spine).unwrap();
    assert_eq!(
        stepper.object(0, 0).state(),
        MotionState::AttachedToPlayspace
    );
    assert!(matches!(
        stepper.object_mut(1, 0).attach_to_bone(Bone::Head),
        Err(SyncError::NotAuthority)
    ));
}
