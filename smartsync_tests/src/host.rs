//! In-memory implementations of the host capabilities
use bevy_math::Vec3;
use core::time::Duration;
use parking_lot::Mutex;
use smartsync::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub pose: Pose,
    pub velocity: Vec3,
    pub spin: Vec3,
    pub kinematic: bool,
    pub gravity: bool,
    pub sleeping: bool,
}

impl Default for BodyState {
    fn default() -> Self {
        Self {
            pose: Pose::IDENTITY,
            velocity: Vec3::ZERO,
            spin: Vec3::ZERO,
            kinematic: false,
            gravity: false,
            sleeping: false,
        }
    }
}

/// Rigid body shared between the test and the object
#[derive(Debug, Clone, Default)]
pub struct TestBody(pub Arc<Mutex<BodyState>>);

impl TestBody {
    pub fn at(pose: Pose) -> Self {
        Self(Arc::new(Mutex::new(BodyState {
            pose,
            ..Default::default()
        })))
    }

    pub fn state(&self) -> BodyState {
        *self.0.lock()
    }

    pub fn position(&self) -> Vec3 {
        self.0.lock().pose.position
    }

    pub fn set_position(&self, position: Vec3) {
        self.0.lock().pose.position = position;
    }

    /// Move the body by its velocity. Kinematic and sleeping bodies don't move.
    pub fn integrate(&self, dt: Duration, gravity: Vec3) {
        let mut body = self.0.lock();
        if body.kinematic || body.sleeping {
            return;
        }
        let dt = dt.as_secs_f32();
        if body.gravity {
            body.velocity += gravity * dt;
        }
        let velocity = body.velocity;
        body.pose.position += velocity * dt;
    }
}

impl RigidBody for TestBody {
    fn pose(&self) -> Pose {
        self.0.lock().pose
    }

    fn set_pose(&mut self, pose: Pose) {
        self.0.lock().pose = pose;
    }

    fn velocity(&self) -> Vec3 {
        self.0.lock().velocity
    }

    fn spin(&self) -> Vec3 {
        self.0.lock().spin
    }

    fn set_velocity(&mut self, velocity: Vec3, spin: Vec3) {
        let mut body = self.0.lock();
        body.velocity = velocity;
        body.spin = spin;
    }

    fn is_kinematic(&self) -> bool {
        self.0.lock().kinematic
    }

    fn uses_gravity(&self) -> bool {
        self.0.lock().gravity
    }

    fn is_sleeping(&self) -> bool {
        self.0.lock().sleeping
    }

    fn sleep(&mut self) {
        self.0.lock().sleeping = true;
    }

    fn wake(&mut self) {
        self.0.lock().sleeping = false;
    }
}

/// Avatars of every player, shared by all peers
#[derive(Debug, Clone, Default)]
pub struct TestRig(pub Arc<Mutex<HashMap<(PeerId, Option<Bone>), Frame>>>);

impl TestRig {
    pub fn set_root(&self, player: PeerId, frame: Frame) {
        self.0.lock().insert((player, None), frame);
    }

    pub fn set_bone(&self, player: PeerId, bone: Bone, frame: Frame) {
        self.0.lock().insert((player, Some(bone)), frame);
    }

    pub fn remove_bone(&self, player: PeerId, bone: Bone) {
        self.0.lock().remove(&(player, Some(bone)));
    }
}

impl PlayerRig for TestRig {
    fn root(&self, player: PeerId) -> Option<Frame> {
        self.0.lock().get(&(player, None)).copied()
    }

    fn bone(&self, player: PeerId, bone: Bone) -> Option<Frame> {
        self.0.lock().get(&(player, Some(bone))).copied()
    }
}

/// The host's view of who owns what, shared by all peers
#[derive(Debug, Clone, Default)]
pub struct AuthorityDirectory(pub Arc<Mutex<HashMap<ObjectId, PeerId>>>);

impl AuthorityDirectory {
    pub fn set(&self, object: ObjectId, owner: PeerId) {
        self.0.lock().insert(object, owner);
    }
}

#[derive(Debug, Clone)]
pub struct TestIdentity {
    pub local: PeerId,
    pub directory: AuthorityDirectory,
}

impl IdentityProvider for TestIdentity {
    fn local_peer(&self) -> PeerId {
        self.local
    }

    fn observed_authority(&self, object: ObjectId) -> Option<PeerId> {
        self.directory.0.lock().get(&object).copied()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrabState {
    pub held: bool,
    pub force_drops: u32,
}

#[derive(Debug, Clone, Default)]
pub struct TestInteractable(pub Arc<Mutex<GrabState>>);

impl TestInteractable {
    pub fn set_held(&self, held: bool) {
        self.0.lock().held = held;
    }

    pub fn state(&self) -> GrabState {
        *self.0.lock()
    }
}

impl Interactable for TestInteractable {
    fn is_held_locally(&self) -> bool {
        self.0.lock().held
    }

    fn force_drop(&mut self) {
        let mut state = self.0.lock();
        state.held = false;
        state.force_drops += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Packet {
    Snapshot(SnapshotMessage),
    ResyncRequest(ObjectId),
    Authority(ObjectId, PeerId),
}

#[derive(Debug, Default)]
pub struct LinkState {
    pub congested: bool,
    pub lag: Duration,
    /// Packets sent while blocked are lost
    pub blocked: bool,
    /// The next snapshot handed to the transport is reported as failed
    pub fail_next_publish: bool,
    /// Packets waiting to be delivered by the stepper
    pub outbox: Vec<Packet>,
    /// Every snapshot handed to the transport
    pub published: Vec<SnapshotMessage>,
    pub resync_requests: Vec<ObjectId>,
    pub authority_broadcasts: Vec<(ObjectId, PeerId)>,
}

/// Transport of one peer
#[derive(Debug, Clone, Default)]
pub struct PeerTransport(pub Arc<Mutex<LinkState>>);

impl PeerTransport {
    pub fn with_lag(lag: Duration) -> Self {
        Self(Arc::new(Mutex::new(LinkState {
            lag,
            ..Default::default()
        })))
    }

    pub fn set_congested(&self, congested: bool) {
        self.0.lock().congested = congested;
    }

    pub fn set_blocked(&self, blocked: bool) {
        self.0.lock().blocked = blocked;
    }

    pub fn fail_next_publish(&self) {
        self.0.lock().fail_next_publish = true;
    }

    pub fn published(&self) -> Vec<SnapshotMessage> {
        self.0.lock().published.clone()
    }

    pub fn published_count(&self) -> usize {
        self.0.lock().published.len()
    }

    pub fn last_published(&self) -> Option<SnapshotMessage> {
        self.0.lock().published.last().copied()
    }

    pub fn resync_requests(&self) -> usize {
        self.0.lock().resync_requests.len()
    }
}

impl Transport for PeerTransport {
    fn is_congested(&self) -> bool {
        self.0.lock().congested
    }

    fn lag_estimate(&self) -> Duration {
        self.0.lock().lag
    }

    fn request_serialize(&mut self, message: SnapshotMessage) {
        let mut link = self.0.lock();
        link.published.push(message);
        link.outbox.push(Packet::Snapshot(message));
    }

    fn send_resync_request(&mut self, object: ObjectId) {
        let mut link = self.0.lock();
        link.resync_requests.push(object);
        link.outbox.push(Packet::ResyncRequest(object));
    }

    fn broadcast_authority(&mut self, object: ObjectId, owner: PeerId) {
        let mut link = self.0.lock();
        link.authority_broadcasts.push((object, owner));
        link.outbox.push(Packet::Authority(object, owner));
    }
}

/// Records every event fired by the objects it listens to
#[derive(Debug, Default)]
pub struct RecordingListener {
    pub states: Mutex<Vec<(ObjectId, MotionState, MotionState)>>,
    pub authority: Mutex<Vec<(ObjectId, PeerId, PeerId)>>,
}

impl RecordingListener {
    pub fn states(&self) -> Vec<(ObjectId, MotionState, MotionState)> {
        self.states.lock().clone()
    }

    pub fn authority(&self) -> Vec<(ObjectId, PeerId, PeerId)> {
        self.authority.lock().clone()
    }
}

impl SyncListener for RecordingListener {
    fn on_state_changed(&self, object: ObjectId, old: MotionState, new: MotionState) {
        self.states.lock().push((object, old, new));
    }

    fn on_authority_changed(&self, object: ObjectId, old: PeerId, new: PeerId) {
        self.authority.lock().push((object, old, new));
    }
}
