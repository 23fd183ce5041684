use crate::host::*;
use bevy_math::{Quat, Vec3};
use core::time::Duration;
use smartsync::prelude::*;
use std::sync::Arc;
#[allow(unused_imports)]
use tracing::{debug, info, trace};

/// One peer of the session, with its local copy of every object
pub struct TestPeer {
    pub id: PeerId,
    pub link: PeerTransport,
    pub objects: Vec<ReplicatedObject>,
    pub bodies: Vec<TestBody>,
    pub interactables: Vec<TestInteractable>,
    pub connected: bool,
}

impl TestPeer {
    pub fn object(&self, id: ObjectId) -> Option<&ReplicatedObject> {
        self.objects.iter().find(|o| o.id() == id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut ReplicatedObject> {
        self.objects.iter_mut().find(|o| o.id() == id)
    }
}

#[derive(Debug, Clone)]
pub struct StepperConfig {
    pub peers: usize,
    /// Initial pose of every object
    pub poses: Vec<Pose>,
    /// Index of the peer that owns every object at spawn
    pub owner: usize,
    pub config: SyncConfig,
    pub frame_duration: Duration,
    pub lag: Duration,
}

impl Default for StepperConfig {
    fn default() -> Self {
        Self {
            peers: 2,
            poses: vec![Pose::from_position(Vec3::new(0.0, 1.0, 0.0))],
            owner: 0,
            config: SyncConfig::default().with_rng_seed(42),
            frame_duration: Duration::from_millis(20),
            lag: Duration::from_millis(100),
        }
    }
}

impl StepperConfig {
    pub fn with_poses(mut self, poses: Vec<Pose>) -> Self {
        self.poses = poses;
        self
    }

    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_lag(mut self, lag: Duration) -> Self {
        self.lag = lag;
        self
    }
}

/// Stepper with n peers, each holding a local copy of the same objects.
///
/// Peers are connected through in-memory links: the packets a peer sends during a frame are
/// delivered to every other peer at the start of the next frame.
pub struct SyncStepper {
    pub peers: Vec<TestPeer>,
    pub rig: TestRig,
    pub directory: AuthorityDirectory,
    pub config: SyncConfig,
    pub frame_duration: Duration,
    pub current_time: Duration,
}

impl SyncStepper {
    /// Two peers, one object owned by the first peer
    pub fn two_peers() -> Self {
        Self::new(StepperConfig::default())
    }

    pub fn new(config: StepperConfig) -> Self {
        let rig = TestRig::default();
        let directory = AuthorityDirectory::default();
        let owner = PeerId(config.owner as u64);
        for peer in 0..config.peers {
            let player = PeerId(peer as u64);
            let root = Frame::new(Vec3::new(peer as f32 * 5.0, 0.0, 0.0), Quat::IDENTITY);
            rig.set_root(player, root);
            rig.set_bone(
                player,
                Bone::LeftHand,
                Frame::new(root.position + Vec3::new(-0.3, 1.2, 0.3), Quat::IDENTITY),
            );
            rig.set_bone(
                player,
                Bone::RightHand,
                Frame::new(root.position + Vec3::new(0.3, 1.2, 0.3), Quat::IDENTITY),
            );
            rig.set_bone(
                player,
                Bone::Head,
                Frame::new(root.position + Vec3::new(0.0, 1.7, 0.0), Quat::IDENTITY),
            );
        }
        for object in 0..config.poses.len() {
            directory.set(ObjectId(object as u64), owner);
        }

        let now = Duration::ZERO;
        let peers = (0..config.peers)
            .map(|peer| {
                let id = PeerId(peer as u64);
                let link = PeerTransport::with_lag(config.lag);
                let identity: Arc<dyn IdentityProvider> = Arc::new(TestIdentity {
                    local: id,
                    directory: directory.clone(),
                });
                let mut objects = vec![];
                let mut bodies = vec![];
                let mut interactables = vec![];
                for (index, pose) in config.poses.iter().enumerate() {
                    let body = TestBody::at(*pose);
                    let interactable = TestInteractable::default();
                    let object = ReplicatedObject::spawn(
                        ObjectId(index as u64),
                        owner,
                        config.config.clone(),
                        SyncHost {
                            identity: identity.clone(),
                            transport: Box::new(link.clone()),
                            body: Box::new(body.clone()),
                            rig: Arc::new(rig.clone()),
                            interactable: Some(Box::new(interactable.clone())),
                        },
                        now,
                    )
                    .expect("spawning an object should succeed");
                    objects.push(object);
                    bodies.push(body);
                    interactables.push(interactable);
                }
                TestPeer {
                    id,
                    link,
                    objects,
                    bodies,
                    interactables,
                    connected: true,
                }
            })
            .collect();

        Self {
            peers,
            rig,
            directory,
            config: config.config,
            frame_duration: config.frame_duration,
            current_time: now,
        }
    }

    pub fn peer(&self, peer: usize) -> &TestPeer {
        &self.peers[peer]
    }

    pub fn object(&self, peer: usize, object: usize) -> &ReplicatedObject {
        &self.peers[peer].objects[object]
    }

    pub fn object_mut(&mut self, peer: usize, object: usize) -> &mut ReplicatedObject {
        &mut self.peers[peer].objects[object]
    }

    pub fn body(&self, peer: usize, object: usize) -> &TestBody {
        &self.peers[peer].bodies[object]
    }

    pub fn interactable(&self, peer: usize, object: usize) -> &TestInteractable {
        &self.peers[peer].interactables[object]
    }

    pub fn link(&self, peer: usize) -> &PeerTransport {
        &self.peers[peer].link
    }

    /// Let `object` run into `other`, as simulated by `peer`
    pub fn collide(&mut self, peer: usize, object: usize, other: usize) {
        let objects = &mut self.peers[peer].objects;
        let (this, that) = if object < other {
            let (left, right) = objects.split_at_mut(other);
            (&mut left[object], &mut right[0])
        } else {
            let (left, right) = objects.split_at_mut(object);
            (&mut right[0], &mut left[other])
        };
        this.on_collision(Some(that))
            .expect("collision should succeed");
    }

    /// Disconnect `peer`; the host hands its objects over to `new_owner`
    pub fn disconnect(&mut self, peer: usize, new_owner: usize) {
        info!(?peer, ?new_owner, "disconnecting peer");
        self.peers[peer].connected = false;
        let left = self.peers[peer].id;
        let owner = self.peers[new_owner].id;
        for object in 0..self.peers[peer].objects.len() {
            self.directory.set(ObjectId(object as u64), owner);
        }
        for other in self.peers.iter_mut().filter(|p| p.connected) {
            for object in other.objects.iter_mut() {
                object
                    .on_peer_left(left)
                    .expect("handling a departure should succeed");
            }
        }
    }

    /// Deliver every packet sent so far
    pub fn flush(&mut self) {
        let mut packets = vec![];
        for (from, peer) in self.peers.iter().enumerate() {
            let mut link = peer.link.0.lock();
            if !peer.connected || link.blocked {
                link.outbox.clear();
                continue;
            }
            packets.extend(link.outbox.drain(..).map(|packet| (from, packet)));
        }
        for (from, packet) in packets {
            self.deliver(from, packet);
        }
    }

    fn deliver(&mut self, from: usize, packet: Packet) {
        trace!(?from, ?packet, "delivering packet");
        match packet {
            Packet::Snapshot(message) => {
                let failed =
                    core::mem::take(&mut self.peers[from].link.0.lock().fail_next_publish);
                let Some(sender) = self.peers[from].object_mut(message.object) else {
                    return;
                };
                if failed {
                    debug!(?from, object = ?message.object, "dropping snapshot");
                    sender.on_publish_failed();
                    return;
                }
                sender.on_publish_succeeded();
                for (_, peer) in self.receivers(from) {
                    if let Some(object) = peer.object_mut(message.object) {
                        object
                            .on_receive(&message)
                            .expect("receiving a snapshot should succeed");
                    }
                }
            }
            Packet::ResyncRequest(id) => {
                for (_, peer) in self.receivers(from) {
                    if let Some(object) = peer.object_mut(id) {
                        object
                            .on_resync_requested()
                            .expect("answering a resync request should succeed");
                    }
                }
            }
            Packet::Authority(id, owner) => {
                self.directory.set(id, owner);
                for (_, peer) in self.receivers(from) {
                    if let Some(object) = peer.object_mut(id) {
                        object
                            .on_external_transfer(owner)
                            .expect("applying a transfer should succeed");
                    }
                }
            }
        }
    }

    fn receivers(&mut self, from: usize) -> impl Iterator<Item = (usize, &mut TestPeer)> {
        self.peers
            .iter_mut()
            .enumerate()
            .filter(move |(index, peer)| *index != from && peer.connected)
    }

    pub fn advance_time(&mut self, duration: Duration) {
        self.current_time += duration;
    }

    /// Advance the time by one frame and run every connected peer:
    /// deliver packets, tick, simulate and run the physics tick, then the late tick.
    pub fn frame_step(&mut self, n: usize) {
        for _ in 0..n {
            self.advance_time(self.frame_duration);
            self.flush();
            let now = self.current_time;
            let gravity = self.config.gravity;
            for peer in self.peers.iter_mut().filter(|p| p.connected) {
                for object in peer.objects.iter_mut() {
                    object.tick(now).expect("tick should succeed");
                }
                for (object, body) in peer.objects.iter_mut().zip(peer.bodies.iter()) {
                    if object.is_local_authority() {
                        body.integrate(self.frame_duration, gravity);
                    }
                    object.physics_tick(now).expect("physics tick should succeed");
                }
                for object in peer.objects.iter_mut() {
                    object.late_tick(now).expect("late tick should succeed");
                }
            }
        }
    }

    /// Step until `condition` holds, at most `max_frames` frames. Returns true if it held.
    pub fn step_until(
        &mut self,
        max_frames: usize,
        mut condition: impl FnMut(&Self) -> bool,
    ) -> bool {
        for _ in 0..max_frames {
            if condition(self) {
                return true;
            }
            self.frame_step(1);
        }
        condition(self)
    }
}
