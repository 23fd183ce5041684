//! The replicated object and its state machine
//!
//! A [`ReplicatedObject`] exists on every peer. On the authority it captures the state of the
//! local rigid body and publishes it; everywhere else it interpolates the local copy towards
//! the latest received snapshot.
//!
//! State changes only happen on the authority (or through replication). A transition is split in
//! two steps: [`ReplicatedObject::transition`] runs the exit/enter hooks and returns a
//! [`StateTransition`] event, then [`ReplicatedObject::apply_transition`] performs the side
//! effects (publish, local interpolation, listener notifications).
use crate::custom::{CustomState, CustomStateTable};
use crate::error::{Result, SyncError};
use crate::listener::{ListenerSet, SyncListener};
use crate::schedule::{Continuation, Scheduler};
use bevy_math::Vec3;
use core::time::Duration;
use rand::SeedableRng;
use rand::rngs::StdRng;
use smartsync_attachment::prelude::{DriftMonitor, ResolvedFrame, compute_parent_frame};
use smartsync_core::prelude::*;
use smartsync_interpolation::prelude::*;
use smartsync_replication::prelude::*;
use std::sync::Arc;
#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};

/// Linear and angular speeds under which a body is considered at rest
const REST_SPEED: f32 = 0.01;

/// Capabilities provided by the host for one object
pub struct SyncHost {
    pub identity: Arc<dyn IdentityProvider>,
    pub transport: Box<dyn Transport>,
    pub body: Box<dyn RigidBody>,
    pub rig: Arc<dyn PlayerRig>,
    pub interactable: Option<Box<dyn Interactable>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOrigin {
    /// Decided by the local authority
    Local,
    /// Received from the authority
    Remote,
}

/// A state change that happened, but whose side effects have not been applied yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub old: MotionState,
    pub new: MotionState,
    pub revision: Revision,
    pub origin: TransitionOrigin,
}

pub struct ReplicatedObject {
    pub(crate) id: ObjectId,
    pub(crate) config: SyncConfig,
    pub(crate) authority: Authority,
    pub(crate) channel: ReplicationChannel,
    pub(crate) transport: Box<dyn Transport>,
    pub(crate) body: Box<dyn RigidBody>,
    pub(crate) rig: Arc<dyn PlayerRig>,
    pub(crate) interactable: Option<Box<dyn Interactable>>,
    pub(crate) state: MotionState,
    pub(crate) revision: Revision,
    /// Latest published or received snapshot, expressed in the parent frame of `state`
    pub(crate) snapshot: Snapshot,
    /// Sender clock of `snapshot`
    pub(crate) sent_at: Duration,
    /// The snapshot received before `snapshot`, if it was expressed in world space
    pub(crate) previous: Option<(Snapshot, Duration)>,
    pub(crate) window: Option<InterpolationWindow>,
    /// Incremented every time the interpolation is restarted
    pub(crate) window_generation: u64,
    /// Offset from the parent frame written back in `late_tick`
    pub(crate) follow_offset: Option<Pose>,
    pub(crate) scheduler: Scheduler,
    pub(crate) listeners: ListenerSet,
    pub(crate) custom_states: CustomStateTable,
    pub(crate) drift: DriftMonitor,
    pub(crate) spawn_pose: Pose,
    pub(crate) frame: u64,
    pub(crate) now: Duration,
    pub(crate) rng: StdRng,
    /// Set once the authority decided where a teleported object goes next
    pub(crate) teleport_settled: bool,
    invalid_custom_reported: bool,
}

impl core::fmt::Debug for ReplicatedObject {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ReplicatedObject")
            .field("id", &self.id)
            .field("authority", &self.authority)
            .field("state", &self.state)
            .field("revision", &self.revision)
            .field("snapshot", &self.snapshot)
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}

impl ReplicatedObject {
    /// Create the local copy of an object owned by `owner`.
    ///
    /// The spawning pose is the current pose of the rigid body. Every object starts in
    /// [`MotionState::Teleporting`]: the authority publishes it right away, the other peers
    /// ask for a resync if nothing arrives.
    pub fn spawn(
        id: ObjectId,
        owner: PeerId,
        config: SyncConfig,
        host: SyncHost,
        now: Duration,
    ) -> Result<Self> {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ id.0),
            None => StdRng::from_os_rng(),
        };
        let spawn_pose = host.body.pose();
        let mut object = Self {
            id,
            config,
            authority: Authority::new(owner, host.identity),
            channel: ReplicationChannel::default(),
            transport: host.transport,
            body: host.body,
            rig: host.rig,
            interactable: host.interactable,
            state: MotionState::Teleporting,
            revision: Revision::default(),
            snapshot: Snapshot::at_rest(spawn_pose),
            sent_at: now,
            previous: None,
            window: None,
            window_generation: 0,
            follow_offset: None,
            scheduler: Scheduler::default(),
            listeners: ListenerSet::default(),
            custom_states: CustomStateTable::default(),
            drift: DriftMonitor::default(),
            spawn_pose,
            frame: 0,
            now,
            rng,
            teleport_settled: false,
            invalid_custom_reported: false,
        };
        if object.is_local_authority() {
            info!(?id, ?owner, "spawning replicated object");
            let transition = object.transition(MotionState::Teleporting, TransitionOrigin::Local)?;
            object.apply_transition(transition)?;
        } else {
            debug!(?id, ?owner, "spawning remote object");
            object.schedule_resync();
        }
        Ok(object)
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn owner(&self) -> PeerId {
        self.authority.owner()
    }

    pub fn is_local_authority(&self) -> bool {
        self.authority.is_local_authority()
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Replace the snapshot that will be published. Only meaningful on the authority,
    /// typically from a custom state's `on_serialize`.
    pub fn set_snapshot(&mut self, snapshot: Snapshot) {
        debug_assert!(
            self.is_local_authority(),
            "only the authority can write the snapshot"
        );
        self.snapshot = snapshot;
    }

    pub fn window(&self) -> Option<&InterpolationWindow> {
        self.window.as_ref()
    }

    pub fn is_interpolating(&self) -> bool {
        self.window.is_some()
    }

    pub fn channel(&self) -> &ReplicationChannel {
        &self.channel
    }

    pub fn pending_publish(&self) -> bool {
        self.channel.pending_publish()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn body(&self) -> &dyn RigidBody {
        self.body.as_ref()
    }

    pub fn body_mut(&mut self) -> &mut dyn RigidBody {
        self.body.as_mut()
    }

    pub fn spawn_pose(&self) -> Pose {
        self.spawn_pose
    }

    /// Number of ticks run so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn add_listener(&mut self, listener: &Arc<dyn SyncListener>) -> bool {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&mut self, listener: &Arc<dyn SyncListener>) -> bool {
        self.listeners.remove(listener)
    }

    /// Register a custom state. The returned index is used with [`MotionState::Custom`].
    ///
    /// Every peer must register the same custom states in the same order.
    pub fn register_custom_state(&mut self, state: Box<dyn CustomState>) -> usize {
        self.custom_states.register(state)
    }

    /// Resolve the parent frame of the current state
    pub fn parent_frame(&self) -> ResolvedFrame {
        compute_parent_frame(
            self.state.attachment_target(),
            self.authority.owner(),
            self.rig.as_ref(),
        )
    }

    /// World-space snapshot of the local rigid body
    pub fn body_snapshot(&self) -> Snapshot {
        Snapshot::new(self.body.pose(), self.body.velocity(), self.body.spin())
    }

    /// Capture the local rigid body as the snapshot to publish, in the parent frame of the state
    pub fn capture_snapshot(&mut self) {
        let frame = self.parent_frame().frame;
        let snapshot = self.body_snapshot().to_local(&frame);
        self.set_snapshot(snapshot);
    }

    /// Move the local copy along the spline between the interpolation start and the snapshot
    pub fn follow_hermite(&mut self, t: f32) {
        let Some(window) = self.window else {
            return;
        };
        let frame = self.parent_frame().frame;
        let pose = hermite_pose(&window.start, &self.snapshot, window.lag_secs(), t);
        let velocity = window.start.velocity.lerp(self.snapshot.velocity, t);
        let spin = window.start.spin.lerp(self.snapshot.spin, t);
        self.body.set_pose(frame.to_world(pose));
        self.body.set_velocity(
            frame.direction_to_world(velocity),
            frame.direction_to_world(spin),
        );
    }

    /// Hand the local copy back to physics with the velocities of the snapshot
    pub fn apply_synced_velocity(&mut self) {
        let frame = self.parent_frame().frame;
        self.body.wake();
        self.body.set_velocity(
            frame.direction_to_world(self.snapshot.velocity),
            frame.direction_to_world(self.snapshot.spin),
        );
    }

    pub(crate) fn is_at_rest(&self) -> bool {
        self.body.is_sleeping()
            || (self.body.velocity().length() < REST_SPEED
                && self.body.spin().length() < REST_SPEED)
    }

    pub(crate) fn is_held_locally(&self) -> bool {
        self.interactable
            .as_ref()
            .is_some_and(|interactable| interactable.is_held_locally())
    }

    pub(crate) fn force_drop(&mut self) {
        if let Some(interactable) = self.interactable.as_mut() {
            if interactable.is_held_locally() {
                debug!(object = ?self.id, "releasing local grab");
                interactable.force_drop();
            }
        }
    }

    // Ticks

    /// Per-frame tick: runs the continuations that are due (interpolation loop, deferred drops,
    /// retries, resync requests).
    pub fn tick(&mut self, now: Duration) -> Result<()> {
        self.now = now;
        self.frame += 1;
        for continuation in self.scheduler.drain_ready(self.frame, now) {
            self.run_continuation(continuation)?;
        }
        Ok(())
    }

    /// Fixed-rate tick, run after the physics step
    pub fn physics_tick(&mut self, now: Duration) -> Result<()> {
        self.now = now;
        if !self.is_local_authority() {
            return Ok(());
        }
        let position = self.body.pose().position;
        if !self.state.follows_player() && position.y <= self.config.respawn_height {
            info!(object = ?self.id, ?position, "object fell out of the world, respawning");
            return self.respawn();
        }
        match self.state {
            MotionState::Teleporting if !self.teleport_settled => {
                self.teleport_settled = true;
                if self.body.is_kinematic() || self.is_at_rest() {
                    self.change_state(MotionState::Sleeping)?;
                } else {
                    self.change_state(MotionState::Interpolating)?;
                }
            }
            MotionState::Interpolating | MotionState::Falling => {
                if self.body.is_sleeping() {
                    self.change_state(MotionState::Sleeping)?;
                } else if self
                    .channel
                    .is_publish_due(now, self.config.publish_interval)
                {
                    self.publish()?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Late tick: once every parent frame has been updated for this frame, write back the
    /// pose of objects that follow a player.
    pub fn late_tick(&mut self, now: Duration) -> Result<()> {
        self.now = now;
        let Some(offset) = self.follow_offset else {
            return Ok(());
        };
        if !self.state.follows_player() {
            return Ok(());
        }
        let frame = self.parent_frame().frame;
        self.body.set_pose(frame.to_world(offset));
        Ok(())
    }

    fn run_continuation(&mut self, continuation: Continuation) -> Result<()> {
        trace!(object = ?self.id, ?continuation, frame = self.frame, "running continuation");
        match continuation {
            Continuation::Interpolate => self.interpolation_pass(),
            Continuation::ConfirmDrop { state, revision } => {
                if self.is_local_authority()
                    && self.state == state
                    && self.revision.change == revision
                {
                    let next = if self.body.uses_gravity() {
                        MotionState::Falling
                    } else {
                        MotionState::Interpolating
                    };
                    debug!(object = ?self.id, ?state, ?next, "drop confirmed");
                    self.change_state(next)
                } else {
                    trace!(object = ?self.id, ?state, current = ?self.state, "drop superseded");
                    Ok(())
                }
            }
            Continuation::ReleaseWorldLock { revision } => {
                if self.is_local_authority()
                    && self.state == MotionState::WorldLocked
                    && self.revision.change == revision
                {
                    self.change_state(MotionState::Interpolating)
                } else {
                    Ok(())
                }
            }
            Continuation::RetryPublish => {
                if self.is_local_authority() && self.channel.pending_publish() {
                    self.publish()?;
                }
                Ok(())
            }
            Continuation::ResyncRequest => {
                self.resync_request();
                Ok(())
            }
        }
    }

    // Interpolation loop

    /// Restart the interpolation from the current pose of the local copy
    pub(crate) fn start_interpolation(&mut self) -> Result<()> {
        let lag = self.transport.lag_estimate();
        let frame = self.parent_frame().frame;
        let start = self.body_snapshot().to_local(&frame);
        self.window = Some(InterpolationWindow::begin(self.now, lag, start));
        self.window_generation += 1;
        self.follow_offset = None;
        trace!(object = ?self.id, state = ?self.state, ?lag, "starting interpolation");
        self.run_interpolation_start()?;
        if self.window.is_some() {
            self.schedule_interpolation();
        }
        Ok(())
    }

    fn schedule_interpolation(&mut self) {
        if !self
            .scheduler
            .contains(|c| *c == Continuation::Interpolate)
        {
            self.scheduler
                .at_frame(self.frame + 1, Continuation::Interpolate);
        }
    }

    fn interpolation_pass(&mut self) -> Result<()> {
        let Some(window) = self.window else {
            return Ok(());
        };
        let generation = self.window_generation;
        let t = window.fraction(self.now);
        self.run_interpolate_step(t)?;
        if self.window_generation != generation {
            // the step restarted the interpolation
            return Ok(());
        }
        if window.is_finished(self.now) {
            let extend = self.run_interpolation_end()?;
            if self.window_generation != generation {
                return Ok(());
            }
            if !extend {
                trace!(object = ?self.id, state = ?self.state, "interpolation settled");
                self.window = None;
                return Ok(());
            }
        }
        self.schedule_interpolation();
        Ok(())
    }

    // Transitions

    /// Run the exit hook of the current state, switch to `new` and run its enter hook.
    ///
    /// Local transitions bump the state-change counter. The side effects are applied
    /// separately with [`Self::apply_transition`].
    pub fn transition(
        &mut self,
        new: MotionState,
        origin: TransitionOrigin,
    ) -> Result<StateTransition> {
        let new = self.resolve_state(new);
        let old = self.state;
        self.run_exit()?;
        self.state = new;
        if origin == TransitionOrigin::Local {
            self.revision = self.revision.next_change();
        }
        debug!(object = ?self.id, ?old, ?new, ?origin, revision = ?self.revision, "state transition");
        self.run_enter()?;
        Ok(StateTransition {
            old,
            new,
            revision: self.revision,
            origin,
        })
    }

    /// Publish and interpolate locally (for local transitions), then notify the listeners
    pub fn apply_transition(&mut self, transition: StateTransition) -> Result<()> {
        if transition.origin == TransitionOrigin::Local && self.is_local_authority() {
            self.run_serialize()?;
            self.start_interpolation()?;
            self.send_snapshot();
        }
        self.listeners
            .notify_state_changed(self.id, transition.old, transition.new);
        Ok(())
    }

    /// Change the state of the object. Only the authority can do this.
    pub fn change_state(&mut self, new: MotionState) -> Result<()> {
        if !self.is_local_authority() {
            return Err(SyncError::NotAuthority);
        }
        let transition = self.transition(new, TransitionOrigin::Local)?;
        self.apply_transition(transition)
    }

    /// Custom states that were never registered fall back to [`MotionState::Interpolating`]
    fn resolve_state(&mut self, state: MotionState) -> MotionState {
        let MotionState::Custom(index) = state else {
            return state;
        };
        if self.custom_states.is_registered(index) {
            return state;
        }
        if !self.invalid_custom_reported {
            self.invalid_custom_reported = true;
            error!(
                object = ?self.id,
                index,
                registered = self.custom_states.len(),
                "custom state is not registered, falling back to Interpolating"
            );
        }
        MotionState::Interpolating
    }

    // Publish

    /// Capture and publish the current state. Only the authority can do this.
    pub fn publish(&mut self) -> Result<PublishOutcome> {
        if !self.is_local_authority() {
            return Err(SyncError::NotAuthority);
        }
        self.run_serialize()?;
        Ok(self.send_snapshot())
    }

    fn send_snapshot(&mut self) -> PublishOutcome {
        debug_assert!(self.is_local_authority(), "only the authority publishes");
        self.revision = self.revision.next_sequence();
        self.sent_at = self.now;
        let message = SnapshotMessage {
            object: self.id,
            state: self.state,
            revision: self.revision,
            sent_at: self.now,
            snapshot: self.snapshot,
        };
        let outcome = self
            .channel
            .publish(self.now, message, self.transport.as_mut());
        if outcome == PublishOutcome::Deferred {
            self.schedule_retry();
        }
        outcome
    }

    fn schedule_retry(&mut self) {
        if self
            .scheduler
            .contains(|c| *c == Continuation::RetryPublish)
        {
            return;
        }
        let delay = ReplicationChannel::retry_delay(
            self.config.fixed_timestep,
            self.config.retry_jitter,
            &mut self.rng,
        );
        trace!(object = ?self.id, ?delay, "scheduling publish retry");
        self.scheduler
            .at_time(self.now + delay, Continuation::RetryPublish);
    }

    /// The transport sent our last snapshot
    pub fn on_publish_succeeded(&mut self) {
        self.channel.on_publish_succeeded();
    }

    /// The transport dropped our last snapshot: retry until it goes through
    pub fn on_publish_failed(&mut self) {
        if !self.is_local_authority() {
            return;
        }
        self.channel.on_publish_failed();
        self.schedule_retry();
    }

    /// Another peer asked for our state
    pub fn on_resync_requested(&mut self) -> Result<()> {
        if !self.is_local_authority() {
            return Ok(());
        }
        self.publish().map(|_| ())
    }

    // Receive

    /// Apply a snapshot published by the authority
    pub fn on_receive(&mut self, message: &SnapshotMessage) -> Result<ReceiveOutcome> {
        if message.object != self.id {
            warn!(object = ?self.id, received = ?message.object, "snapshot for another object");
            return Ok(ReceiveOutcome::Ignored);
        }
        let outcome = self
            .channel
            .on_receive(message, self.is_local_authority());
        if outcome != ReceiveOutcome::Apply {
            return Ok(outcome);
        }
        self.scheduler
            .cancel(|c| *c == Continuation::ResyncRequest);

        let state = self.resolve_state(message.state);
        let is_new_state = state != self.state || message.revision.change != self.revision.change;
        self.previous = (self.state.attachment_target() == AttachmentTarget::World)
            .then_some((self.snapshot, self.sent_at));
        self.revision = message.revision;
        let transition = if is_new_state {
            Some(self.transition(state, TransitionOrigin::Remote)?)
        } else {
            None
        };
        self.snapshot = message.snapshot;
        self.sent_at = message.sent_at;
        trace!(object = ?self.id, ?state, revision = ?message.revision, "applying snapshot");
        self.start_interpolation()?;
        if let Some(transition) = transition {
            self.apply_transition(transition)?;
        }
        Ok(outcome)
    }

    /// Decode and apply a snapshot received as raw bytes
    pub fn receive_bytes(&mut self, bytes: &[u8]) -> Result<ReceiveOutcome> {
        let message = SnapshotMessage::from_bytes(bytes)?;
        self.on_receive(&message)
    }

    pub(crate) fn schedule_resync(&mut self) {
        if self
            .scheduler
            .contains(|c| *c == Continuation::ResyncRequest)
        {
            return;
        }
        let delay = ReplicationChannel::resync_delay(self.transport.lag_estimate(), &mut self.rng);
        self.scheduler
            .at_time(self.now + delay, Continuation::ResyncRequest);
    }

    /// Ask the authority for its state until something is received
    fn resync_request(&mut self) {
        if self.is_local_authority() || self.channel.has_received() {
            return;
        }
        if self.transport.is_congested() {
            trace!(object = ?self.id, "transport congested, postponing resync request");
        } else {
            debug!(object = ?self.id, owner = ?self.owner(), "requesting resync");
            self.transport.send_resync_request(self.id);
        }
        self.schedule_resync();
    }

    // Authority

    /// Request authority over the object for the local peer
    pub fn request_transfer(&mut self, check_congestion: bool) -> Result<TransferOutcome> {
        let outcome =
            self.authority
                .request_transfer(self.id, check_congestion, self.transport.as_mut());
        if let TransferOutcome::Transferred(change) = outcome {
            self.on_authority_change(change)?;
        }
        Ok(outcome)
    }

    /// Another peer took authority over the object
    pub fn on_external_transfer(&mut self, new_owner: PeerId) -> Result<()> {
        match self.authority.on_external_transfer(new_owner) {
            Some(change) => self.on_authority_change(change),
            None => Ok(()),
        }
    }

    /// A peer disconnected
    pub fn on_peer_left(&mut self, peer: PeerId) -> Result<()> {
        match self.authority.on_peer_left(self.id, peer) {
            Some(change) => self.on_authority_change(change),
            None => Ok(()),
        }
    }

    fn on_authority_change(&mut self, change: AuthorityChange) -> Result<()> {
        debug!(object = ?self.id, old = ?change.old, new = ?change.new, state = ?self.state, "authority changed");
        if change.lost() {
            if self.channel.cancel_pending() {
                debug!(object = ?self.id, "cancelled pending publish");
            }
            self.scheduler.cancel(|c| {
                matches!(
                    c,
                    Continuation::RetryPublish
                        | Continuation::ConfirmDrop { .. }
                        | Continuation::ReleaseWorldLock { .. }
                )
            });
            self.force_drop();
        }
        if change.gained() {
            self.scheduler
                .cancel(|c| *c == Continuation::ResyncRequest);
            if let Some(last) = self.channel.last_revision() {
                self.revision = self.revision.max(last);
            }
            // peers that saw more of the previous owner's sequence must still accept ours
            self.revision = self.revision.next_change();
            let held_locally = self.is_held_locally();
            if held_locally && self.state.forbids_pickup() {
                self.force_drop();
            }
            if self.state.follows_player() && !held_locally {
                // the parent frame now resolves against the new owner's avatar: pin the object
                // in place for one frame before letting physics take over
                self.change_state(MotionState::WorldLocked)?;
                self.scheduler.at_frame(
                    self.frame + 1,
                    Continuation::ReleaseWorldLock {
                        revision: self.revision.change,
                    },
                );
            } else {
                self.start_interpolation()?;
            }
        }
        self.listeners
            .notify_authority_changed(self.id, change.old, change.new);
        Ok(())
    }

    // Local triggers

    /// Wake up on collision and, if allowed, take authority of the object we collided with
    pub fn on_collision(&mut self, other: Option<&mut ReplicatedObject>) -> Result<()> {
        if !self.is_local_authority() {
            return Ok(());
        }
        match self.state {
            MotionState::Sleeping | MotionState::Teleporting => {
                self.change_state(MotionState::Interpolating)?;
            }
            state if state.is_free() => {
                self.publish()?;
            }
            _ => {}
        }
        let Some(other) = other else {
            return Ok(());
        };
        if !self.config.take_ownership_on_collision
            || !other.config.allow_takeover_on_collision
            || other.is_local_authority()
            || other.state.follows_player()
        {
            return Ok(());
        }
        if let TransferOutcome::Transferred(_) = other.request_transfer(true)? {
            debug!(object = ?self.id, other = ?other.id, "took authority on collision");
            other.change_state(MotionState::Interpolating)?;
        }
        Ok(())
    }

    /// The local player grabbed the object with `hand`
    pub fn on_pickup(&mut self, hand: Hand) -> Result<()> {
        self.request_transfer(false)?;
        let resolved = compute_parent_frame(
            AttachmentTarget::Bone(hand.bone()),
            self.authority.local_peer(),
            self.rig.as_ref(),
        );
        let state = if resolved.fallback {
            MotionState::HeldNoHand
        } else {
            hand.held_state()
        };
        self.change_state(state)
    }

    /// The local player released the object.
    ///
    /// Switching hands releases the object and grabs it again within the same frame, so the
    /// demotion to a free state is only confirmed on the next tick if nothing happened since.
    pub fn on_drop(&mut self) -> Result<()> {
        if !self.is_local_authority() || !self.state.is_held() {
            return Ok(());
        }
        self.scheduler.at_frame(
            self.frame + 1,
            Continuation::ConfirmDrop {
                state: self.state,
                revision: self.revision.change,
            },
        );
        Ok(())
    }

    /// Move the object instantly, without interpolation on the other peers
    pub fn teleport_to(&mut self, pose: Pose) -> Result<()> {
        if !self.is_local_authority() {
            return Err(SyncError::NotAuthority);
        }
        self.body.set_pose(pose);
        self.body.set_velocity(Vec3::ZERO, Vec3::ZERO);
        self.body.wake();
        self.change_state(MotionState::Teleporting)
    }

    /// Teleport the object back to where it was spawned
    pub fn respawn(&mut self) -> Result<()> {
        self.teleport_to(self.spawn_pose)
    }

    pub fn sleep(&mut self) -> Result<()> {
        self.change_state(MotionState::Sleeping)
    }

    /// Attach the object to one of the local player's bones, or to their playspace if the
    /// avatar doesn't have that bone
    pub fn attach_to_bone(&mut self, bone: Bone) -> Result<()> {
        if !self.is_local_authority() {
            return Err(SyncError::NotAuthority);
        }
        let resolved = compute_parent_frame(
            AttachmentTarget::Bone(bone),
            self.authority.local_peer(),
            self.rig.as_ref(),
        );
        if resolved.fallback {
            debug!(object = ?self.id, ?bone, "bone not available, attaching to the playspace");
            return self.attach_to_playspace();
        }
        self.change_state(MotionState::AttachedToBone(bone))
    }

    pub fn attach_to_playspace(&mut self) -> Result<()> {
        self.change_state(MotionState::AttachedToPlayspace)
    }

    /// Release an attached object into free flight
    pub fn detach(&mut self) -> Result<()> {
        self.change_state(MotionState::Interpolating)
    }

    /// Stop all deferred work and drop the listeners
    pub fn despawn(&mut self) {
        debug!(object = ?self.id, "despawning replicated object");
        self.scheduler.clear();
        self.listeners.clear();
        self.channel.cancel_pending();
        self.window = None;
        self.follow_offset = None;
    }
}
