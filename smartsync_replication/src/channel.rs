//! Publish and receive paths of a replicated object
use crate::message::SnapshotMessage;
use crate::revision::{Revision, RevisionTracker};
use crate::transport::Transport;
use core::time::Duration;
use rand::Rng;
use smartsync_core::time::elapsed;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The serialize request was handed to the transport
    Sent,
    /// The transport is congested; the publish is pending and should be retried
    Deferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveOutcome {
    Apply,
    /// Older than (or equal to) an update we already applied
    Stale,
    /// We are the authority of this object: remote snapshots are ignored
    Ignored,
}

/// Replication bookkeeping for one object.
///
/// `pending_publish` is only ever set while the local peer owns the object: it is cleared
/// when a publish goes through, and cancelled when authority is lost.
#[derive(Debug, Clone, Default)]
pub struct ReplicationChannel {
    pending_publish: bool,
    last_publish_time: Option<Duration>,
    received_any: bool,
    tracker: RevisionTracker,
    published: u32,
    received: u32,
}

impl ReplicationChannel {
    pub fn pending_publish(&self) -> bool {
        self.pending_publish
    }

    pub fn last_publish_time(&self) -> Option<Duration> {
        self.last_publish_time
    }

    /// True once at least one snapshot was accepted from the authority
    pub fn has_received(&self) -> bool {
        self.received_any
    }

    /// Latest revision applied or published locally
    pub fn last_revision(&self) -> Option<Revision> {
        self.tracker.last()
    }

    /// Number of serialize requests handed to the transport
    pub fn published(&self) -> u32 {
        self.published
    }

    /// Number of remote snapshots that were applied
    pub fn received(&self) -> u32 {
        self.received
    }

    /// Hand a snapshot to the transport, unless it is congested in which case the publish
    /// is marked as pending.
    pub fn publish(
        &mut self,
        now: Duration,
        message: SnapshotMessage,
        transport: &mut dyn Transport,
    ) -> PublishOutcome {
        if transport.is_congested() {
            debug!(object = ?message.object, revision = ?message.revision, "transport congested, deferring publish");
            self.pending_publish = true;
            return PublishOutcome::Deferred;
        }
        trace!(object = ?message.object, state = ?message.state, revision = ?message.revision, "publishing snapshot");
        self.tracker.observe(message.revision);
        self.last_publish_time = Some(now);
        self.published += 1;
        transport.request_serialize(message);
        PublishOutcome::Sent
    }

    pub fn on_publish_succeeded(&mut self) {
        self.pending_publish = false;
    }

    pub fn on_publish_failed(&mut self) {
        self.pending_publish = true;
    }

    /// Drop the pending publish (after losing authority). Returns true if one was pending.
    pub fn cancel_pending(&mut self) -> bool {
        core::mem::take(&mut self.pending_publish)
    }

    /// Filter an inbound snapshot
    pub fn on_receive(&mut self, message: &SnapshotMessage, is_authority: bool) -> ReceiveOutcome {
        if is_authority {
            trace!(object = ?message.object, "ignoring snapshot: we are the authority");
            return ReceiveOutcome::Ignored;
        }
        if !self.tracker.accept(message.revision) {
            debug!(
                object = ?message.object,
                revision = ?message.revision,
                last = ?self.tracker.last(),
                "dropping stale snapshot"
            );
            return ReceiveOutcome::Stale;
        }
        self.received_any = true;
        self.received += 1;
        ReceiveOutcome::Apply
    }

    /// True if the authority should republish because `interval` elapsed since the last publish
    pub fn is_publish_due(&self, now: Duration, interval: Duration) -> bool {
        self.last_publish_time
            .is_none_or(|last| elapsed(last, now) >= interval)
    }

    /// Delay before asking the authority for a resync: `2 * lag + random[0, 1)` seconds.
    ///
    /// The random part spreads the requests of many objects spawned at the same time.
    pub fn resync_delay(lag: Duration, rng: &mut impl Rng) -> Duration {
        lag * 2 + Duration::from_secs_f32(rng.random::<f32>())
    }

    /// Delay before retrying a rejected publish: one physics step plus a random jitter
    pub fn retry_delay(fixed_timestep: Duration, jitter: Duration, rng: &mut impl Rng) -> Duration {
        fixed_timestep + jitter.mul_f32(rng.random::<f32>())
    }
}
