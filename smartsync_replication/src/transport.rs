use crate::message::SnapshotMessage;
use core::time::Duration;
use smartsync_core::id::{ObjectId, PeerId};

/// The network layer used by a replicated object.
///
/// Sends are fire-and-forget: the result of a publish is delivered back asynchronously
/// through `ReplicatedObject::on_publish_succeeded` / `on_publish_failed`, inbound snapshots
/// through `on_receive`.
pub trait Transport: Send + Sync {
    /// True while the transport would reject or delay new sends
    fn is_congested(&self) -> bool;

    /// Estimated one-way latency (local time minus remote simulation time)
    fn lag_estimate(&self) -> Duration;

    fn request_serialize(&mut self, message: SnapshotMessage);

    /// Ask the authority of `object` to publish its latest state
    fn send_resync_request(&mut self, object: ObjectId);

    /// Tell every peer that `owner` is now the authority of `object`
    fn broadcast_authority(&mut self, object: ObjectId, owner: PeerId);
}
