//! # Smartsync Replication
//!
//! Ownership and snapshot replication for a single networked object.
//!
//! Exactly one peer (the authority) simulates an object and publishes snapshots of it;
//! the [`Authority`](authority::Authority) tracks who that is and mediates transfers, while the
//! [`ReplicationChannel`](channel::ReplicationChannel) handles the publish and receive paths:
//! congestion-aware retries on the sender, stale/duplicate filtering on the receiver.

pub mod authority;
pub mod channel;
pub mod error;
pub mod message;
pub mod revision;
pub mod transport;

/// Commonly used items for replication.
pub mod prelude {
    pub use crate::authority::{Authority, AuthorityChange, TransferOutcome};
    pub use crate::channel::{PublishOutcome, ReceiveOutcome, ReplicationChannel};
    pub use crate::error::ReplicationError;
    pub use crate::message::SnapshotMessage;
    pub use crate::revision::{Revision, RevisionTracker, StateCode};
    pub use crate::transport::Transport;
}
