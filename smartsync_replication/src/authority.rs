//! Module related to the concept of `Authority`
//!
//! A peer is said to have authority over an object if it is responsible for simulating it.
//! That peer is the only one allowed to change the state of the object or to publish snapshots;
//! every other peer only interpolates towards what the authority publishes.
//!
//! Authority changes hands in two ways:
//! - explicitly: a peer requests it ([`Authority::request_transfer`]) and broadcasts the new owner,
//!   the other peers apply it with [`Authority::on_external_transfer`]
//! - implicitly: the owner disconnects, and we adopt whatever the host's authority directory reports
//!   ([`Authority::on_peer_left`])
use crate::transport::Transport;
use std::sync::Arc;
use smartsync_core::host::IdentityProvider;
use smartsync_core::id::{ObjectId, PeerId};
#[allow(unused_imports)]
use tracing::{debug, info, trace};

/// The authority of one replicated object, as seen from the local peer
#[derive(Clone)]
pub struct Authority {
    owner: PeerId,
    identity: Arc<dyn IdentityProvider>,
}

impl core::fmt::Debug for Authority {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Authority")
            .field("owner", &self.owner)
            .field("local", &self.identity.local_peer())
            .finish()
    }
}

/// A change of owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorityChange {
    pub old: PeerId,
    pub new: PeerId,
    pub local: PeerId,
}

impl AuthorityChange {
    /// The local peer just became the authority
    pub fn gained(&self) -> bool {
        self.new == self.local && self.old != self.local
    }

    /// The local peer just stopped being the authority
    pub fn lost(&self) -> bool {
        self.old == self.local && self.new != self.local
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The local peer already has authority, nothing was sent
    AlreadyOwner,
    /// The transport is congested and the request was low-priority, nothing was sent
    Deferred,
    Transferred(AuthorityChange),
}

impl Authority {
    pub fn new(owner: PeerId, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { owner, identity }
    }

    pub fn owner(&self) -> PeerId {
        self.owner
    }

    pub fn local_peer(&self) -> PeerId {
        self.identity.local_peer()
    }

    pub fn is_local_authority(&self) -> bool {
        self.owner == self.identity.local_peer()
    }

    /// Request authority over `object` for the local peer.
    ///
    /// Low-priority requests (`check_congestion`) are silently dropped while the transport is
    /// congested so that they don't add to the congestion. Explicit requests (pickup, API call)
    /// always go through.
    pub fn request_transfer(
        &mut self,
        object: ObjectId,
        check_congestion: bool,
        transport: &mut dyn Transport,
    ) -> TransferOutcome {
        if self.is_local_authority() {
            return TransferOutcome::AlreadyOwner;
        }
        if check_congestion && transport.is_congested() {
            trace!(?object, "transport congested, skipping authority request");
            return TransferOutcome::Deferred;
        }
        let local = self.identity.local_peer();
        transport.broadcast_authority(object, local);
        let change = self.set_owner(local);
        debug!(?object, old = ?change.old, "taking authority");
        TransferOutcome::Transferred(change)
    }

    /// Apply a transfer that was broadcast by another peer
    pub fn on_external_transfer(&mut self, new_owner: PeerId) -> Option<AuthorityChange> {
        if new_owner == self.owner {
            return None;
        }
        Some(self.set_owner(new_owner))
    }

    /// A peer disconnected. If it was the authority, adopt the owner reported by the host.
    pub fn on_peer_left(&mut self, object: ObjectId, peer: PeerId) -> Option<AuthorityChange> {
        if peer != self.owner {
            return None;
        }
        let Some(observed) = self.identity.observed_authority(object) else {
            debug!(?object, ?peer, "authority left but the host reports no new owner");
            return None;
        };
        if observed == peer {
            return None;
        }
        info!(?object, ?peer, new = ?observed, "authority left, adopting observed authority");
        self.on_external_transfer(observed)
    }

    fn set_owner(&mut self, new: PeerId) -> AuthorityChange {
        let change = AuthorityChange {
            old: self.owner,
            new,
            local: self.identity.local_peer(),
        };
        self.owner = new;
        change
    }
}
