//! Identifiers for peers and replicated objects
use core::fmt::Formatter;
use serde::{Deserialize, Serialize};

/// Identifies a peer of the session (a player's machine)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeerId(pub u64);

impl core::fmt::Display for PeerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "Peer({})", self.0)
    }
}

/// Identifies a replicated object; the same id refers to the same object on every peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl core::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "Object({})", self.0)
    }
}
