//! The snapshot message published by the authority of an object
use crate::error::{ReplicationError, Result};
use crate::revision::Revision;
use core::time::Duration;
use serde::{Deserialize, Serialize};
use smartsync_core::frame::Snapshot;
use smartsync_core::id::ObjectId;
use smartsync_core::state::MotionState;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMessage {
    pub object: ObjectId,
    pub state: MotionState,
    pub revision: Revision,
    /// Sender's clock when the snapshot was taken
    pub sent_at: Duration,
    /// Pose and velocities, expressed in the parent frame of `state`
    pub snapshot: Snapshot,
}

impl SnapshotMessage {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serde::encode_to_vec(
            self,
            bincode::config::standard(),
        )?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (message, read): (Self, usize) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
        if read != bytes.len() {
            return Err(ReplicationError::TrailingBytes(bytes.len() - read));
        }
        Ok(message)
    }
}
