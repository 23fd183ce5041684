//! Errors of the state machine
use smartsync_replication::error::ReplicationError;

pub type Result<T> = core::result::Result<T, SyncError>;

#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    #[error("the local peer is not the authority of this object")]
    NotAuthority,
    #[error("custom state {0} is not registered")]
    InvalidCustomState(usize),
    #[error(transparent)]
    CustomState(#[from] CustomStateError),
    #[error(transparent)]
    Serialization(#[from] ReplicationError),
}

/// Error returned by a custom state hook. It is propagated as is out of the tick
/// that triggered the hook.
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub struct CustomStateError(#[from] Box<dyn core::error::Error + Send + Sync>);

impl CustomStateError {
    pub fn new(error: impl Into<Box<dyn core::error::Error + Send + Sync>>) -> Self {
        Self(error.into())
    }
}
