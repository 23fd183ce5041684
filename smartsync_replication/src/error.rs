//! Replication-related errors

pub type Result<T> = core::result::Result<T, ReplicationError>;

#[derive(thiserror::Error, Debug)]
pub enum ReplicationError {
    #[error("could not encode snapshot message: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("could not decode snapshot message: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("snapshot message has {0} trailing bytes")]
    TrailingBytes(usize),
}
