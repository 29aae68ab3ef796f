use thiserror::Error;

use crate::backend::BackendError;

#[derive(Debug, Error)]
pub enum TreeclustError {
    /// Partition vector length or label set does not match the collection.
    #[error("invalid partition: {0}")]
    InvalidPartition(String),

    /// A merge or split that cannot change the cluster count correctly.
    #[error("invalid move: {0}")]
    InvalidMove(String),

    /// External evaluation failed; fatal to the current candidate only.
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("unreadable input {path}: {reason}")]
    BadInput { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TreeclustError>;
