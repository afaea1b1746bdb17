use thiserror::Error;

use crate::QuorumId;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AssignmentError {
    #[error("missing parameters")]
    MissingParameters,

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("no operators for quorum {0}")]
    NoOperators(QuorumId),

    #[error("too many operators ({num_operators}) to get assignments: max number of operators is {max}")]
    TooManyOperators { num_operators: usize, max: u32 },

    /// Every operator is owed at least one chunk.
    #[error("{num_chunks} chunks cannot cover {num_operators} operators")]
    InsufficientChunks { num_chunks: u32, num_operators: usize },

    #[error("missing total stake for quorum {0}")]
    MissingTotalStake(QuorumId),

    #[error("total chunks {total} exceeds capacity {capacity}")]
    ChunksExceedCapacity { total: u64, capacity: u32 },

    #[error("blob length {0} is not a nonzero power of 2")]
    InvalidBlobLength(u32),

    #[error("not found")]
    NotFound,

    #[error("operator state unavailable: {0}")]
    StateUnavailable(String),
}
