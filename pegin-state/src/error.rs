//! Error types for the parent chain view.

use thiserror::Error;

use pegin_chain::parent;

/// A boxed [`std::error::Error`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An error describing why a parent chain update was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The block doesn't extend the current tip.
    #[error("block {hash} does not extend the parent chain tip {tip:?}")]
    NotAChild {
        /// The rejected block's hash.
        hash: parent::BlockHash,
        /// The current tip hash.
        tip: Option<parent::BlockHash>,
    },

    /// The block is already in the parent chain.
    #[error("block {0} is already in the parent chain")]
    Duplicate(parent::BlockHash),

    /// A block's transactions don't hash to its merkle root.
    #[error("block {0} transactions do not match its merkle root")]
    BadMerkleRoot(parent::BlockHash),

    /// The parent chain is shorter than the requested rollback.
    #[error("cannot roll back to height {requested}: the parent chain starts at height {start}")]
    RollbackTooDeep {
        /// The requested new tip height.
        requested: u32,
        /// The height of the first block.
        start: u32,
    },
}
