//! Parent chain (Bitcoin) data structures carried in peg-in witnesses.
//!
//! A peg-in proves that a parent-chain transaction paid to a claim script.
//! The witness carries the full parent transaction and a `gettxoutproof`
//! style inclusion proof: the parent block header and a partial merkle tree
//! linking the transaction to that header.

mod header;
mod merkle;
mod transaction;

#[cfg(any(test, feature = "proptest-impl"))]
pub mod arbitrary;

#[cfg(test)]
mod tests;

pub use header::{BlockHash, Header};
pub use merkle::{MerkleError, PartialMerkleTree, Root, TxOutProof, MAX_TRANSACTIONS_PER_BLOCK};
pub use transaction::{Input, OutPoint, Output, Transaction, Txid};
