//! Peg-in validation for sidechain claiming transactions.
//!
//! A claiming transaction mints sidechain value by proving that a parent
//! chain output paid to a claim script. This crate decides whether such a
//! transaction is acceptable:
//!
//! 1. the [`pegin`] module holds the rules: decoding and aggregating claims,
//!    verifying their parent chain proofs, computing the burn subsidy that
//!    small peg-ins must pay, and the ordered acceptance checks;
//! 2. the [`transaction`] module wraps the rules in an asynchronous
//!    [`tower::Service`], used by both mempool admission and block connection;
//! 3. [`Config`] holds the chain's peg-in parameters, loaded once at startup.
//!
//! Nodes either validate peg-ins against their own view of the parent chain,
//! or trust the claimed values. Only validating nodes can enforce the minimum
//! peg-in amount and the parent fee rate floor.

#![doc(html_root_url = "https://docs.rs/pegin_consensus")]
#![allow(clippy::try_err)]
#![deny(clippy::await_holding_lock)]
#![forbid(unsafe_code)]

mod config;

pub mod error;
pub mod pegin;
pub mod transaction;

pub use config::{Config, SidechainInfo};
pub use error::{ClaimError, PeginError, ProofError, RejectReason, SubsidyError, TransactionError};
pub use pegin::{evaluate, ClaimBuilder, Context, Verdict};
pub use pegin_state::BoxError;

#[cfg(test)]
mod tests;
