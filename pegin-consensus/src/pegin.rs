//! Peg-in rules.
//!
//! A claiming transaction goes through these stages, leaves first:
//!
//! - [`claim`] decodes the peg-in inputs into [`PeginClaim`]s, and
//!   aggregates their values and subsidy floors into a [`ClaimSet`];
//! - [`proof`] checks each claim's parent chain proof, on validating nodes;
//! - [`subsidy`] computes the burn subsidy a set of claims requires;
//! - [`is_subsidy_active`] gates the subsidy by height;
//! - [`check`] runs the acceptance rules in order, and returns the first failure.

pub mod check;
pub mod claim;
pub mod proof;
pub mod subsidy;

mod activation;
mod builder;


pub use activation::is_subsidy_active;
pub use builder::ClaimBuilder;
pub use check::{check_transaction, evaluate, Context, PeginSummary, Verdict};
pub use claim::{ClaimSet, PeginClaim, ResolvedClaim};
pub use proof::VerifiedOutput;
pub use subsidy::{required_subsidy, ProofSource};
