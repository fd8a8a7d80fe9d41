//! Core data structures for validating sidechain peg-ins.
//!
//! This crate holds the sidechain's claiming transaction format, the
//! parent-chain (Bitcoin) transaction, header and inclusion-proof formats
//! that peg-in witnesses carry, and the strongly-typed amounts and fee rates
//! that every peg-in rule is expressed in.

#![doc(html_root_url = "https://docs.rs/pegin_chain")]
// Standard lints
#![warn(missing_docs)]
#![allow(clippy::try_err)]
#![deny(clippy::await_holding_lock)]
#![forbid(unsafe_code)]

#[macro_use]
extern crate serde;

pub mod amount;
pub mod block;
pub mod fee_rate;
pub mod parent;
pub mod script;
pub mod serialization;
pub mod transaction;

pub use fee_rate::FeeRate;
