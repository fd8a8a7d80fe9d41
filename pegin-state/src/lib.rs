//! The parent chain view used to validate peg-ins.
//!
//! Peg-in validation needs parent-chain data: block headers, transactions,
//! and the best height. This crate keeps that data in immutable
//! [`ParentChainSnapshot`]s. A single [`ParentChainState`] writer publishes
//! each new snapshot as a whole, and the read-only [`ReadStateService`]
//! answers every request from one snapshot, so a request never sees a
//! partially updated parent chain.

#![warn(missing_docs)]
#![allow(clippy::try_err)]
#![deny(clippy::await_holding_lock)]
#![forbid(unsafe_code)]

mod error;
mod request;
mod response;
mod service;
mod snapshot;


pub use error::{BoxError, StateError};
pub use request::{ClaimLookup, Request};
pub use response::{ClaimData, PeginData, Response};
pub use service::{init, watch_receiver::WatchReceiver, ParentChainState, ReadStateService};
pub use snapshot::{KnownHeader, ParentChainSnapshot};
