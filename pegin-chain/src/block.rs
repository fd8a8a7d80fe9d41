//! Sidechain blocks, as far as peg-in validation needs them.
//!
//! Peg-in rules only depend on the height a transaction is validated at: the
//! height of the block being connected, or the current tip height for the
//! mempool.

mod height;

pub use height::Height;
