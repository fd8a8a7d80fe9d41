//! Consensus-critical serialization.
//!
//! This module contains four traits: `ConsensusSerialize` and
//! `ConsensusDeserialize`, analogs of the Serde `Serialize` and `Deserialize`
//! traits but intended for the consensus-critical formats of the sidechain and
//! its parent chain, and `WriteConsensusExt` and `ReadConsensusExt`, extension
//! traits for `io::Read` and `io::Write` with utility functions for reading and
//! writing data (e.g., the Bitcoin variable-integer format).

mod consensus_deserialize;
mod consensus_serialize;
mod error;
mod read_ext;
mod write_ext;

pub mod sha256d;

#[cfg(test)]
mod tests;

pub use consensus_deserialize::{
    consensus_deserialize_bytes_external_count, ConsensusDeserialize, ConsensusDeserializeInto,
    TrustedPreallocate,
};
pub use consensus_serialize::{
    compactsize_len, consensus_serialize_bytes, ConsensusSerialize, MAX_PROTOCOL_MESSAGE_LEN,
};
pub use error::SerializationError;
pub use read_ext::ReadConsensusExt;
pub use write_ext::WriteConsensusExt;
