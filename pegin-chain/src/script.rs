//! Bitcoin-style scripts, as used by both chains.
//!
//! Peg-in validation never executes scripts. It only needs to compare them,
//! classify outputs, and size them for dust checks.

#![allow(clippy::unit_arg)]

use std::{fmt, io};

use crate::serialization::{
    consensus_serialize_bytes, ConsensusDeserialize, ConsensusSerialize, SerializationError,
};

/// `OP_0`, also used as the witness version 0 marker.
pub const OP_0: u8 = 0x00;

/// `OP_1`, the witness version 1 marker.
pub const OP_1: u8 = 0x51;

/// `OP_16`, the highest witness version marker.
pub const OP_16: u8 = 0x60;

/// `OP_RETURN`: outputs starting with it are provably unspendable.
pub const OP_RETURN: u8 = 0x6a;

/// An encoding of a Bitcoin script.
#[derive(Clone, Default, Eq, PartialEq, Serialize, Deserialize, Hash)]
#[cfg_attr(
    any(test, feature = "proptest-impl"),
    derive(proptest_derive::Arbitrary)
)]
pub struct Script(Vec<u8>);

impl Script {
    /// Create a new Bitcoin script from its raw bytes.
    /// The raw bytes must not contain the length prefix.
    pub fn new(raw_bytes: &[u8]) -> Self {
        Script(raw_bytes.to_vec())
    }

    /// The script of a burn output: a bare `OP_RETURN`.
    pub fn burn() -> Self {
        Script(vec![OP_RETURN])
    }

    /// Return the raw bytes of the script without the length prefix.
    ///
    /// # Correctness
    ///
    /// These raw bytes do not have a length prefix.
    /// The consensus serialization format requires a length prefix; use `consensus_serialize`
    /// and `consensus_deserialize` to create byte data with a length prefix.
    pub fn as_raw_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns true if this script has no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if this script starts with `OP_RETURN`, so its output can
    /// never be spent.
    pub fn is_op_return(&self) -> bool {
        self.0.first() == Some(&OP_RETURN)
    }

    /// Returns true if this script is a segwit witness program: a version
    /// opcode followed by a single push of 2 to 40 bytes.
    pub fn is_witness_program(&self) -> bool {
        let bytes = &self.0;

        if !(4..=42).contains(&bytes.len()) {
            return false;
        }
        if bytes[0] != OP_0 && !(OP_1..=OP_16).contains(&bytes[0]) {
            return false;
        }

        usize::from(bytes[1]) + 2 == bytes.len()
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Script")
            .field(&hex::encode(&self.0))
            .finish()
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl std::str::FromStr for Script {
    type Err = SerializationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex::decode(s)
            .map(Script)
            .map_err(|_| SerializationError::Parse("script hex decoding error"))
    }
}

impl ConsensusSerialize for Script {
    fn consensus_serialize<W: io::Write>(&self, writer: W) -> Result<(), io::Error> {
        consensus_serialize_bytes(&self.0, writer)
    }
}

impl ConsensusDeserialize for Script {
    fn consensus_deserialize<R: io::Read>(reader: R) -> Result<Self, SerializationError> {
        Ok(Script(Vec::consensus_deserialize(reader)?))
    }
}
