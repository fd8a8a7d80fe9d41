use std::io;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::{
    parent,
    script::Script,
    serialization::{
        ConsensusDeserialize, ConsensusSerialize, ReadConsensusExt, SerializationError,
        TrustedPreallocate, WriteConsensusExt, MAX_PROTOCOL_MESSAGE_LEN,
    },
};

use super::Hash;

/// Set in a serialized outpoint index when the input claims a peg-in.
pub const OUTPOINT_PEGIN_FLAG: u32 = 1 << 30;

/// Set in a serialized outpoint index when the input issues an asset.
pub const OUTPOINT_ISSUANCE_FLAG: u32 = 1 << 31;

/// The index of a null outpoint, which never carries flags.
const NULL_INDEX: u32 = u32::MAX;

/// A reference to an output of a sidechain transaction.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[cfg_attr(
    any(test, feature = "proptest-impl"),
    derive(proptest_derive::Arbitrary)
)]
pub struct OutPoint {
    /// The transaction that created the output.
    pub hash: Hash,

    /// The index of the output in that transaction.
    pub index: u32,
}

/// A sidechain transaction input.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Input {
    /// Spends a sidechain output.
    PrevOut {
        /// The spent output.
        outpoint: OutPoint,
        /// The script that satisfies the spent output's lock script.
        unlock_script: Script,
        /// The sequence number.
        sequence: u32,
        /// The script witness stack.
        witness: Vec<Vec<u8>>,
    },

    /// Claims a parent-chain output.
    PegIn {
        /// The claimed parent-chain output.
        outpoint: parent::OutPoint,
        /// The script that satisfies the claim script.
        unlock_script: Script,
        /// The sequence number.
        sequence: u32,
        /// The script witness stack.
        witness: Vec<Vec<u8>>,
        /// The peg-in witness stack, see [`PeginWitness`](super::PeginWitness).
        pegin_witness: Vec<Vec<u8>>,
    },
}

impl Input {
    /// Returns true if this input claims a peg-in.
    pub fn is_pegin(&self) -> bool {
        matches!(self, Input::PegIn { .. })
    }

    /// Returns true if this input has any witness data.
    pub fn has_witness(&self) -> bool {
        match self {
            Input::PrevOut { witness, .. } => !witness.is_empty(),
            Input::PegIn {
                witness,
                pegin_witness,
                ..
            } => !witness.is_empty() || !pegin_witness.is_empty(),
        }
    }

    /// Returns the input's script witness stack.
    pub fn witness(&self) -> &[Vec<u8>] {
        match self {
            Input::PrevOut { witness, .. } | Input::PegIn { witness, .. } => witness,
        }
    }

    /// Returns the input's peg-in witness stack, which is empty for ordinary spends.
    pub fn pegin_witness(&self) -> &[Vec<u8>] {
        match self {
            Input::PrevOut { .. } => &[],
            Input::PegIn { pegin_witness, .. } => pegin_witness,
        }
    }

    /// Attaches witnesses read after the transaction's lock time.
    pub(super) fn set_witnesses(
        &mut self,
        script_witness: Vec<Vec<u8>>,
        stack: Vec<Vec<u8>>,
    ) -> Result<(), SerializationError> {
        match self {
            Input::PrevOut { witness, .. } => {
                if !stack.is_empty() {
                    return Err(SerializationError::Parse(
                        "peg-in witness on an input that is not a peg-in",
                    ));
                }
                *witness = script_witness;
            }
            Input::PegIn {
                witness,
                pegin_witness,
                ..
            } => {
                *witness = script_witness;
                *pegin_witness = stack;
            }
        }

        Ok(())
    }
}

/// Serializes the input without its witnesses, which are written after the lock time.
impl ConsensusSerialize for Input {
    fn consensus_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        let (hash, index, unlock_script, sequence) = match self {
            Input::PrevOut {
                outpoint,
                unlock_script,
                sequence,
                ..
            } => (outpoint.hash.0, outpoint.index, unlock_script, sequence),
            Input::PegIn {
                outpoint,
                unlock_script,
                sequence,
                ..
            } => (
                outpoint.hash.0,
                outpoint.index | OUTPOINT_PEGIN_FLAG,
                unlock_script,
                sequence,
            ),
        };

        writer.write_32_bytes(&hash)?;
        writer.write_u32::<LittleEndian>(index)?;
        unlock_script.consensus_serialize(&mut writer)?;
        writer.write_u32::<LittleEndian>(*sequence)
    }
}

impl ConsensusDeserialize for Input {
    fn consensus_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        let hash = reader.read_32_bytes()?;
        let index = reader.read_u32::<LittleEndian>()?;
        let unlock_script = Script::consensus_deserialize(&mut reader)?;
        let sequence = reader.read_u32::<LittleEndian>()?;

        if index == NULL_INDEX {
            return Ok(Input::PrevOut {
                outpoint: OutPoint {
                    hash: Hash(hash),
                    index,
                },
                unlock_script,
                sequence,
                witness: Vec::new(),
            });
        }

        if index & OUTPOINT_ISSUANCE_FLAG != 0 {
            return Err(SerializationError::Parse("asset issuance inputs are not supported"));
        }

        if index & OUTPOINT_PEGIN_FLAG != 0 {
            Ok(Input::PegIn {
                outpoint: parent::OutPoint {
                    hash: parent::Txid(hash),
                    index: index & !OUTPOINT_PEGIN_FLAG,
                },
                unlock_script,
                sequence,
                witness: Vec::new(),
                pegin_witness: Vec::new(),
            })
        } else {
            Ok(Input::PrevOut {
                outpoint: OutPoint {
                    hash: Hash(hash),
                    index,
                },
                unlock_script,
                sequence,
                witness: Vec::new(),
            })
        }
    }
}

impl TrustedPreallocate for Input {
    fn max_allocation() -> u64 {
        // outpoint, empty script length, sequence
        (MAX_PROTOCOL_MESSAGE_LEN / (32 + 4 + 1 + 4)) as u64
    }
}
