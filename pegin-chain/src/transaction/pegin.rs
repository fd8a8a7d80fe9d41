//! Peg-in witness stacks.
//!
//! Each peg-in input carries a witness stack describing the parent-chain
//! output it claims:
//!
//! | item | contents |
//! | ---- | -------- |
//! | 0 | claimed value, 8 bytes little-endian |
//! | 1 | asset id, 32 bytes |
//! | 2 | parent chain genesis block hash, 32 bytes |
//! | 3 | claim script |
//! | 4 | serialized parent transaction |
//! | 5 | serialized `gettxoutproof` inclusion proof |
//!
//! Nodes that don't validate peg-ins only use the first four items.

use thiserror::Error;

use crate::{
    amount::{self, Amount, NonNegative},
    parent,
    script::Script,
    serialization::{ConsensusDeserialize, ConsensusSerialize, SerializationError},
};

use super::AssetId;

/// The number of items in a peg-in witness without proof material.
const CLAIM_ITEMS: usize = 4;

/// The number of items in a complete peg-in witness.
const FULL_ITEMS: usize = 6;

/// A peg-in witness stack that couldn't be decoded.
#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum PeginWitnessError {
    #[error("peg-in witness has {0} items, expected 4 or 6")]
    WrongItemCount(usize),

    #[error("peg-in witness value must be 8 bytes, got {0}")]
    ValueLength(usize),

    #[error("peg-in witness value is out of range: {0}")]
    ValueRange(#[from] amount::Error),

    #[error("peg-in witness asset must be 32 bytes, got {0}")]
    AssetLength(usize),

    #[error("peg-in witness genesis hash must be 32 bytes, got {0}")]
    GenesisHashLength(usize),

    #[error("peg-in witness parent transaction is malformed: {0}")]
    ParentTransaction(#[source] SerializationError),

    #[error("peg-in witness inclusion proof is malformed: {0}")]
    Proof(#[source] SerializationError),
}

/// The parent-chain material that lets a validating node check a peg-in.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ParentProof {
    /// The parent transaction that created the claimed output.
    pub transaction: parent::Transaction,

    /// The proof that `transaction` is in a parent block.
    pub proof: parent::TxOutProof,
}

/// A decoded peg-in witness.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PeginWitness {
    /// The value the claimer asserts the parent output holds.
    pub value: Amount<NonNegative>,

    /// The sidechain asset the peg-in mints.
    pub asset: AssetId,

    /// The genesis block hash of the parent chain.
    pub genesis_hash: parent::BlockHash,

    /// The script the claimed parent output must pay to.
    pub claim_script: Script,

    /// The parent transaction and its inclusion proof, if the witness has them.
    pub parent: Option<ParentProof>,
}

impl PeginWitness {
    /// Decodes a peg-in witness stack.
    ///
    /// Stacks with four items have no [`ParentProof`].
    pub fn from_stack(stack: &[Vec<u8>]) -> Result<Self, PeginWitnessError> {
        if stack.len() != CLAIM_ITEMS && stack.len() != FULL_ITEMS {
            return Err(PeginWitnessError::WrongItemCount(stack.len()));
        }

        let value: [u8; 8] = stack[0]
            .as_slice()
            .try_into()
            .map_err(|_| PeginWitnessError::ValueLength(stack[0].len()))?;
        let value = i64::from_le_bytes(value).try_into()?;

        let asset = stack[1]
            .as_slice()
            .try_into()
            .map(AssetId)
            .map_err(|_| PeginWitnessError::AssetLength(stack[1].len()))?;

        let genesis_hash = stack[2]
            .as_slice()
            .try_into()
            .map(parent::BlockHash)
            .map_err(|_| PeginWitnessError::GenesisHashLength(stack[2].len()))?;

        let claim_script = Script::new(&stack[3]);

        let parent = if stack.len() == FULL_ITEMS {
            Some(ParentProof {
                transaction: parent::Transaction::consensus_deserialize_exact(&stack[4])
                    .map_err(PeginWitnessError::ParentTransaction)?,
                proof: parent::TxOutProof::consensus_deserialize_exact(&stack[5])
                    .map_err(PeginWitnessError::Proof)?,
            })
        } else {
            None
        };

        Ok(PeginWitness {
            value,
            asset,
            genesis_hash,
            claim_script,
            parent,
        })
    }

    /// Encodes this witness as a witness stack.
    pub fn to_stack(&self) -> Vec<Vec<u8>> {
        let mut stack = vec![
            i64::from(self.value).to_le_bytes().to_vec(),
            self.asset.0.to_vec(),
            self.genesis_hash.0.to_vec(),
            self.claim_script.as_raw_bytes().to_vec(),
        ];

        if let Some(parent) = &self.parent {
            stack.push(
                parent
                    .transaction
                    .consensus_serialize_to_vec()
                    .expect("vec writes are infallible"),
            );
            stack.push(
                parent
                    .proof
                    .consensus_serialize_to_vec()
                    .expect("vec writes are infallible"),
            );
        }

        stack
    }
}
