//! Sidechain transactions that claim peg-ins.
//!
//! A claiming transaction mixes ordinary [`Input::PrevOut`] spends with
//! [`Input::PegIn`] claims of parent-chain outputs. Peg-in value is minted by
//! the claim, so the transaction's outputs are funded by the claimed parent
//! outputs plus any spent sidechain outputs.

use std::fmt;

use crate::{
    amount::{self, Amount, NonNegative},
    parent,
    serialization::{sha256d, ConsensusSerialize},
};

mod input;
mod output;
mod pegin;
mod serialize;


pub use input::{Input, OutPoint, OUTPOINT_ISSUANCE_FLAG, OUTPOINT_PEGIN_FLAG};
pub use output::{AssetId, Output, OutputKind};
pub use pegin::{ParentProof, PeginWitness, PeginWitnessError};

/// A sidechain transaction hash: the SHA-256d hash of the transaction
/// without its witnesses.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[cfg_attr(
    any(test, feature = "proptest-impl"),
    derive(proptest_derive::Arbitrary)
)]
pub struct Hash(pub [u8; 32]);

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        sha256d::fmt_reversed_hex(&self.0, f)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("transaction::Hash")
            .field(&self.to_string())
            .finish()
    }
}

impl std::str::FromStr for Hash {
    type Err = crate::serialization::SerializationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        sha256d::parse_reversed_hex(s)
            .map(Hash)
            .ok_or(crate::serialization::SerializationError::Parse(
                "transaction hash hex decoding error",
            ))
    }
}

/// A sidechain transaction.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The transaction version.
    pub version: i32,

    /// The transaction inputs: ordinary spends and peg-in claims.
    pub inputs: Vec<Input>,

    /// The transaction outputs.
    pub outputs: Vec<Output>,

    /// The earliest time or height this transaction can be mined at.
    pub lock_time: u32,
}

impl Transaction {
    /// Returns this transaction's hash.
    pub fn hash(&self) -> Hash {
        let mut hash_writer = sha256d::Writer::default();
        self.serialize_without_witness(&mut hash_writer)
            .expect("Sha256dWriter is infallible");
        Hash(hash_writer.finish())
    }

    /// Returns true if this transaction has any peg-in inputs.
    pub fn has_pegins(&self) -> bool {
        self.inputs.iter().any(Input::is_pegin)
    }

    /// Iterates over the parent outpoints claimed by this transaction, and
    /// their raw peg-in witness stacks, in input order.
    pub fn pegin_inputs(&self) -> impl Iterator<Item = (usize, parent::OutPoint, &[Vec<u8>])> {
        self.inputs
            .iter()
            .enumerate()
            .filter_map(|(index, input)| match input {
                Input::PegIn {
                    outpoint,
                    pegin_witness,
                    ..
                } => Some((index, *outpoint, pegin_witness.as_slice())),
                Input::PrevOut { .. } => None,
            })
    }

    /// Returns true if any input has witness data.
    pub fn has_witness(&self) -> bool {
        self.inputs.iter().any(Input::has_witness)
    }

    /// Iterates over the outputs of `kind`.
    pub fn outputs_of_kind(&self, kind: OutputKind) -> impl Iterator<Item = &Output> {
        self.outputs
            .iter()
            .filter(move |output| output.kind() == kind)
    }

    /// Returns the sum of the values of the outputs of `kind`.
    pub fn output_value_of_kind(
        &self,
        kind: OutputKind,
    ) -> Result<Amount<NonNegative>, amount::Error> {
        self.outputs_of_kind(kind).map(|output| output.value).sum()
    }

    /// Returns the sum of all output values.
    pub fn total_output_value(&self) -> Result<Amount<NonNegative>, amount::Error> {
        self.outputs.iter().map(|output| output.value).sum()
    }

    /// Returns the size of the transaction without witness data, in bytes.
    pub fn base_size(&self) -> usize {
        let mut bytes = Vec::new();
        self.serialize_without_witness(&mut bytes)
            .expect("vec writes are infallible");
        bytes.len()
    }

    /// Returns the weight of this transaction: three times the base size plus
    /// the total size.
    pub fn weight(&self) -> u64 {
        3 * self.base_size() as u64 + self.serialized_size() as u64
    }

    /// Returns the virtual size of this transaction, rounded up.
    pub fn vsize(&self) -> u64 {
        self.weight().div_ceil(4)
    }
}
