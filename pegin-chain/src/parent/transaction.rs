use std::{fmt, io};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::{
    amount::{self, Amount, NonNegative},
    script::Script,
    serialization::{
        consensus_serialize_bytes, sha256d, ConsensusDeserialize, ConsensusSerialize,
        ReadConsensusExt, SerializationError, TrustedPreallocate, WriteConsensusExt,
        MAX_PROTOCOL_MESSAGE_LEN,
    },
};

/// The segwit marker byte, in place of an empty input count.
const SEGWIT_MARKER: u8 = 0x00;

/// The only defined segwit flag.
const SEGWIT_FLAG: u8 = 0x01;

/// A parent-chain transaction identifier: the SHA-256d hash of the
/// transaction without its witnesses.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[cfg_attr(
    any(test, feature = "proptest-impl"),
    derive(proptest_derive::Arbitrary)
)]
pub struct Txid(pub [u8; 32]);

impl fmt::Display for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        sha256d::fmt_reversed_hex(&self.0, f)
    }
}

impl fmt::Debug for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("parent::Txid").field(&self.to_string()).finish()
    }
}

impl std::str::FromStr for Txid {
    type Err = SerializationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        sha256d::parse_reversed_hex(s)
            .map(Txid)
            .ok_or(SerializationError::Parse("txid hex decoding error"))
    }
}

/// A reference to an output of a parent-chain transaction.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[cfg_attr(
    any(test, feature = "proptest-impl"),
    derive(proptest_derive::Arbitrary)
)]
pub struct OutPoint {
    /// The transaction that created the output.
    pub hash: Txid,

    /// The index of the output in that transaction.
    pub index: u32,
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hash, self.index)
    }
}

/// A parent-chain transaction input.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Input {
    /// The output this input spends.
    pub previous_output: OutPoint,

    /// The script that satisfies the spent output's lock script.
    pub unlock_script: Script,

    /// The sequence number.
    pub sequence: u32,

    /// The segwit witness stack, empty for legacy spends.
    pub witness: Vec<Vec<u8>>,
}

/// A parent-chain transaction output.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Output {
    /// The output value.
    pub value: Amount<NonNegative>,

    /// The script the spender must satisfy.
    pub lock_script: Script,
}

/// A parent-chain transaction, in the Bitcoin format with optional segwit data.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The transaction version.
    pub version: i32,

    /// The transaction inputs.
    pub inputs: Vec<Input>,

    /// The transaction outputs.
    pub outputs: Vec<Output>,

    /// The earliest time or height this transaction can be mined at.
    pub lock_time: u32,
}

impl Transaction {
    /// Returns the transaction's identifier.
    pub fn txid(&self) -> Txid {
        let mut hash_writer = sha256d::Writer::default();
        self.serialize_without_witness(&mut hash_writer)
            .expect("Sha256dWriter is infallible");
        Txid(hash_writer.finish())
    }

    /// Returns true if any input has witness data.
    pub fn has_witness(&self) -> bool {
        self.inputs.iter().any(|input| !input.witness.is_empty())
    }

    /// Returns the output at `index`, if there is one.
    pub fn output(&self, index: u32) -> Option<&Output> {
        self.outputs.get(usize::try_from(index).ok()?)
    }

    /// Returns the sum of all output values.
    pub fn total_output_value(&self) -> Result<Amount<NonNegative>, amount::Error> {
        self.outputs.iter().map(|output| output.value).sum()
    }

    /// Returns the size of the transaction without witness data, in bytes.
    pub fn base_size(&self) -> usize {
        let mut counter = Vec::new();
        self.serialize_without_witness(&mut counter)
            .expect("vec writes are infallible");
        counter.len()
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

    fn serialize_without_witness<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        writer.write_i32::<LittleEndian>(self.version)?;
        self.inputs.consensus_serialize(&mut writer)?;
        self.outputs.consensus_serialize(&mut writer)?;
        writer.write_u32::<LittleEndian>(self.lock_time)
    }
}

impl ConsensusSerialize for OutPoint {
    fn consensus_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        writer.write_32_bytes(&self.hash.0)?;
        writer.write_u32::<LittleEndian>(self.index)
    }
}

impl ConsensusDeserialize for OutPoint {
    fn consensus_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        Ok(OutPoint {
            hash: Txid(reader.read_32_bytes()?),
            index: reader.read_u32::<LittleEndian>()?,
        })
    }
}

/// Serializes the input without its witness, which is written after all the outputs.
impl ConsensusSerialize for Input {
    fn consensus_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        self.previous_output.consensus_serialize(&mut writer)?;
        self.unlock_script.consensus_serialize(&mut writer)?;
        writer.write_u32::<LittleEndian>(self.sequence)
    }
}

impl ConsensusDeserialize for Input {
    fn consensus_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        Ok(Input {
            previous_output: OutPoint::consensus_deserialize(&mut reader)?,
            unlock_script: Script::consensus_deserialize(&mut reader)?,
            sequence: reader.read_u32::<LittleEndian>()?,
            witness: Vec::new(),
        })
    }
}

impl TrustedPreallocate for Input {
    fn max_allocation() -> u64 {
        // outpoint, empty script length, sequence
        (MAX_PROTOCOL_MESSAGE_LEN / (32 + 4 + 1 + 4)) as u64
    }
}

impl ConsensusSerialize for Output {
    fn consensus_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        self.value.consensus_serialize(&mut writer)?;
        self.lock_script.consensus_serialize(&mut writer)
    }
}

impl ConsensusDeserialize for Output {
    fn consensus_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        Ok(Output {
            value: Amount::consensus_deserialize(&mut reader)?,
            lock_script: Script::consensus_deserialize(&mut reader)?,
        })
    }
}

impl TrustedPreallocate for Output {
    fn max_allocation() -> u64 {
        // value, empty script length
        (MAX_PROTOCOL_MESSAGE_LEN / (8 + 1)) as u64
    }
}

impl ConsensusSerialize for Transaction {
    fn consensus_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        if !self.has_witness() {
            return self.serialize_without_witness(writer);
        }

        writer.write_i32::<LittleEndian>(self.version)?;
        writer.write_u8(SEGWIT_MARKER)?;
        writer.write_u8(SEGWIT_FLAG)?;
        self.inputs.consensus_serialize(&mut writer)?;
        self.outputs.consensus_serialize(&mut writer)?;
        for input in &self.inputs {
            writer.write_compactsize(input.witness.len() as u64)?;
            for item in &input.witness {
                consensus_serialize_bytes(item, &mut writer)?;
            }
        }
        writer.write_u32::<LittleEndian>(self.lock_time)
    }
}

impl ConsensusDeserialize for Transaction {
    fn consensus_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        let version = reader.read_i32::<LittleEndian>()?;

        let mut inputs: Vec<Input> = Vec::consensus_deserialize(&mut reader)?;
        let mut segwit = false;
        if inputs.is_empty() {
            // An empty input list is the segwit marker.
            if reader.read_u8()? != SEGWIT_FLAG {
                return Err(SerializationError::Parse("unknown segwit flag"));
            }
            segwit = true;
            inputs = Vec::consensus_deserialize(&mut reader)?;
        }

        let outputs: Vec<Output> = Vec::consensus_deserialize(&mut reader)?;

        if segwit {
            for input in &mut inputs {
                let items: usize = reader.read_compactsize()?.try_into()?;
                let mut witness = Vec::with_capacity(items.min(MAX_WITNESS_ITEMS));
                for _ in 0..items {
                    witness.push(Vec::<u8>::consensus_deserialize(&mut reader)?);
                }
                input.witness = witness;
            }

            let transaction = Transaction {
                version,
                inputs,
                outputs,
                lock_time: reader.read_u32::<LittleEndian>()?,
            };

            // A segwit serialization without witnesses is non-canonical.
            if !transaction.has_witness() {
                return Err(SerializationError::Parse(
                    "superfluous segwit marker: no input has a witness",
                ));
            }

            return Ok(transaction);
        }

        Ok(Transaction {
            version,
            inputs,
            outputs,
            lock_time: reader.read_u32::<LittleEndian>()?,
        })
    }
}

/// Limits blind preallocation of witness stacks.
const MAX_WITNESS_ITEMS: usize = 1024;
