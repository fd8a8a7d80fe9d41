use std::{fmt, io};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::{
    amount::{self, Amount, NonNegative},
    fee_rate::FeeRate,
    script::Script,
    serialization::{
        ConsensusDeserialize, ConsensusSerialize, ReadConsensusExt, SerializationError,
        TrustedPreallocate, WriteConsensusExt, MAX_PROTOCOL_MESSAGE_LEN,
    },
};

/// The prefix byte of an explicit asset or value.
const EXPLICIT_PREFIX: u8 = 0x01;

/// The single byte of a null nonce.
const NULL_NONCE: u8 = 0x00;

/// Scripts longer than this can never be spent.
const MAX_SCRIPT_SIZE: usize = 10_000;

/// The bytes a spending input adds for a legacy output: outpoint, script
/// length, a typical signature script, and sequence.
const LEGACY_SPEND_SIZE: usize = 32 + 4 + 1 + 107 + 4;

/// The bytes a spending input adds for a witness program output, with the
/// witness discounted to a quarter.
const WITNESS_SPEND_SIZE: usize = 32 + 4 + 1 + (107 / 4) + 4;

/// The identifier of a sidechain asset.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[cfg_attr(
    any(test, feature = "proptest-impl"),
    derive(proptest_derive::Arbitrary)
)]
pub struct AssetId(pub [u8; 32]);

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AssetId").field(&hex::encode(self.0)).finish()
    }
}

/// What an output does with its value, derived from its lock script.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum OutputKind {
    /// Pays a spendable script.
    Payment,

    /// Provably destroys its value: the script starts with `OP_RETURN`.
    Burn,

    /// Pays the miner: the script is empty.
    Fee,
}

/// A sidechain transaction output, with an explicit asset and value.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Output {
    /// The asset this output holds.
    pub asset: AssetId,

    /// The output value.
    pub value: Amount<NonNegative>,

    /// The script the spender must satisfy.
    pub lock_script: Script,
}

impl Output {
    /// Returns what this output does with its value.
    pub fn kind(&self) -> OutputKind {
        if self.lock_script.is_empty() {
            OutputKind::Fee
        } else if self.lock_script.is_op_return() {
            OutputKind::Burn
        } else {
            OutputKind::Payment
        }
    }

    /// Returns true if this output can never be spent.
    pub fn is_unspendable(&self) -> bool {
        self.lock_script.is_op_return() || self.lock_script.as_raw_bytes().len() > MAX_SCRIPT_SIZE
    }

    /// Returns the lowest value this output can have without being dust at
    /// `dust_relay_fee`: the fee for spending it.
    ///
    /// Burn, fee and unspendable outputs are never dust, so their threshold is zero.
    pub fn dust_threshold(
        &self,
        dust_relay_fee: FeeRate,
    ) -> Result<Amount<NonNegative>, amount::Error> {
        if self.kind() != OutputKind::Payment || self.is_unspendable() {
            return Ok(Amount::zero());
        }

        let spend_size = if self.lock_script.is_witness_program() {
            WITNESS_SPEND_SIZE
        } else {
            LEGACY_SPEND_SIZE
        };

        dust_relay_fee.fee((self.serialized_size() + spend_size) as u64)
    }

    /// Returns true if this output's value is below its dust threshold.
    pub fn is_dust(&self, dust_relay_fee: FeeRate) -> bool {
        match self.dust_threshold(dust_relay_fee) {
            Ok(threshold) => self.value < threshold,
            // spending it would cost more than all the money there is
            Err(_) => true,
        }
    }
}

impl ConsensusSerialize for Output {
    fn consensus_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        writer.write_u8(EXPLICIT_PREFIX)?;
        writer.write_32_bytes(&self.asset.0)?;
        writer.write_u8(EXPLICIT_PREFIX)?;
        writer.write_u64::<BigEndian>(self.value.into())?;
        writer.write_u8(NULL_NONCE)?;
        self.lock_script.consensus_serialize(&mut writer)
    }
}

impl ConsensusDeserialize for Output {
    fn consensus_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        if reader.read_u8()? != EXPLICIT_PREFIX {
            return Err(SerializationError::Parse("confidential assets are not supported"));
        }
        let asset = AssetId(reader.read_32_bytes()?);

        if reader.read_u8()? != EXPLICIT_PREFIX {
            return Err(SerializationError::Parse("confidential values are not supported"));
        }
        let value = reader.read_u64::<BigEndian>()?.try_into()?;

        if reader.read_u8()? != NULL_NONCE {
            return Err(SerializationError::Parse("output nonces are not supported"));
        }

        Ok(Output {
            asset,
            value,
            lock_script: Script::consensus_deserialize(&mut reader)?,
        })
    }
}

impl TrustedPreallocate for Output {
    fn max_allocation() -> u64 {
        // asset, value, nonce, empty script length
        (MAX_PROTOCOL_MESSAGE_LEN / (33 + 9 + 1 + 1)) as u64
    }
}
