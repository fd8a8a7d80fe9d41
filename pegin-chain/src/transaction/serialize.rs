//! Consensus serialization of sidechain transactions.

use std::io;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::serialization::{
    consensus_serialize_bytes, ConsensusDeserialize, ConsensusSerialize, ReadConsensusExt,
    SerializationError, WriteConsensusExt,
};

use super::{Input, Output, Transaction};

/// Limits blind preallocation of witness stacks.
const MAX_WITNESS_ITEMS: usize = 1024;

fn write_stack<W: io::Write>(stack: &[Vec<u8>], mut writer: W) -> Result<(), io::Error> {
    writer.write_compactsize(stack.len() as u64)?;
    for item in stack {
        consensus_serialize_bytes(item, &mut writer)?;
    }
    Ok(())
}

fn read_stack<R: io::Read>(mut reader: R) -> Result<Vec<Vec<u8>>, SerializationError> {
    let items: usize = reader.read_compactsize()?.try_into()?;

    let mut stack = Vec::with_capacity(items.min(MAX_WITNESS_ITEMS));
    for _ in 0..items {
        stack.push(Vec::<u8>::consensus_deserialize(&mut reader)?);
    }
    Ok(stack)
}

impl Transaction {
    /// Writes the transaction with a zero witness flag and no witnesses.
    ///
    /// This is the serialization that transaction hashes and base sizes use.
    pub(super) fn serialize_without_witness<W: io::Write>(
        &self,
        mut writer: W,
    ) -> Result<(), io::Error> {
        writer.write_i32::<LittleEndian>(self.version)?;
        writer.write_u8(0)?;
        self.inputs.consensus_serialize(&mut writer)?;
        self.outputs.consensus_serialize(&mut writer)?;
        writer.write_u32::<LittleEndian>(self.lock_time)
    }
}

impl ConsensusSerialize for Transaction {
    fn consensus_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        if !self.has_witness() {
            return self.serialize_without_witness(writer);
        }

        writer.write_i32::<LittleEndian>(self.version)?;
        writer.write_u8(1)?;
        self.inputs.consensus_serialize(&mut writer)?;
        self.outputs.consensus_serialize(&mut writer)?;
        writer.write_u32::<LittleEndian>(self.lock_time)?;

        for input in &self.inputs {
            write_stack(input.witness(), &mut writer)?;
            write_stack(input.pegin_witness(), &mut writer)?;
        }

        Ok(())
    }
}

impl ConsensusDeserialize for Transaction {
    fn consensus_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        let version = reader.read_i32::<LittleEndian>()?;

        let has_witness = match reader.read_u8()? {
            0 => false,
            1 => true,
            _ => return Err(SerializationError::Parse("unknown witness flag")),
        };

        let mut inputs: Vec<Input> = Vec::consensus_deserialize(&mut reader)?;
        let outputs: Vec<Output> = Vec::consensus_deserialize(&mut reader)?;
        let lock_time = reader.read_u32::<LittleEndian>()?;

        if has_witness {
            for input in &mut inputs {
                let script_witness = read_stack(&mut reader)?;
                let pegin_witness = read_stack(&mut reader)?;
                input.set_witnesses(script_witness, pegin_witness)?;
            }

            if !inputs.iter().any(Input::has_witness) {
                return Err(SerializationError::Parse(
                    "superfluous witness flag: no input has a witness",
                ));
            }
        }

        Ok(Transaction {
            version,
            inputs,
            outputs,
            lock_time,
        })
    }
}
