use std::io;

use super::WriteConsensusExt;

/// The maximum length of a sidechain or parent-chain protocol message, in bytes.
///
/// This value is used to calculate safe preallocation limits for some types.
pub const MAX_PROTOCOL_MESSAGE_LEN: usize = 4 * 1024 * 1024;

/// Consensus-critical serialization.
///
/// This trait provides a generic serialization for consensus-critical
/// formats, such as transactions, block headers and inclusion proofs. It is
/// intended for use only in consensus-critical contexts; in other contexts,
/// such as configuration or RPC replies, it would be preferable to use Serde.
pub trait ConsensusSerialize: Sized {
    /// Write `self` to the given `writer` using the canonical format.
    ///
    /// Notice that the error type is [`std::io::Error`]; this indicates that
    /// serialization MUST be infallible up to errors in the underlying writer.
    /// In other words, any type implementing `ConsensusSerialize` must make
    /// illegal states unrepresentable.
    fn consensus_serialize<W: io::Write>(&self, writer: W) -> Result<(), io::Error>;

    /// Helper function to construct a vec to serialize the current struct into
    fn consensus_serialize_to_vec(&self) -> Result<Vec<u8>, io::Error> {
        let mut data = Vec::new();
        self.consensus_serialize(&mut data)?;
        Ok(data)
    }

    /// Returns the serialized length of `self`, in bytes.
    fn serialized_size(&self) -> usize {
        let mut counter = FakeWriter(0);
        self.consensus_serialize(&mut counter)
            .expect("FakeWriter is infallible");
        counter.0
    }
}

/// Serialize a `Vec` as a compactsize number of items, then the items.
impl<T: ConsensusSerialize> ConsensusSerialize for Vec<T> {
    fn consensus_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        writer.write_compactsize(self.len() as u64)?;
        for item in self {
            item.consensus_serialize(&mut writer)?;
        }
        Ok(())
    }
}

/// Serialize a byte slice as a compactsize length, then the bytes.
pub fn consensus_serialize_bytes<W: io::Write>(bytes: &[u8], mut writer: W) -> Result<(), io::Error> {
    writer.write_compactsize(bytes.len() as u64)?;
    writer.write_all(bytes)
}

/// Returns the number of bytes `write_compactsize(n)` writes.
pub fn compactsize_len(n: u64) -> usize {
    match n {
        0x00..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// A writer that only counts the bytes written to it.
pub(crate) struct FakeWriter(pub usize);

impl io::Write for FakeWriter {
    fn write(&mut self, buf: &[u8]) -> Result<usize, io::Error> {
        self.0 += buf.len();

        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), io::Error> {
        Ok(())
    }
}
