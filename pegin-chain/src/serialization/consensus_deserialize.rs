use std::io;

use super::{ReadConsensusExt, SerializationError, MAX_PROTOCOL_MESSAGE_LEN};

/// Consensus-critical deserialization.
///
/// This trait provides a generic deserialization for consensus-critical
/// formats, such as transactions, block headers and inclusion proofs.
pub trait ConsensusDeserialize: Sized {
    /// Try to read `self` from the given `reader`.
    fn consensus_deserialize<R: io::Read>(reader: R) -> Result<Self, SerializationError>;

    /// Try to read `self` from `bytes`, rejecting any bytes left over.
    fn consensus_deserialize_exact(bytes: &[u8]) -> Result<Self, SerializationError> {
        let mut reader = bytes;
        let item = Self::consensus_deserialize(&mut reader)?;

        if reader.is_empty() {
            Ok(item)
        } else {
            Err(SerializationError::TrailingBytes(reader.len()))
        }
    }
}

/// Deserialize a `Vec`, where the number of items is set by a compactsize
/// prefix in the data.
impl<T: ConsensusDeserialize + TrustedPreallocate> ConsensusDeserialize for Vec<T> {
    fn consensus_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        let len: usize = reader.read_compactsize()?.try_into()?;

        if len as u64 > T::max_allocation() {
            return Err(SerializationError::Parse(
                "Vector longer than max_allocation",
            ));
        }

        let mut vec = Vec::with_capacity(len);
        for _ in 0..len {
            vec.push(T::consensus_deserialize(&mut reader)?);
        }
        Ok(vec)
    }
}

/// Implement ConsensusDeserialize for `Vec<u8>` directly instead of using the blanket Vec implementation
///
/// This allows us to optimize the inner loop into a single call to `read_exact()`.
impl ConsensusDeserialize for Vec<u8> {
    fn consensus_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        let len = reader.read_compactsize()?.try_into()?;
        consensus_deserialize_bytes_external_count(len, reader)
    }
}

/// Read `external_count` raw bytes.
pub fn consensus_deserialize_bytes_external_count<R: io::Read>(
    external_count: usize,
    mut reader: R,
) -> Result<Vec<u8>, SerializationError> {
    if external_count > MAX_U8_ALLOCATION {
        return Err(SerializationError::Parse(
            "Byte vector longer than MAX_U8_ALLOCATION",
        ));
    }
    let mut vec = vec![0u8; external_count];
    reader.read_exact(&mut vec)?;
    Ok(vec)
}

/// Helper for deserializing more succinctly via type inference
pub trait ConsensusDeserializeInto {
    /// Deserialize based on type inference
    fn consensus_deserialize_into<T>(self) -> Result<T, SerializationError>
    where
        T: ConsensusDeserialize;
}

impl<R: io::Read> ConsensusDeserializeInto for R {
    fn consensus_deserialize_into<T>(self) -> Result<T, SerializationError>
    where
        T: ConsensusDeserialize,
    {
        T::consensus_deserialize(self)
    }
}

/// Blind preallocation of a `Vec<T: TrustedPreallocate>` is based on a bounded length. This is in contrast
/// to blind preallocation of a generic `Vec<T>`, which is a DOS vector.
///
/// The `max_allocation()` function provides a loose upper bound on the size of the `Vec<T: TrustedPreallocate>`
/// which can possibly be received in a valid message.
pub trait TrustedPreallocate {
    /// Provides a ***loose upper bound*** on the size of the `Vec<T: TrustedPreallocate>`
    /// which can possibly be received in a valid message.
    fn max_allocation() -> u64;
}

/// The length of the longest valid `Vec<u8>`.
///
/// It takes 5 bytes to encode a compactsize representing any number between 2^16 and (2^32 - 1).
pub(crate) const MAX_U8_ALLOCATION: usize = MAX_PROTOCOL_MESSAGE_LEN - 5;
