use std::{fmt, io};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::serialization::{
    sha256d, ConsensusDeserialize, ConsensusSerialize, ReadConsensusExt, SerializationError,
    WriteConsensusExt,
};

use super::merkle;

/// A parent-chain block header, in the 80-byte Bitcoin format.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// The block's version field.
    pub version: i32,

    /// The hash of the previous block.
    pub previous_block_hash: BlockHash,

    /// The root of the block's transaction merkle tree.
    pub merkle_root: merkle::Root,

    /// The block timestamp, in seconds since the UNIX epoch.
    pub time: u32,

    /// The encoded difficulty target.
    pub difficulty_threshold: u32,

    /// The proof of work nonce.
    pub nonce: u32,
}

impl Header {
    /// The serialized length of a header.
    pub const LEN: usize = 80;

    /// Returns the hash of this header.
    pub fn hash(&self) -> BlockHash {
        BlockHash::from(self)
    }
}

impl ConsensusSerialize for Header {
    fn consensus_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        writer.write_i32::<LittleEndian>(self.version)?;
        writer.write_32_bytes(&self.previous_block_hash.0)?;
        writer.write_32_bytes(&self.merkle_root.0)?;
        writer.write_u32::<LittleEndian>(self.time)?;
        writer.write_u32::<LittleEndian>(self.difficulty_threshold)?;
        writer.write_u32::<LittleEndian>(self.nonce)?;
        Ok(())
    }
}

impl ConsensusDeserialize for Header {
    fn consensus_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        Ok(Header {
            version: reader.read_i32::<LittleEndian>()?,
            previous_block_hash: BlockHash(reader.read_32_bytes()?),
            merkle_root: merkle::Root(reader.read_32_bytes()?),
            time: reader.read_u32::<LittleEndian>()?,
            difficulty_threshold: reader.read_u32::<LittleEndian>()?,
            nonce: reader.read_u32::<LittleEndian>()?,
        })
    }
}

/// A SHA-256d hash of a parent-chain block header.
///
/// Stored in internal byte order, displayed reversed, like Bitcoin does.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[cfg_attr(
    any(test, feature = "proptest-impl"),
    derive(proptest_derive::Arbitrary)
)]
pub struct BlockHash(pub [u8; 32]);

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        sha256d::fmt_reversed_hex(&self.0, f)
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("parent::BlockHash")
            .field(&self.to_string())
            .finish()
    }
}

impl<'a> From<&'a Header> for BlockHash {
    fn from(header: &'a Header) -> Self {
        let mut hash_writer = sha256d::Writer::default();
        header
            .consensus_serialize(&mut hash_writer)
            .expect("Sha256dWriter is infallible");
        Self(hash_writer.finish())
    }
}

impl std::str::FromStr for BlockHash {
    type Err = SerializationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        sha256d::parse_reversed_hex(s)
            .map(BlockHash)
            .ok_or(SerializationError::Parse("block hash hex decoding error"))
    }
}
