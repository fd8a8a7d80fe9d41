//! Parent-chain merkle trees, and the partial merkle trees in inclusion proofs.

use std::{fmt, io, iter};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;

use crate::serialization::{
    consensus_serialize_bytes, sha256d, ConsensusDeserialize, ConsensusSerialize,
    ReadConsensusExt, SerializationError, TrustedPreallocate, WriteConsensusExt,
    MAX_PROTOCOL_MESSAGE_LEN,
};

use super::{Header, Txid};

/// The largest number of transactions a parent block can hold: the block
/// weight limit divided by the weight of the smallest transaction.
pub const MAX_TRANSACTIONS_PER_BLOCK: u32 = 4_000_000 / (4 * 60);

/// The root of a parent block's transaction merkle tree.
///
/// Uses Bitcoin's construction: levels with an odd number of nodes pair the
/// last node with itself.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Root(pub [u8; 32]);

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Root").field(&hex::encode(self.0)).finish()
    }
}

fn hash_pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut w = sha256d::Writer::default();
    io::Write::write_all(&mut w, left).expect("Sha256dWriter is infallible");
    io::Write::write_all(&mut w, right).expect("Sha256dWriter is infallible");
    w.finish()
}

impl iter::FromIterator<Txid> for Root {
    fn from_iter<I>(txids: I) -> Self
    where
        I: IntoIterator<Item = Txid>,
    {
        let mut hashes: Vec<[u8; 32]> = txids.into_iter().map(|txid| txid.0).collect();

        if hashes.is_empty() {
            return Root([0; 32]);
        }

        while hashes.len() > 1 {
            hashes = hashes
                .chunks(2)
                .map(|chunk| match chunk {
                    [h1, h2] => hash_pair(h1, h2),
                    [h1] => hash_pair(h1, h1),
                    _ => unreachable!("chunks(2)"),
                })
                .collect();
        }

        Root(hashes[0])
    }
}

/// An inclusion proof failure.
#[derive(Error, Clone, Copy, Debug, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum MerkleError {
    #[error("partial merkle tree has no transactions")]
    NoTransactions,

    #[error("partial merkle tree has more transactions than fit in a block")]
    TooManyTransactions,

    #[error("partial merkle tree has more hashes than transactions")]
    TooManyHashes,

    #[error("partial merkle tree has fewer flag bits than hashes")]
    NotEnoughFlags,

    #[error("partial merkle tree ran out of flag bits or hashes")]
    Truncated,

    #[error("partial merkle tree has identical sibling hashes")]
    DuplicateSiblings,

    #[error("partial merkle tree has unused flag bits")]
    UnusedFlags,

    #[error("partial merkle tree has unused hashes")]
    UnusedHashes,

    #[error("partial merkle tree root does not match the block header")]
    RootMismatch,
}

/// A partial merkle tree: the subset of a block's merkle tree needed to
/// link some of its transactions to the block's merkle root.
///
/// The tree is walked depth first. Each visited node has a flag bit: set if
/// the node is an ancestor of a matched transaction (or is one). Nodes that
/// aren't ancestors, and matched leaves, have their hash included.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PartialMerkleTree {
    pub(crate) transaction_count: u32,
    pub(crate) hashes: Vec<[u8; 32]>,
    pub(crate) flags: Vec<bool>,
}

impl PartialMerkleTree {
    /// Builds the partial tree proving the transactions at `matches` in a
    /// block with `txids`.
    ///
    /// Indexes past the end of `txids` are ignored.
    pub fn from_txids(txids: &[Txid], matches: &[usize]) -> Self {
        let mut builder = Builder {
            txids,
            matched: (0..txids.len()).map(|i| matches.contains(&i)).collect(),
            tree: PartialMerkleTree {
                transaction_count: txids.len() as u32,
                hashes: Vec::new(),
                flags: Vec::new(),
            },
        };

        if !txids.is_empty() {
            let height = builder.tree.height();
            builder.traverse(height, 0);
        }

        // Flags go on the wire as whole bytes, padded with zero bits.
        let padded = builder.tree.flags.len().div_ceil(8) * 8;
        builder.tree.flags.resize(padded, false);

        builder.tree
    }

    /// Returns the number of transactions in the block.
    pub fn transaction_count(&self) -> u32 {
        self.transaction_count
    }

    /// The number of nodes at `height` levels above the leaves.
    fn width(&self, height: u32) -> u64 {
        (u64::from(self.transaction_count) + (1 << height) - 1) >> height
    }

    fn height(&self) -> u32 {
        let mut height = 0;
        while self.width(height) > 1 {
            height += 1;
        }
        height
    }

    /// Rebuilds the merkle root, and returns it with the matched txids and
    /// their positions in the block.
    pub fn extract_matches(&self) -> Result<(Root, Vec<(Txid, u32)>), MerkleError> {
        if self.transaction_count == 0 {
            return Err(MerkleError::NoTransactions);
        }
        if self.transaction_count > MAX_TRANSACTIONS_PER_BLOCK {
            return Err(MerkleError::TooManyTransactions);
        }
        if self.hashes.len() as u64 > u64::from(self.transaction_count) {
            return Err(MerkleError::TooManyHashes);
        }
        if self.flags.len() < self.hashes.len() {
            return Err(MerkleError::NotEnoughFlags);
        }

        let mut extractor = Extractor {
            tree: self,
            flags_used: 0,
            hashes_used: 0,
            matches: Vec::new(),
        };
        let root = extractor.traverse(self.height(), 0)?;

        // Flags are serialized as whole bytes, so only unused bytes are an error.
        if extractor.flags_used.div_ceil(8) != self.flags.len().div_ceil(8) {
            return Err(MerkleError::UnusedFlags);
        }
        if extractor.hashes_used != self.hashes.len() {
            return Err(MerkleError::UnusedHashes);
        }

        Ok((Root(root), extractor.matches))
    }
}

struct Builder<'a> {
    txids: &'a [Txid],
    matched: Vec<bool>,
    tree: PartialMerkleTree,
}

impl Builder<'_> {
    fn hash(&self, height: u32, pos: u64) -> [u8; 32] {
        if height == 0 {
            return self.txids[pos as usize].0;
        }

        let left = self.hash(height - 1, pos * 2);
        let right = if pos * 2 + 1 < self.tree.width(height - 1) {
            self.hash(height - 1, pos * 2 + 1)
        } else {
            left
        };

        hash_pair(&left, &right)
    }

    fn traverse(&mut self, height: u32, pos: u64) {
        let start = (pos << height) as usize;
        let end = (((pos + 1) << height) as usize).min(self.txids.len());
        let parent_of_match = self.matched[start..end].iter().any(|m| *m);

        self.tree.flags.push(parent_of_match);

        if height == 0 || !parent_of_match {
            let hash = self.hash(height, pos);
            self.tree.hashes.push(hash);
        } else {
            self.traverse(height - 1, pos * 2);
            if pos * 2 + 1 < self.tree.width(height - 1) {
                self.traverse(height - 1, pos * 2 + 1);
            }
        }
    }
}

struct Extractor<'a> {
    tree: &'a PartialMerkleTree,
    flags_used: usize,
    hashes_used: usize,
    matches: Vec<(Txid, u32)>,
}

impl Extractor<'_> {
    fn traverse(&mut self, height: u32, pos: u64) -> Result<[u8; 32], MerkleError> {
        let parent_of_match = *self
            .tree
            .flags
            .get(self.flags_used)
            .ok_or(MerkleError::Truncated)?;
        self.flags_used += 1;

        if height == 0 || !parent_of_match {
            let hash = *self
                .tree
                .hashes
                .get(self.hashes_used)
                .ok_or(MerkleError::Truncated)?;
            self.hashes_used += 1;

            if height == 0 && parent_of_match {
                let index = u32::try_from(pos).map_err(|_| MerkleError::TooManyTransactions)?;
                self.matches.push((Txid(hash), index));
            }

            return Ok(hash);
        }

        let left = self.traverse(height - 1, pos * 2)?;
        let right = if pos * 2 + 1 < self.tree.width(height - 1) {
            let right = self.traverse(height - 1, pos * 2 + 1)?;
            // CVE-2012-2459: identical siblings let two different trees share a root.
            if right == left {
                return Err(MerkleError::DuplicateSiblings);
            }
            right
        } else {
            left
        };

        Ok(hash_pair(&left, &right))
    }
}

struct Hash32([u8; 32]);

impl ConsensusDeserialize for Hash32 {
    fn consensus_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        Ok(Hash32(reader.read_32_bytes()?))
    }
}

impl TrustedPreallocate for Hash32 {
    fn max_allocation() -> u64 {
        (MAX_PROTOCOL_MESSAGE_LEN / 32) as u64
    }
}

impl ConsensusSerialize for PartialMerkleTree {
    fn consensus_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        writer.write_u32::<LittleEndian>(self.transaction_count)?;

        writer.write_compactsize(self.hashes.len() as u64)?;
        for hash in &self.hashes {
            writer.write_32_bytes(hash)?;
        }

        let mut flag_bytes = vec![0u8; self.flags.len().div_ceil(8)];
        for (i, flag) in self.flags.iter().enumerate() {
            flag_bytes[i / 8] |= u8::from(*flag) << (i % 8);
        }
        consensus_serialize_bytes(&flag_bytes, writer)
    }
}

impl ConsensusDeserialize for PartialMerkleTree {
    fn consensus_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        let transaction_count = reader.read_u32::<LittleEndian>()?;
        let hashes: Vec<Hash32> = Vec::consensus_deserialize(&mut reader)?;
        let flag_bytes: Vec<u8> = Vec::consensus_deserialize(&mut reader)?;

        let flags = flag_bytes
            .iter()
            .flat_map(|byte| (0..8).map(move |bit| (byte >> bit) & 1 == 1))
            .collect();

        Ok(PartialMerkleTree {
            transaction_count,
            hashes: hashes.into_iter().map(|hash| hash.0).collect(),
            flags,
        })
    }
}

/// A parent-chain inclusion proof, in the `gettxoutproof` format: a block
/// header followed by a partial merkle tree.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TxOutProof {
    /// The header of the block containing the proven transactions.
    pub header: Header,

    /// The partial merkle tree linking them to the header's merkle root.
    pub tree: PartialMerkleTree,
}

impl TxOutProof {
    /// Returns the txids this proof proves are in `self.header`'s block, with
    /// their positions in the block.
    ///
    /// Fails if the tree is malformed, or doesn't hash to the header's merkle root.
    pub fn matched_txids(&self) -> Result<Vec<(Txid, u32)>, MerkleError> {
        let (root, matches) = self.tree.extract_matches()?;

        if root != self.header.merkle_root {
            return Err(MerkleError::RootMismatch);
        }

        Ok(matches)
    }

    /// Returns true if this proof proves `txid` is in `self.header`'s block.
    pub fn proves(&self, txid: Txid) -> Result<bool, MerkleError> {
        Ok(self
            .matched_txids()?
            .iter()
            .any(|(matched, _)| *matched == txid))
    }
}

impl ConsensusSerialize for TxOutProof {
    fn consensus_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        self.header.consensus_serialize(&mut writer)?;
        self.tree.consensus_serialize(&mut writer)
    }
}

impl ConsensusDeserialize for TxOutProof {
    fn consensus_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        Ok(TxOutProof {
            header: Header::consensus_deserialize(&mut reader)?,
            tree: PartialMerkleTree::consensus_deserialize(&mut reader)?,
        })
    }
}
