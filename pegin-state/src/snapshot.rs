//! Immutable point-in-time views of the parent chain.

use std::{collections::HashMap, sync::Arc};

use pegin_chain::parent::{self, Root};

use crate::{ClaimData, ClaimLookup, PeginData, StateError};

/// A parent block header, and its height in the parent chain.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KnownHeader {
    /// The block header.
    pub header: parent::Header,

    /// The block's height.
    pub height: u32,
}

#[derive(Clone, Debug)]
struct Block {
    header: parent::Header,
    txids: Vec<parent::Txid>,
}

/// The parent chain's best chain at one point in time: its block headers,
/// an index of its transactions, and its tip height.
///
/// Snapshots are never modified after they are published. The writer builds
/// each new snapshot from a copy of the previous one.
#[derive(Clone, Debug, Default)]
pub struct ParentChainSnapshot {
    /// The height of `blocks[0]`.
    start_height: u32,

    /// The best chain, in height order.
    blocks: Vec<Block>,

    heights: HashMap<parent::BlockHash, u32>,

    transactions: HashMap<parent::Txid, Arc<parent::Transaction>>,
}

impl ParentChainSnapshot {
    /// Creates an empty snapshot, whose first block will be at `start_height`.
    pub fn new(start_height: u32) -> Self {
        Self {
            start_height,
            ..Self::default()
        }
    }

    /// Returns the height of the best block, if there are any blocks.
    pub fn best_height(&self) -> Option<u32> {
        let len = u32::try_from(self.blocks.len()).ok()?;

        len.checked_sub(1).map(|offset| self.start_height + offset)
    }

    /// Returns the hash of the best block, if there are any blocks.
    pub fn tip_hash(&self) -> Option<parent::BlockHash> {
        self.blocks.last().map(|block| block.header.hash())
    }

    /// Returns the header with `hash`, if it is in the best chain.
    pub fn header(&self, hash: parent::BlockHash) -> Option<KnownHeader> {
        let height = *self.heights.get(&hash)?;
        let block = self.blocks.get((height - self.start_height) as usize)?;

        Some(KnownHeader {
            header: block.header,
            height,
        })
    }

    /// Returns the number of confirmations of the block with `hash`: one for
    /// the tip, two for its parent, and so on.
    pub fn depth(&self, hash: parent::BlockHash) -> Option<u32> {
        let height = *self.heights.get(&hash)?;

        Some(self.best_height()? - height + 1)
    }

    /// Returns the best chain transaction with `txid`.
    pub fn transaction(&self, txid: parent::Txid) -> Option<Arc<parent::Transaction>> {
        self.transactions.get(&txid).cloned()
    }

    /// Returns the output `outpoint` refers to, if its transaction is in the best chain.
    pub fn output(&self, outpoint: parent::OutPoint) -> Option<parent::Output> {
        self.transactions
            .get(&outpoint.hash)?
            .output(outpoint.index)
            .cloned()
    }

    /// Answers all the lookups for one claiming transaction.
    pub fn pegin_data(&self, lookups: &[ClaimLookup]) -> PeginData {
        PeginData {
            best_height: self.best_height(),
            claims: lookups
                .iter()
                .map(|lookup| ClaimData {
                    block: self.header(lookup.block_hash),
                    prevouts: lookup
                        .prevouts
                        .iter()
                        .map(|prevout| self.output(*prevout))
                        .collect(),
                })
                .collect(),
        }
    }

    /// Appends a block to the best chain.
    pub(crate) fn push_block(
        &mut self,
        header: parent::Header,
        transactions: &[Arc<parent::Transaction>],
    ) -> Result<parent::BlockHash, StateError> {
        let hash = header.hash();
        let tip = self.tip_hash();

        if self.heights.contains_key(&hash) {
            return Err(StateError::Duplicate(hash));
        }
        if tip.is_some() && tip != Some(header.previous_block_hash) {
            return Err(StateError::NotAChild { hash, tip });
        }

        let txids: Vec<parent::Txid> = transactions.iter().map(|tx| tx.txid()).collect();
        if txids.iter().copied().collect::<Root>() != header.merkle_root {
            return Err(StateError::BadMerkleRoot(hash));
        }

        let height = self.best_height().map_or(self.start_height, |best| best + 1);

        self.heights.insert(hash, height);
        for (txid, transaction) in txids.iter().zip(transactions) {
            self.transactions.insert(*txid, transaction.clone());
        }
        self.blocks.push(Block { header, txids });

        Ok(hash)
    }

    /// Removes all blocks above `height` from the best chain.
    pub(crate) fn rollback_to(&mut self, height: u32) -> Result<(), StateError> {
        if height < self.start_height {
            return Err(StateError::RollbackTooDeep {
                requested: height,
                start: self.start_height,
            });
        }

        let keep = (height - self.start_height + 1) as usize;
        for block in self.blocks.drain(keep.min(self.blocks.len())..) {
            self.heights.remove(&block.header.hash());
            for txid in block.txids {
                self.transactions.remove(&txid);
            }
        }

        Ok(())
    }
}
