//! Builders for fake parent chain blocks and transactions, for tests.

use proptest::prelude::*;

use crate::{
    amount::{Amount, NonNegative, COIN},
    script::Script,
};

use super::{
    BlockHash, Header, Input, OutPoint, Output, PartialMerkleTree, Transaction, TxOutProof, Txid,
};

/// Returns a header committing to `txids`, on top of `previous_block_hash`.
///
/// Headers with the same parent and transactions can be made distinct using `nonce`.
pub fn fake_header(previous_block_hash: BlockHash, txids: &[Txid], nonce: u32) -> Header {
    Header {
        version: 0x2000_0000,
        previous_block_hash,
        merkle_root: txids.iter().copied().collect(),
        time: 1_700_000_000 + nonce,
        difficulty_threshold: 0x207f_ffff,
        nonce,
    }
}

/// Returns a transaction spending `prevout` into `outputs`.
pub fn spending_transaction(prevout: OutPoint, outputs: Vec<Output>) -> Transaction {
    Transaction {
        version: 2,
        inputs: vec![Input {
            previous_output: prevout,
            unlock_script: Script::default(),
            sequence: 0xffff_fffd,
            witness: vec![vec![0x30; 71], vec![0x02; 33]],
        }],
        outputs,
        lock_time: 0,
    }
}

/// Returns a coinbase-like transaction paying `value` to `lock_script`.
///
/// Different `tag`s give different txids.
pub fn funding_transaction(
    tag: u32,
    value: Amount<NonNegative>,
    lock_script: Script,
) -> Transaction {
    Transaction {
        version: 1,
        inputs: vec![Input {
            previous_output: OutPoint {
                hash: Txid([0; 32]),
                index: u32::MAX,
            },
            unlock_script: Script::new(&tag.to_le_bytes()),
            sequence: u32::MAX,
            witness: Vec::new(),
        }],
        outputs: vec![Output { value, lock_script }],
        lock_time: 0,
    }
}

/// Returns an inclusion proof for the transaction at `index` in a block
/// with `header` and `txids`.
pub fn fake_proof(header: Header, txids: &[Txid], index: usize) -> TxOutProof {
    TxOutProof {
        header,
        tree: PartialMerkleTree::from_txids(txids, &[index]),
    }
}

/// Returns a strategy for non-empty lists of distinct txids.
pub fn txids(max_len: usize) -> impl Strategy<Value = Vec<Txid>> {
    proptest::collection::hash_set(any::<Txid>(), 1..=max_len)
        .prop_map(|txids| txids.into_iter().collect())
}

/// Returns a strategy for parent output values, up to 100 coins.
pub fn output_value() -> impl Strategy<Value = Amount<NonNegative>> {
    (1..=100 * COIN).prop_map(Amount::new)
}
