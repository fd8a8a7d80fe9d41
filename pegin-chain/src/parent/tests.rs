//! Parent-chain format tests, using vectors checked against Bitcoin's serialization.

use color_eyre::eyre::Result;

use crate::{
    amount::Amount,
    serialization::{ConsensusDeserialize, ConsensusSerialize},
};

use super::*;

/// Block 100000 on Bitcoin mainnet.
const BLOCK_100000_HEADER: &str = "0100000050120119172a610421a6c3011dd330d9df07b63616c2cc1f1cd00200000000006657a9252aacd5c0b2940996ecff952228c3067cc38d4885efb5a4ac4247e9f337221b4d4c86041b0f2b5710";

const BLOCK_100000_HASH: &str = "000000000003ba27aa200b1cecaad478d2b00432346c3f1f3986da1afd33e506";

const BLOCK_100000_TXIDS: [&str; 4] = [
    "8c14f0db3df150123e6f3dbbf30f8b955a8249b62ac1d1ff16284aefa3d06d87",
    "fff2525b8931402dd09222c50775608f75787bd2b87e56995a7bdd30f79702c4",
    "6359f0868171b1d194cbee1af2f16ea598ae8fad666d9b012c8ed2b79a236ec4",
    "e9a66845e05d5abc0ad04ec80f774a7e585c6e8db975962d069a522137b80c1d",
];

/// A `gettxoutproof` for the third transaction of block 100000.
const BLOCK_100000_TX_2_PROOF: &str = "0100000050120119172a610421a6c3011dd330d9df07b63616c2cc1f1cd00200000000006657a9252aacd5c0b2940996ecff952228c3067cc38d4885efb5a4ac4247e9f337221b4d4c86041b0f2b5710040000000315b88c5107195bf09eb9da89b83d95b3d070079a3c5c5d3d17d0dcd873fbdaccc46e239ab7d28e2c019b6d66ad8fae98a56ef1f21aeecb94d1b1718186f059631d0cb83721529a062d9675b98d6e5c587e4a770fc84ed00abc5a5de04568a6e9010d";

/// A segwit transaction paying 1 coin to a P2WSH script.
const SEGWIT_TX: &str = "02000000000101000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f0100000000fdffffff0200e1f505000000002200204242424242424242424242424242424242424242424242424242424242424242e8b5fa02000000001600142424242424242424242424242424242424242424024730303030303030303030303030303030303030303030303030303030303030303030303030303030303030303030303030303030303030303030303030303030303030303030302102020202020202020202020202020202020202020202020202020202020202020200000000";

const SEGWIT_TXID: &str = "ce83eb0701952ef14678c260eee56e8552968cd104023a43079ffca883b27552";

fn block_100000_txids() -> Vec<Txid> {
    BLOCK_100000_TXIDS
        .iter()
        .map(|txid| txid.parse().expect("valid txid"))
        .collect()
}

#[test]
fn header_hash_matches_mainnet() -> Result<()> {
    pegin_test::init();

    let bytes = pegin_test::hex_bytes(BLOCK_100000_HEADER);
    let header = Header::consensus_deserialize_exact(&bytes)?;

    assert_eq!(header.hash().to_string(), BLOCK_100000_HASH);
    assert_eq!(header.consensus_serialize_to_vec()?, bytes);

    let root: Root = block_100000_txids().into_iter().collect();
    assert_eq!(root, header.merkle_root);

    Ok(())
}

#[test]
fn parses_gettxoutproof() -> Result<()> {
    pegin_test::init();

    let bytes = pegin_test::hex_bytes(BLOCK_100000_TX_2_PROOF);
    let proof = TxOutProof::consensus_deserialize_exact(&bytes)?;
    let txids = block_100000_txids();

    assert_eq!(proof.tree.transaction_count(), 4);
    assert_eq!(proof.matched_txids()?, vec![(txids[2], 2)]);
    assert!(proof.proves(txids[2])?);
    assert!(!proof.proves(txids[1])?);

    // our own construction produces the same bytes
    let rebuilt = TxOutProof {
        header: proof.header,
        tree: PartialMerkleTree::from_txids(&txids, &[2]),
    };
    assert_eq!(rebuilt.consensus_serialize_to_vec()?, bytes);

    Ok(())
}

#[test]
fn proofs_for_other_blocks_fail() -> Result<()> {
    pegin_test::init();

    let bytes = pegin_test::hex_bytes(BLOCK_100000_TX_2_PROOF);
    let mut proof = TxOutProof::consensus_deserialize_exact(&bytes)?;
    proof.header.merkle_root = Root([0x11; 32]);

    assert_eq!(proof.matched_txids(), Err(MerkleError::RootMismatch));

    Ok(())
}

#[test]
fn extracts_multiple_matches_from_odd_trees() {
    pegin_test::init();

    let txids: Vec<Txid> = (0u8..7).map(|i| Txid([i; 32])).collect();
    let tree = PartialMerkleTree::from_txids(&txids, &[0, 4, 6]);

    let (root, matches) = tree.extract_matches().expect("well-formed tree");

    assert_eq!(root, txids.iter().copied().collect::<Root>());
    assert_eq!(
        matches,
        vec![(txids[0], 0), (txids[4], 4), (txids[6], 6)]
    );
}

#[test]
fn rejects_malformed_trees() {
    pegin_test::init();

    let txids: Vec<Txid> = (0u8..5).map(|i| Txid([i; 32])).collect();
    let tree = PartialMerkleTree::from_txids(&txids, &[3]);

    let mut empty = tree.clone();
    empty.transaction_count = 0;
    assert_eq!(empty.extract_matches(), Err(MerkleError::NoTransactions));

    let mut huge = tree.clone();
    huge.transaction_count = MAX_TRANSACTIONS_PER_BLOCK + 1;
    assert_eq!(huge.extract_matches(), Err(MerkleError::TooManyTransactions));

    let mut extra_hash = tree.clone();
    extra_hash.hashes.push([0xff; 32]);
    assert_eq!(extra_hash.extract_matches(), Err(MerkleError::UnusedHashes));

    let mut missing_hash = tree.clone();
    missing_hash.hashes.pop();
    assert_eq!(missing_hash.extract_matches(), Err(MerkleError::Truncated));

    let mut extra_flags = tree.clone();
    extra_flags.flags.extend([false; 8]);
    assert_eq!(extra_flags.extract_matches(), Err(MerkleError::UnusedFlags));
}

#[test]
fn rejects_duplicated_siblings() {
    pegin_test::init();

    // CVE-2012-2459: a block with its last two transactions duplicated has
    // the same merkle root as the block without them.
    let txids: Vec<Txid> = (0u8..3).map(|i| Txid([i; 32])).collect();
    let mut duplicated = txids.clone();
    duplicated.push(txids[2]);

    assert_eq!(
        txids.iter().copied().collect::<Root>(),
        duplicated.iter().copied().collect::<Root>()
    );

    let tree = PartialMerkleTree::from_txids(&duplicated, &[2, 3]);
    assert_eq!(tree.extract_matches(), Err(MerkleError::DuplicateSiblings));
}

#[test]
fn built_trees_survive_serialization() -> Result<()> {
    pegin_test::init();

    let txids: Vec<Txid> = (0u8..5).map(|i| Txid([i; 32])).collect();
    let tree = PartialMerkleTree::from_txids(&txids, &[3]);

    assert_eq!(tree.flags.len() % 8, 0);

    let bytes = tree.consensus_serialize_to_vec()?;
    assert_eq!(PartialMerkleTree::consensus_deserialize_exact(&bytes)?, tree);

    Ok(())
}

#[test]
fn segwit_transaction_id_and_size() -> Result<()> {
    pegin_test::init();

    let bytes = pegin_test::hex_bytes(SEGWIT_TX);
    let transaction = Transaction::consensus_deserialize_exact(&bytes)?;

    assert_eq!(transaction.txid().to_string(), SEGWIT_TXID);
    assert!(transaction.has_witness());
    assert_eq!(transaction.base_size(), 125);
    assert_eq!(transaction.serialized_size(), 234);
    assert_eq!(transaction.weight(), 609);
    assert_eq!(transaction.vsize(), 153);

    assert_eq!(transaction.outputs.len(), 2);
    assert_eq!(transaction.output(0).map(|o| o.value), Some(Amount::new(100_000_000)));
    assert!(transaction.output(2).is_none());
    assert_eq!(transaction.total_output_value()?, 149_985_000);

    assert_eq!(transaction.consensus_serialize_to_vec()?, bytes);

    // without witnesses, the txid is unchanged, but the size shrinks
    let mut stripped = transaction.clone();
    stripped.inputs[0].witness.clear();
    assert_eq!(stripped.txid(), transaction.txid());
    assert_eq!(stripped.serialized_size(), 125);
    assert_eq!(stripped.vsize(), 125);

    Ok(())
}

#[test]
fn rejects_superfluous_segwit_marker() {
    pegin_test::init();

    let mut bytes = pegin_test::hex_bytes(SEGWIT_TX);
    // replace the witness stack item count with zero, and drop the items
    let witness_start = 4 + 2 + 125 - 4 - 4;
    bytes.truncate(witness_start);
    bytes.push(0);
    bytes.extend([0; 4]);

    assert!(Transaction::consensus_deserialize_exact(&bytes).is_err());
}
