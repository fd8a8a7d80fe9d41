//! Shared fixtures for peg-in tests: a fake parent chain, and claiming
//! transactions spending its peg-ins.

use std::sync::Arc;

use pegin_chain::{
    amount::{Amount, NonNegative, COIN},
    block, parent,
    parent::arbitrary::{fake_header, fake_proof, funding_transaction, spending_transaction},
    script::Script,
    serialization::ConsensusSerialize,
    transaction::{AssetId, Input, Output, PeginWitness, Transaction},
    FeeRate,
};
use pegin_state::{ParentChainSnapshot, ParentChainState, PeginData, ReadStateService};

use crate::{pegin::claim, Config};

/// The height the subsidy activates at, in [`config`].
pub const SUBSIDY_HEIGHT: block::Height = block::Height(100);

/// The asset all fixtures use.
pub const ASSET: AssetId = AssetId([0x25; 32]);

/// The miner fee paid by fixture claiming transactions.
pub const CLAIM_FEE: Amount<NonNegative> = Amount::new(363);

/// Returns `coins / 100` whole coins as an amount, so `cents(150)` is 1.5 coins.
pub fn cents(coins: i64) -> Amount<NonNegative> {
    Amount::new(coins * COIN / 100)
}

/// Returns an amount of `sats` satoshis.
pub fn sats(sats: i64) -> Amount<NonNegative> {
    Amount::new(sats)
}

/// Peg-in parameters: a 2.0 coin threshold from [`SUBSIDY_HEIGHT`], no
/// minimum amount.
pub fn config(validate_pegin: bool) -> Config {
    Config {
        validate_pegin,
        pegin_subsidy_threshold: cents(200),
        pegin_subsidy_height: SUBSIDY_HEIGHT,
        ..Config::default()
    }
}

/// The P2WSH script every fixture peg-in pays.
pub fn claim_script() -> Script {
    let mut script = vec![0x00, 0x20];
    script.extend_from_slice(&[0x42; 32]);

    Script::new(&script)
}

/// A P2WPKH destination on the sidechain.
pub fn destination() -> Script {
    let mut script = vec![0x00, 0x14];
    script.extend_from_slice(&[0x75; 20]);

    Script::new(&script)
}

/// A payment output.
pub fn payment(value: Amount<NonNegative>) -> Output {
    Output {
        asset: ASSET,
        value,
        lock_script: destination(),
    }
}

/// A burn output.
pub fn burn(value: Amount<NonNegative>) -> Output {
    Output {
        asset: ASSET,
        value,
        lock_script: Script::burn(),
    }
}

/// A miner fee output.
pub fn fee(value: Amount<NonNegative>) -> Output {
    Output {
        asset: ASSET,
        value,
        lock_script: Script::default(),
    }
}

/// A parent chain output paid to [`claim_script`], mined with its inclusion proof.
#[derive(Clone, Debug)]
pub struct PegIn {
    /// The parent transaction.
    pub transaction: parent::Transaction,

    /// The proof of the transaction's inclusion in its block.
    pub proof: parent::TxOutProof,

    /// The fee the parent transaction paid.
    pub fee: Amount<NonNegative>,
}

impl PegIn {
    /// The claimed output, which is always output 0.
    pub fn outpoint(&self) -> parent::OutPoint {
        parent::OutPoint {
            hash: self.transaction.txid(),
            index: 0,
        }
    }

    /// The claimed value.
    pub fn value(&self) -> Amount<NonNegative> {
        self.transaction.outputs[0].value
    }

    /// The complete peg-in witness for this output.
    pub fn witness(&self) -> PeginWitness {
        PeginWitness {
            value: self.value(),
            asset: ASSET,
            genesis_hash: parent::BlockHash([0x06; 32]),
            claim_script: claim_script(),
            parent: Some(pegin_chain::transaction::ParentProof {
                transaction: self.transaction.clone(),
                proof: self.proof.clone(),
            }),
        }
    }

    /// A signed-size input claiming this output.
    pub fn input(&self) -> Input {
        self.input_with_witness(self.witness())
    }

    /// An input claiming this output, with a custom peg-in witness.
    pub fn input_with_witness(&self, witness: PeginWitness) -> Input {
        Input::PegIn {
            outpoint: self.outpoint(),
            unlock_script: Script::default(),
            sequence: u32::MAX,
            witness: vec![vec![0x30; 71], vec![0x02; 33]],
            pegin_witness: witness.to_stack(),
        }
    }

    /// The serialized parent transaction.
    pub fn transaction_bytes(&self) -> Vec<u8> {
        self.transaction
            .consensus_serialize_to_vec()
            .expect("vec writes are infallible")
    }

    /// The serialized inclusion proof.
    pub fn proof_bytes(&self) -> Vec<u8> {
        self.proof
            .consensus_serialize_to_vec()
            .expect("vec writes are infallible")
    }
}

/// Returns a claiming transaction with an input for each of `pegins`.
pub fn claiming_transaction(pegins: &[&PegIn], outputs: Vec<Output>) -> Transaction {
    Transaction {
        version: 2,
        inputs: pegins.iter().map(|pegin| pegin.input()).collect(),
        outputs,
        lock_time: 0,
    }
}

/// A fake parent chain, with a writer and a read service.
pub struct ParentChain {
    state: ParentChainState,
    read_service: ReadStateService,
    tip: parent::BlockHash,
    next_tag: u32,
}

impl Default for ParentChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ParentChain {
    /// Returns a parent chain with a single block.
    pub fn new() -> Self {
        let (state, read_service) = pegin_state::init(0);

        let mut chain = Self {
            state,
            read_service,
            tip: parent::BlockHash([0; 32]),
            next_tag: 0,
        };
        chain.mine_empty(1);

        chain
    }

    fn next_tag(&mut self) -> u32 {
        self.next_tag += 1;
        self.next_tag
    }

    /// Mines a block with `transactions` on top of the tip.
    pub fn mine(&mut self, transactions: Vec<parent::Transaction>) -> parent::Header {
        let txids: Vec<_> = transactions.iter().map(|tx| tx.txid()).collect();
        let header = fake_header(self.tip, &txids, self.next_tag());

        self.tip = self
            .state
            .commit_block(header, transactions.into_iter().map(Arc::new).collect())
            .expect("fake blocks extend the tip");

        header
    }

    /// Mines `count` blocks without peg-ins.
    pub fn mine_empty(&mut self, count: u32) {
        for _ in 0..count {
            let tag = self.next_tag();
            self.mine(vec![funding_transaction(
                tag,
                Amount::new(50 * COIN),
                Script::new(&[0x51]),
            )]);
        }
    }

    /// Mines a parent transaction paying `value` to [`claim_script`] at
    /// `feerate`, in a new block.
    pub fn peg_in(&mut self, value: Amount<NonNegative>, feerate: FeeRate) -> PegIn {
        let claim_output = parent::Output {
            value,
            lock_script: claim_script(),
        };

        // Values and the spent outpoint don't change the size.
        let template = spending_transaction(
            parent::OutPoint {
                hash: parent::Txid([0; 32]),
                index: 0,
            },
            vec![claim_output.clone()],
        );
        let fee = feerate
            .fee(template.vsize())
            .expect("fixture fees are small");

        let tag = self.next_tag();
        let funding = funding_transaction(
            tag,
            (value + fee).expect("fixture values are small"),
            Script::new(&[0x51]),
        );
        let transaction = spending_transaction(
            parent::OutPoint {
                hash: funding.txid(),
                index: 0,
            },
            vec![claim_output],
        );

        let txids = [funding.txid(), transaction.txid()];
        let header = self.mine(vec![funding, transaction.clone()]);

        PegIn {
            transaction,
            proof: fake_proof(header, &txids, 1),
            fee,
        }
    }

    /// Returns the current parent chain snapshot.
    pub fn snapshot(&self) -> Arc<ParentChainSnapshot> {
        self.state.snapshot()
    }

    /// Returns a read service for this parent chain.
    pub fn read_service(&self) -> ReadStateService {
        self.read_service.clone()
    }

    /// Returns the parent chain data for the claims in `transaction`.
    pub fn pegin_data(&self, transaction: &Transaction) -> PeginData {
        let claims = claim::collect(transaction, false).unwrap_or_default();

        self.snapshot().pegin_data(&claim::lookups(&claims))
    }
}
