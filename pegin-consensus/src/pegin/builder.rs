//! Building claiming transactions from parent chain proof material.

use pegin_chain::{
    amount::{Amount, NonNegative},
    block, parent,
    script::Script,
    serialization::ConsensusDeserialize,
    transaction::{
        AssetId, Input, Output, OutputKind, ParentProof, PeginWitness, PeginWitnessError,
        Transaction,
    },
    FeeRate,
};
use pegin_state::ParentChainSnapshot;

use crate::{
    error::{ClaimError, MalformedClaim, PeginError, ProofError, SubsidyError, TransactionError},
    Config,
};

use super::{check, claim, is_subsidy_active, Context, PeginClaim};

/// Builds an unsigned claiming transaction for one parent chain output.
///
/// The transaction pays the claimed value to a destination script, minus a
/// burn subsidy when one is required, and minus the miner fee. Rules are
/// checked in the same order as [`check_transaction`](super::check_transaction),
/// and the built transaction is checked again before it is returned, so the
/// builder never produces a transaction this node would reject.
///
/// Fees and subsidies are priced on the transaction as built, including the
/// script witness given to [`ClaimBuilder::script_witness`]. Signers should
/// supply a witness of the final size.
#[derive(Clone, Debug)]
pub struct ClaimBuilder<'a> {
    config: &'a Config,
    height: block::Height,
    destination: Script,
    parent_chain: Option<&'a ParentChainSnapshot>,
    feerate: Option<FeeRate>,
    asset: AssetId,
    genesis_hash: parent::BlockHash,
    script_witness: Vec<Vec<u8>>,
}

impl<'a> ClaimBuilder<'a> {
    /// Creates a builder paying claims to `destination`, at the chain tip `height`.
    pub fn new(config: &'a Config, height: block::Height, destination: Script) -> Self {
        Self {
            config,
            height,
            destination,
            parent_chain: None,
            feerate: None,
            asset: AssetId([0; 32]),
            genesis_hash: parent::BlockHash([0; 32]),
            script_witness: Vec::new(),
        }
    }

    /// Uses `snapshot` to verify proofs. Required on validating nodes.
    pub fn parent_chain(mut self, snapshot: &'a ParentChainSnapshot) -> Self {
        self.parent_chain = Some(snapshot);
        self
    }

    /// Declares the fee rate used to price the subsidy on non-validating nodes.
    pub fn feerate(mut self, feerate: FeeRate) -> Self {
        self.feerate = Some(feerate);
        self
    }

    /// Sets the pegged asset.
    pub fn asset(mut self, asset: AssetId) -> Self {
        self.asset = asset;
        self
    }

    /// Sets the parent chain genesis hash committed to in the peg-in witness.
    pub fn genesis_hash(mut self, genesis_hash: parent::BlockHash) -> Self {
        self.genesis_hash = genesis_hash;
        self
    }

    /// Sets the claiming input's script witness.
    pub fn script_witness(mut self, script_witness: Vec<Vec<u8>>) -> Self {
        self.script_witness = script_witness;
        self
    }

    /// Builds a transaction claiming the output of `parent_transaction` that
    /// pays `claim_script`.
    ///
    /// `parent_transaction` and `txout_proof` are consensus serialized, as
    /// returned by the parent chain's `getrawtransaction` and `gettxoutproof`.
    #[tracing::instrument(skip_all, fields(height = %self.height))]
    pub fn build(
        &self,
        parent_transaction: &[u8],
        txout_proof: &[u8],
        claim_script: &Script,
    ) -> Result<Transaction, ClaimError> {
        let config = self.config;

        let claim = self.decode(parent_transaction, txout_proof, claim_script)?;
        let parent_data = self
            .parent_chain
            .map(|snapshot| snapshot.pegin_data(&claim::lookups(std::slice::from_ref(&claim))));

        let context = Context {
            config,
            height: self.height,
            parent_data: parent_data.as_ref(),
            declared_feerate: self.feerate,
        };

        let claims = claim::aggregate(vec![claim.clone()], &context).map_err(claim_error)?;
        let value = claims.total_value;

        match check::parent_feerate_floor(&claims) {
            Err(PeginError::ParentFeerateTooLow { feerate, .. }) => {
                return Err(ClaimError::ParentFeerateTooLow { feerate })
            }
            Err(error) => return Err(TransactionError::from(error).into()),
            Ok(()) => {}
        }

        // The builder always has the parent output, so the minimum applies on every node.
        if value < config.pegin_min_amount {
            return Err(ClaimError::PeginValueTooLow {
                value,
                min: config.pegin_min_amount,
            });
        }

        let needs_subsidy =
            is_subsidy_active(self.height, config) && value < config.pegin_subsidy_threshold;

        // Output values don't change the serialized size, so the template
        // has the final virtual size.
        let mut transaction = self.template(&claim, needs_subsidy)?;
        let vsize = transaction.vsize();

        let subsidy = if needs_subsidy {
            match claims.required_subsidy(vsize) {
                Ok(subsidy) => subsidy,
                Err(SubsidyError::FeerateRequired) => return Err(ClaimError::FeerateRequired),
                Err(SubsidyError::Amount(error)) => return Err(error.into()),
            }
        } else {
            Amount::zero()
        };
        let fee = config.min_relay_fee.fee(vsize)?;

        let payment = (value - subsidy).and_then(|remaining| remaining - fee);
        let Ok(payment) = payment else {
            tracing::warn!(
                %value,
                %subsidy,
                %fee,
                "peg-in value does not cover its subsidy and fee"
            );
            return Err(ClaimError::Dust);
        };

        for output in &mut transaction.outputs {
            output.value = match output.kind() {
                OutputKind::Payment => payment,
                OutputKind::Burn => subsidy,
                OutputKind::Fee => fee,
            };
        }

        if transaction.outputs[0].is_dust(config.dust_relay_fee) {
            tracing::warn!(
                %payment,
                dust_relay_fee = %config.dust_relay_fee,
                "peg-in payment output would be dust"
            );
            return Err(ClaimError::Dust);
        }

        check::check_transaction(&transaction, &context)?;

        tracing::debug!(
            hash = %transaction.hash(),
            %value,
            %subsidy,
            %fee,
            vsize,
            "built claiming transaction"
        );

        Ok(transaction)
    }

    /// Decodes the proof material, and finds the output paying `claim_script`.
    ///
    /// Non-validating nodes can't check the proof's block, but the proof must
    /// still include the parent transaction.
    fn decode(
        &self,
        parent_transaction: &[u8],
        txout_proof: &[u8],
        claim_script: &Script,
    ) -> Result<PeginClaim, ClaimError> {
        let transaction = parent::Transaction::consensus_deserialize_exact(parent_transaction)
            .map_err(|error| MalformedClaim::from(PeginWitnessError::ParentTransaction(error)))?;
        let proof = parent::TxOutProof::consensus_deserialize_exact(txout_proof)
            .map_err(|error| MalformedClaim::from(PeginWitnessError::Proof(error)))?;

        let txid = transaction.txid();
        if !proof.proves(txid).map_err(ProofError::from)? {
            return Err(ProofError::NotIncluded(txid).into());
        }

        let (index, output) = transaction
            .outputs
            .iter()
            .enumerate()
            .find(|(_, output)| &output.lock_script == claim_script)
            .ok_or(ProofError::OutputNotFound(txid))?;
        let index = u32::try_from(index).map_err(|_| ProofError::OutputNotFound(txid))?;
        let claimed_value = output.value;

        Ok(PeginClaim {
            input_index: 0,
            outpoint: parent::OutPoint { hash: txid, index },
            claimed_value,
            claim_script: claim_script.clone(),
            parent: Some(ParentProof { transaction, proof }),
        })
    }

    /// Returns the unsigned transaction for `claim`, with zero output values.
    ///
    /// Outputs are `[payment, burn, fee]`, without the burn output if no
    /// subsidy is needed.
    fn template(
        &self,
        claim: &PeginClaim,
        needs_subsidy: bool,
    ) -> Result<Transaction, ClaimError> {
        let witness = PeginWitness {
            value: claim.claimed_value,
            asset: self.asset,
            genesis_hash: self.genesis_hash,
            claim_script: claim.claim_script.clone(),
            parent: claim.parent.clone(),
        };

        let output = |lock_script| Output {
            asset: self.asset,
            value: Amount::<NonNegative>::zero(),
            lock_script,
        };

        let mut outputs = vec![output(self.destination.clone())];
        if needs_subsidy {
            outputs.push(output(Script::burn()));
        }
        outputs.push(output(Script::default()));

        if outputs[0].kind() != OutputKind::Payment {
            return Err(ClaimError::InvalidDestination);
        }

        Ok(Transaction {
            version: 2,
            inputs: vec![Input::PegIn {
                outpoint: claim.outpoint,
                unlock_script: Script::default(),
                sequence: u32::MAX,
                witness: self.script_witness.clone(),
                pegin_witness: witness.to_stack(),
            }],
            outputs,
            lock_time: 0,
        })
    }
}

/// Converts a claim aggregation error into the matching construction error.
fn claim_error(error: TransactionError) -> ClaimError {
    match error {
        TransactionError::MalformedClaim { source, .. } => ClaimError::MalformedClaim(source),
        TransactionError::Proof { source, .. } => ClaimError::Proof(source),
        error => ClaimError::Rejected(error),
    }
}
