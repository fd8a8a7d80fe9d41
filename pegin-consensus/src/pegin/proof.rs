//! Parent chain proof verification.

use pegin_chain::{
    amount::{Amount, NonNegative},
    parent,
    transaction::ParentProof,
};
use pegin_state::ClaimData;

use crate::error::ProofError;

use super::PeginClaim;

/// What a verified proof tells us about a claim.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VerifiedOutput {
    /// The value of the claimed parent output.
    pub value: Amount<NonNegative>,

    /// The fee paid by the parent transaction.
    pub fee: Amount<NonNegative>,

    /// The virtual size of the parent transaction.
    pub parent_vsize: u64,
}

/// Verifies `claim` against the parent chain.
///
/// `parent` is the claim's proof material, and `data` is the parent chain's
/// answer to the claim's [`PeginClaim::lookup`], read when the best height
/// was `best_height`.
///
/// The proof's block must be in the parent chain, with at least
/// `confirmation_depth` confirmations, and the claimed output must pay the
/// claim script.
pub fn verify(
    claim: &PeginClaim,
    parent: &ParentProof,
    data: &ClaimData,
    best_height: Option<u32>,
    confirmation_depth: u32,
) -> Result<VerifiedOutput, ProofError> {
    let txid = parent.transaction.txid();
    if txid != claim.outpoint.hash {
        return Err(ProofError::WrongTransaction {
            claimed: claim.outpoint,
            actual: txid,
        });
    }

    if !parent.proof.proves(txid)? {
        return Err(ProofError::NotIncluded(txid));
    }

    let block = data
        .block
        .ok_or_else(|| ProofError::UnknownBlock(parent.proof.header.hash()))?;

    let depth = best_height
        .and_then(|best_height| best_height.checked_sub(block.height))
        .map_or(0, |below_tip| below_tip + 1);
    if depth < confirmation_depth {
        return Err(ProofError::TooShallow {
            depth,
            required: confirmation_depth,
        });
    }

    let output = parent
        .transaction
        .output(claim.outpoint.index)
        .filter(|output| output.lock_script == claim.claim_script)
        .ok_or(ProofError::OutputNotFound(txid))?;

    let fee = parent_fee(&parent.transaction, &data.prevouts)?;

    tracing::trace!(%txid, block_height = block.height, depth, %fee, "verified peg-in proof");

    Ok(VerifiedOutput {
        value: output.value,
        fee,
        parent_vsize: parent.transaction.vsize(),
    })
}

/// Returns the fee `transaction` paid, given the outputs it spends, in input order.
pub fn parent_fee(
    transaction: &parent::Transaction,
    prevouts: &[Option<parent::Output>],
) -> Result<Amount<NonNegative>, ProofError> {
    if prevouts.len() != transaction.inputs.len() {
        return Err(ProofError::Lookup(format!(
            "got {} spent outputs for {} parent transaction inputs",
            prevouts.len(),
            transaction.inputs.len(),
        )));
    }

    let mut spent = Amount::<NonNegative>::zero();
    for (input, prevout) in transaction.inputs.iter().zip(prevouts) {
        let prevout = prevout
            .as_ref()
            .ok_or(ProofError::UnknownPrevout(input.previous_output))?;
        spent = (spent + prevout.value).map_err(ProofError::Fee)?;
    }

    let paid = transaction.total_output_value().map_err(ProofError::Fee)?;

    (spent - paid).map_err(ProofError::Fee)
}
