//! Extracting and aggregating the peg-in claims of a claiming transaction.

use std::collections::HashSet;

use pegin_chain::{
    amount::{Amount, NonNegative},
    parent,
    script::Script,
    transaction::{ParentProof, PeginWitness, Transaction},
};
use pegin_state::ClaimLookup;

use crate::error::{MalformedClaim, ProofError, SubsidyError, TransactionError};

use super::{proof, subsidy, Context, ProofSource};

/// A peg-in claim, decoded from one input of a claiming transaction.
///
/// Claims only live for the duration of one transaction's verification.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PeginClaim {
    /// The index of the claiming input.
    pub input_index: usize,

    /// The claimed parent chain output.
    pub outpoint: parent::OutPoint,

    /// The value the witness asserts the parent output holds.
    pub claimed_value: Amount<NonNegative>,

    /// The script the parent output must pay.
    pub claim_script: Script,

    /// The parent transaction and its inclusion proof, if the witness has them.
    pub parent: Option<ParentProof>,
}

impl PeginClaim {
    /// Returns the parent chain data needed to verify this claim.
    pub fn lookup(&self) -> Option<ClaimLookup> {
        self.parent.as_ref().map(|parent| ClaimLookup {
            block_hash: parent.proof.header.hash(),
            prevouts: parent
                .transaction
                .inputs
                .iter()
                .map(|input| input.previous_output)
                .collect(),
        })
    }
}

/// A claim, with the source of its subsidy floor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedClaim {
    /// The claim.
    pub claim: PeginClaim,

    /// How the claim was checked.
    pub source: ProofSource,
}

/// All the claims of one transaction.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ClaimSet {
    /// The claims, in input order.
    pub claims: Vec<ResolvedClaim>,

    /// The sum of the claimed values.
    pub total_value: Amount<NonNegative>,
}

impl ClaimSet {
    /// Returns true if the transaction doesn't claim any peg-ins.
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Iterates over the subsidy floor sources of the claims.
    pub fn sources(&self) -> impl Iterator<Item = &ProofSource> {
        self.claims.iter().map(|claim| &claim.source)
    }

    /// Returns the burn subsidy these claims require in a claiming
    /// transaction of `claiming_vsize` virtual bytes.
    pub fn required_subsidy(
        &self,
        claiming_vsize: u64,
    ) -> Result<Amount<NonNegative>, SubsidyError> {
        subsidy::required_subsidy(self.sources(), claiming_vsize)
    }
}

/// Decodes the peg-in claims of `transaction`, in input order.
///
/// Validating nodes need the parent transaction and proof in every witness.
/// A parent output can only be claimed once per transaction.
pub fn collect(
    transaction: &Transaction,
    validate_pegin: bool,
) -> Result<Vec<PeginClaim>, TransactionError> {
    let mut claimed = HashSet::new();

    transaction
        .pegin_inputs()
        .map(|(index, outpoint, stack)| {
            let malformed = |source| TransactionError::MalformedClaim { index, source };

            let witness =
                PeginWitness::from_stack(stack).map_err(|error| malformed(error.into()))?;

            if validate_pegin && witness.parent.is_none() {
                return Err(malformed(MalformedClaim::MissingProof));
            }
            if !claimed.insert(outpoint) {
                return Err(malformed(MalformedClaim::DuplicateOutpoint(outpoint)));
            }

            Ok(PeginClaim {
                input_index: index,
                outpoint,
                claimed_value: witness.value,
                claim_script: witness.claim_script,
                parent: witness.parent,
            })
        })
        .collect()
}

/// Returns the parent chain lookups for `claims`, in claim order.
pub fn lookups(claims: &[PeginClaim]) -> Vec<ClaimLookup> {
    claims.iter().filter_map(PeginClaim::lookup).collect()
}

/// Resolves the subsidy source of each claim, and sums the claimed values.
///
/// On validating nodes, each claim's proof is checked against the parent
/// chain data in `context`, which must hold one entry per claim, from
/// [`lookups`]. Other nodes take the claimed values as asserted.
pub fn aggregate(
    claims: Vec<PeginClaim>,
    context: &Context<'_>,
) -> Result<ClaimSet, TransactionError> {
    let mut total_value = Amount::zero();
    let mut resolved = Vec::with_capacity(claims.len());

    for (position, claim) in claims.into_iter().enumerate() {
        let index = claim.input_index;

        let source = if context.config.validate_pegin {
            let parent = claim.parent.as_ref().ok_or(TransactionError::MalformedClaim {
                index,
                source: MalformedClaim::MissingProof,
            })?;
            let data = context.parent_data.and_then(|data| {
                data.claims
                    .get(position)
                    .map(|claim_data| (data.best_height, claim_data))
            });
            let (best_height, data) = data.ok_or_else(|| TransactionError::Proof {
                index,
                source: ProofError::Lookup("no parent chain data for this claim".to_string()),
            })?;

            let verified = proof::verify(
                &claim,
                parent,
                data,
                best_height,
                context.config.pegin_confirmation_depth,
            )
            .map_err(|source| TransactionError::Proof { index, source })?;

            if verified.value != claim.claimed_value {
                return Err(TransactionError::MalformedClaim {
                    index,
                    source: MalformedClaim::ValueMismatch {
                        claimed: claim.claimed_value,
                        actual: verified.value,
                    },
                });
            }

            ProofSource::Verified {
                fee: verified.fee,
                parent_vsize: verified.parent_vsize,
            }
        } else {
            ProofSource::Declared {
                feerate: context.declared_feerate,
            }
        };

        total_value = (total_value + claim.claimed_value).map_err(|error| {
            TransactionError::MalformedClaim {
                index,
                source: MalformedClaim::TotalValue(error),
            }
        })?;

        tracing::trace!(
            index,
            ?source,
            claimed_value = %claim.claimed_value,
            "resolved peg-in claim"
        );
        resolved.push(ResolvedClaim { claim, source });
    }

    Ok(ClaimSet {
        claims: resolved,
        total_value,
    })
}
