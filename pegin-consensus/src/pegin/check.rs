//! The ordered peg-in acceptance rules.
//!
//! Rules run in a fixed order, and the first failure is the rejection
//! reason. Callers rely on this order: a transaction that breaks several
//! rules is always rejected for the same one.
//!
//! 1. [`parent_feerate_floor`]
//! 2. [`min_pegin_amount`]
//! 3. [`no_dust_outputs`]
//! 4. [`subsidy_sufficiency`]

use pegin_chain::{
    amount::{Amount, NonNegative, MAX_MONEY},
    block,
    transaction::{OutputKind, Transaction},
    FeeRate,
};
use pegin_state::PeginData;

use crate::{
    error::{PeginError, RejectReason, SubsidyError, TransactionError},
    Config,
};

use super::{claim, is_subsidy_active, ClaimSet, ProofSource};

/// Everything a verdict depends on, apart from the transaction itself.
#[derive(Copy, Clone, Debug)]
pub struct Context<'a> {
    /// The chain's peg-in parameters.
    pub config: &'a Config,

    /// The height the transaction is validated at: the height of the block
    /// being connected, or the tip height for the mempool.
    pub height: block::Height,

    /// The parent chain data for the transaction's claims, read from a
    /// single snapshot. Only used by validating nodes.
    pub parent_data: Option<&'a PeginData>,

    /// The fee rate the caller declared for an unvalidated peg-in.
    pub declared_feerate: Option<FeeRate>,
}

/// The outcome of evaluating a transaction.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Verdict {
    /// The transaction passes every peg-in rule.
    Accepted,

    /// The transaction breaks a peg-in rule.
    Rejected(RejectReason),
}

impl<T> From<Result<T, TransactionError>> for Verdict {
    fn from(result: Result<T, TransactionError>) -> Self {
        match result {
            Ok(_) => Verdict::Accepted,
            Err(error) => Verdict::Rejected(error.reject_reason()),
        }
    }
}

/// The peg-in facts about an accepted transaction.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PeginSummary {
    /// The number of peg-in claims.
    pub claims: usize,

    /// The total claimed value.
    pub claimed_value: Amount<NonNegative>,

    /// The burn subsidy the transaction had to pay, if the subsidy rule applied.
    pub required_subsidy: Option<Amount<NonNegative>>,
}

/// Evaluates every peg-in rule for `transaction`, and returns the verdict.
///
/// This is a pure function of the transaction and `context`.
pub fn evaluate(transaction: &Transaction, context: &Context<'_>) -> Verdict {
    let result = check_transaction(transaction, context);

    if let Err(error) = &result {
        tracing::debug!(
            reason = %error.reject_reason(),
            %error,
            "rejected claiming transaction"
        );
    }

    result.into()
}

/// Decodes and aggregates the claims of `transaction`, then checks the rules.
pub fn check_transaction(
    transaction: &Transaction,
    context: &Context<'_>,
) -> Result<PeginSummary, TransactionError> {
    let claims = claim::collect(transaction, context.config.validate_pegin)?;
    let claims = claim::aggregate(claims, context)?;

    check_claims(transaction, &claims, context)
}

/// Checks the rules for `transaction`, with its already aggregated `claims`.
pub fn check_claims(
    transaction: &Transaction,
    claims: &ClaimSet,
    context: &Context<'_>,
) -> Result<PeginSummary, TransactionError> {
    parent_feerate_floor(claims)?;
    min_pegin_amount(claims, context.config)?;
    no_dust_outputs(transaction, context.config.dust_relay_fee)?;
    tracing::trace!("passed peg-in policy checks");

    let required_subsidy = subsidy_sufficiency(transaction, claims, context)?;

    Ok(PeginSummary {
        claims: claims.claims.len(),
        claimed_value: claims.total_value,
        required_subsidy,
    })
}

/// Checks that every verified parent transaction paid at least
/// [`FeeRate::MIN_PARENT`].
///
/// Unvalidated claims have no known parent fee, so they always pass.
pub fn parent_feerate_floor(claims: &ClaimSet) -> Result<(), PeginError> {
    for resolved in &claims.claims {
        if let ProofSource::Verified { fee, parent_vsize } = resolved.source {
            if !FeeRate::MIN_PARENT.is_met_by(fee, parent_vsize) {
                return Err(PeginError::ParentFeerateTooLow {
                    txid: resolved.claim.outpoint.hash,
                    feerate: FeeRate::from_fee(fee, parent_vsize).unwrap_or_default(),
                    min: FeeRate::MIN_PARENT,
                });
            }
        }
    }

    Ok(())
}

/// Checks that the total claimed value is at least the minimum peg-in amount.
///
/// Only validating nodes enforce this rule: other nodes can't see through a
/// blinded claim.
pub fn min_pegin_amount(claims: &ClaimSet, config: &Config) -> Result<(), PeginError> {
    if !config.validate_pegin || claims.is_empty() {
        return Ok(());
    }

    if claims.total_value < config.pegin_min_amount {
        return Err(PeginError::PeginValueTooLow {
            value: claims.total_value,
            min: config.pegin_min_amount,
        });
    }

    Ok(())
}

/// Checks that no output is dust at `dust_relay_fee`.
///
/// Applies to every transaction, with or without peg-ins. Burn and fee
/// outputs are never dust.
pub fn no_dust_outputs(
    transaction: &Transaction,
    dust_relay_fee: FeeRate,
) -> Result<(), PeginError> {
    for (index, output) in transaction.outputs.iter().enumerate() {
        if output.is_dust(dust_relay_fee) {
            return Err(PeginError::Dust {
                index,
                value: output.value,
                // a threshold above all the money there is is reported as the maximum
                threshold: output
                    .dust_threshold(dust_relay_fee)
                    .unwrap_or(Amount::new(MAX_MONEY)),
            });
        }
    }

    Ok(())
}

/// Checks that a burn output covers the required subsidy, if one is required.
///
/// A subsidy is required once it is active at the context height, for claims
/// worth less than the threshold in total. A single burn output must cover
/// the whole subsidy: burn outputs are not added up.
///
/// Returns the required subsidy, or `None` if the rule didn't apply.
pub fn subsidy_sufficiency(
    transaction: &Transaction,
    claims: &ClaimSet,
    context: &Context<'_>,
) -> Result<Option<Amount<NonNegative>>, TransactionError> {
    let config = context.config;

    if claims.is_empty()
        || !is_subsidy_active(context.height, config)
        || claims.total_value >= config.pegin_subsidy_threshold
    {
        return Ok(None);
    }

    let required = match claims.required_subsidy(transaction.vsize()) {
        Ok(required) => required,
        Err(SubsidyError::FeerateRequired) => {
            tracing::trace!("no declared fee rate, skipping the subsidy check");
            return Ok(None);
        }
        Err(error) => return Err(error.into()),
    };

    let burn = transaction
        .outputs_of_kind(OutputKind::Burn)
        .map(|output| output.value)
        .max();

    // a zero subsidy doesn't need a burn output
    if burn.unwrap_or_default() >= required {
        Ok(Some(required))
    } else {
        Err(PeginError::SubsidyTooLow { burn, required }.into())
    }
}
