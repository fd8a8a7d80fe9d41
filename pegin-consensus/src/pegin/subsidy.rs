//! Burn subsidy calculation.
//!
//! All amounts are whole satoshis. Declared fee rates are applied with
//! integer arithmetic, rounding up.

use pegin_chain::{
    amount::{Amount, NonNegative},
    FeeRate,
};

use crate::error::SubsidyError;

/// Where a claim's subsidy floor comes from.
///
/// Resolved once per claim: validating nodes know the parent transaction's
/// fee, other nodes only have the fee rate the caller declared, if any.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ProofSource {
    /// The parent transaction was verified against the parent chain.
    Verified {
        /// The fee the parent transaction paid.
        fee: Amount<NonNegative>,
        /// The parent transaction's virtual size.
        parent_vsize: u64,
    },

    /// The claim was taken as asserted.
    Declared {
        /// The fee rate declared by the caller, in sat/vB.
        feerate: Option<FeeRate>,
    },
}

impl ProofSource {
    /// Returns the fee rate the parent transaction paid, if it was verified.
    pub fn parent_feerate(&self) -> Option<FeeRate> {
        match self {
            ProofSource::Verified { fee, parent_vsize } => FeeRate::from_fee(*fee, *parent_vsize),
            ProofSource::Declared { .. } => None,
        }
    }
}

/// Returns the burn subsidy required by claims with `sources`, in a claiming
/// transaction of `claiming_vsize` virtual bytes.
///
/// Each verified claim requires its parent transaction's fee, exactly. A
/// declared fee rate prices the claiming transaction itself, so it is
/// charged once per transaction, however many claims share it.
///
/// Returns [`SubsidyError::FeerateRequired`] if a declared claim has no fee rate.
pub fn required_subsidy<'a>(
    sources: impl IntoIterator<Item = &'a ProofSource>,
    claiming_vsize: u64,
) -> Result<Amount<NonNegative>, SubsidyError> {
    let mut required = Amount::zero();
    let mut declared = None;

    for source in sources {
        match source {
            ProofSource::Verified { fee, .. } => required = (required + *fee)?,
            ProofSource::Declared { feerate } => declared = Some(*feerate),
        }
    }

    if let Some(feerate) = declared {
        let feerate = feerate.ok_or(SubsidyError::FeerateRequired)?;
        required = (required + feerate.fee(claiming_vsize)?)?;
    }

    Ok(required)
}
