//! Peg-in parameters for a sidechain.

use serde::{Deserialize, Serialize};

use pegin_chain::{
    amount::{self, Amount, NonNegative},
    block,
    fee_rate::{self, FeeRate},
};

use crate::pegin::is_subsidy_active;

/// The default dust relay fee rate: 0.1 sat/vB.
const DEFAULT_DUST_RELAY_FEE: FeeRate = FeeRate::from_sat_per_kvb(100);

/// The default minimum relay fee rate: 0.1 sat/vB.
const DEFAULT_MIN_RELAY_FEE: FeeRate = FeeRate::from_sat_per_kvb(100);

/// Peg-in validation parameters.
///
/// Loaded once when the node starts, and never changed while it runs.
/// Amounts and fee rates are written as decimal coin strings:
///
/// ```toml
/// validate_pegin = true
/// pegin_min_amount = "1.0"
/// pegin_subsidy_threshold = "2.0"
/// pegin_subsidy_height = 1000
/// dust_relay_fee = "0.00000100"
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// Should this node check peg-in proofs and values against its own view
    /// of the parent chain?
    ///
    /// # Security
    ///
    /// Nodes that don't validate peg-ins accept the claimed values as given.
    /// They can't enforce [`Config::pegin_min_amount`], the parent fee rate
    /// floor, or a subsidy based on the parent transaction's fee.
    pub validate_pegin: bool,

    /// The smallest total value a transaction can peg in.
    ///
    /// Only enforced by validating nodes.
    #[serde(with = "amount::coin_string")]
    pub pegin_min_amount: Amount<NonNegative>,

    /// Peg-ins with a total value below this amount must burn a subsidy,
    /// once the subsidy is active.
    ///
    /// Zero means no peg-in ever needs a subsidy.
    #[serde(with = "amount::coin_string")]
    pub pegin_subsidy_threshold: Amount<NonNegative>,

    /// The first height where peg-in subsidies are required.
    pub pegin_subsidy_height: block::Height,

    /// How many parent chain confirmations a peg-in proof's block needs.
    pub pegin_confirmation_depth: u32,

    /// Outputs worth less than the fee for spending them at this rate are dust.
    #[serde(with = "fee_rate::coin_per_kvb")]
    pub dust_relay_fee: FeeRate,

    /// The fee rate paid by the claiming transactions this node builds.
    #[serde(with = "fee_rate::coin_per_kvb")]
    pub min_relay_fee: FeeRate,
}

// we like our default configs to be explicit
#[allow(unknown_lints)]
#[allow(clippy::derivable_impls)]
impl Default for Config {
    fn default() -> Self {
        Self {
            validate_pegin: true,
            pegin_min_amount: Amount::zero(),
            pegin_subsidy_threshold: Amount::zero(),
            pegin_subsidy_height: block::Height::MAX,
            pegin_confirmation_depth: 1,
            dust_relay_fee: DEFAULT_DUST_RELAY_FEE,
            min_relay_fee: DEFAULT_MIN_RELAY_FEE,
        }
    }
}

impl Config {
    /// Reports the peg-in parameters, and whether the subsidy is active at `tip_height`.
    pub fn sidechain_info(&self, tip_height: block::Height) -> SidechainInfo {
        SidechainInfo {
            pegin_min_amount: self.pegin_min_amount,
            pegin_subsidy_threshold: self.pegin_subsidy_threshold,
            pegin_subsidy_height: self.pegin_subsidy_height,
            pegin_subsidy_active: is_subsidy_active(tip_height, self),
            pegin_confirmation_depth: self.pegin_confirmation_depth,
            validate_pegin: self.validate_pegin,
        }
    }
}

/// The peg-in fields of a sidechain info report.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SidechainInfo {
    /// The minimum peg-in amount, as a coin string like `"1.00"`.
    #[serde(with = "amount::coin_string")]
    pub pegin_min_amount: Amount<NonNegative>,

    /// The subsidy threshold, as a coin string like `"2.00"`.
    #[serde(with = "amount::coin_string")]
    pub pegin_subsidy_threshold: Amount<NonNegative>,

    /// The subsidy activation height.
    pub pegin_subsidy_height: block::Height,

    /// Is the subsidy active at the tip?
    pub pegin_subsidy_active: bool,

    /// The parent chain confirmations a peg-in needs.
    pub pegin_confirmation_depth: u32,

    /// Does this node validate peg-ins?
    pub validate_pegin: bool,
}
