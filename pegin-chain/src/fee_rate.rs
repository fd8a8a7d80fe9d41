//! Fee rates, in satoshis per 1000 virtual bytes.
//!
//! Fee rates come from two places:
//! - node configuration, where relay fee rates are decimal coin amounts per
//!   1000 virtual bytes (`"0.00000100"` is 100 sat/kvB), and
//! - callers claiming a peg-in on a node that doesn't validate peg-ins, who
//!   declare the parent transaction's fee rate in sat/vB (`"2.3"`).
//!
//! Both are parsed into integers without any floating point.

use std::{fmt, str::FromStr};

use crate::{
    amount::{self, Amount, NonNegative},
    serialization::SerializationError,
};

#[cfg(test)]
mod tests;

/// The number of virtual bytes a fee rate is expressed over.
const KVB: u64 = 1000;

/// A fee rate, in satoshis per 1000 virtual bytes.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[cfg_attr(
    any(test, feature = "proptest-impl"),
    derive(proptest_derive::Arbitrary)
)]
pub struct FeeRate {
    sat_per_kvb: u64,
}

impl FeeRate {
    /// The lowest fee rate a parent transaction can pay and still fund a peg-in: 1 sat/vB.
    pub const MIN_PARENT: FeeRate = FeeRate::from_sat_per_vb(1);

    /// Creates a fee rate from satoshis per 1000 virtual bytes.
    pub const fn from_sat_per_kvb(sat_per_kvb: u64) -> Self {
        Self { sat_per_kvb }
    }

    /// Creates a fee rate from whole satoshis per virtual byte.
    pub const fn from_sat_per_vb(sat_per_vb: u64) -> Self {
        Self {
            sat_per_kvb: sat_per_vb.saturating_mul(KVB),
        }
    }

    /// Returns the fee rate that `fee` pays over `vsize` virtual bytes, rounded down.
    ///
    /// Returns `None` for a zero `vsize`.
    pub fn from_fee(fee: Amount<NonNegative>, vsize: u64) -> Option<Self> {
        let sat_per_kvb = u128::from(u64::from(fee))
            .checked_mul(u128::from(KVB))?
            .checked_div(u128::from(vsize))?;

        Some(Self {
            sat_per_kvb: sat_per_kvb.try_into().unwrap_or(u64::MAX),
        })
    }

    /// Returns this fee rate in satoshis per 1000 virtual bytes.
    pub fn sat_per_kvb(&self) -> u64 {
        self.sat_per_kvb
    }

    /// Returns the fee for `vsize` virtual bytes at this rate.
    ///
    /// The fee is rounded up to the next whole satoshi, so it never
    /// under-charges.
    pub fn fee(&self, vsize: u64) -> Result<Amount<NonNegative>, amount::Error> {
        let numerator = u128::from(self.sat_per_kvb) * u128::from(vsize);
        let fee = numerator.div_ceil(u128::from(KVB));

        i128::try_from(fee)
            .expect("a u64 product divided by 1000 always fits in i128")
            .try_into()
    }

    /// Returns true if `fee` paid over `vsize` virtual bytes is at least this rate.
    pub fn is_met_by(&self, fee: Amount<NonNegative>, vsize: u64) -> bool {
        u128::from(u64::from(fee)) * u128::from(KVB)
            >= u128::from(self.sat_per_kvb) * u128::from(vsize)
    }

    /// Parses a fee rate given in coins per 1000 virtual bytes, as relay fee
    /// rates are written in node configuration.
    pub fn from_coin_per_kvb_str(s: &str) -> Result<Self, amount::Error> {
        let sat_per_kvb = Amount::<NonNegative>::from_coin_str(s)?;

        Ok(Self::from_sat_per_kvb(sat_per_kvb.into()))
    }

    /// Formats this fee rate in coins per 1000 virtual bytes.
    pub fn to_coin_per_kvb_string(&self) -> String {
        amount::format_coins(self.sat_per_kvb)
    }
}

/// Fee rates are displayed in sat/vB, with three decimal places.
impl fmt::Display for FeeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:03} sat/vB",
            self.sat_per_kvb / KVB,
            self.sat_per_kvb % KVB
        )
    }
}

/// Parses a decimal fee rate in sat/vB, with at most three decimal places.
///
/// ```
/// # use pegin_chain::FeeRate;
/// assert_eq!("2.3".parse::<FeeRate>().unwrap(), FeeRate::from_sat_per_kvb(2300));
/// assert_eq!("10.01".parse::<FeeRate>().unwrap(), FeeRate::from_sat_per_kvb(10010));
/// assert!("0.0001".parse::<FeeRate>().is_err());
/// ```
impl FromStr for FeeRate {
    type Err = SerializationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use SerializationError::Parse;

        let (whole, fraction) = s.split_once('.').unwrap_or((s, ""));

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction)
        {
            return Err(Parse("fee rate must be a non-negative decimal number of sat/vB"));
        }
        if fraction.len() > 3 {
            return Err(Parse("fee rate must have at most 3 decimal places"));
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| Parse("fee rate is too large"))?
        };
        let fraction: u64 = if fraction.is_empty() {
            0
        } else {
            format!("{fraction:0<3}")
                .parse()
                .map_err(|_| Parse("fee rate must be a non-negative decimal number of sat/vB"))?
        };

        let sat_per_kvb = whole
            .checked_mul(KVB)
            .and_then(|sats| sats.checked_add(fraction))
            .ok_or(Parse("fee rate is too large"))?;

        Ok(Self::from_sat_per_kvb(sat_per_kvb))
    }
}

/// Serde helpers for fee rates written as decimal coins per 1000 virtual bytes.
///
/// Use with `#[serde(with = "pegin_chain::fee_rate::coin_per_kvb")]`.
pub mod coin_per_kvb {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::FeeRate;

    /// Serialize a fee rate as a decimal coin string per 1000 virtual bytes.
    pub fn serialize<S>(fee_rate: &FeeRate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&fee_rate.to_coin_per_kvb_string())
    }

    /// Deserialize a fee rate from a decimal coin string per 1000 virtual bytes.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<FeeRate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let coins = String::deserialize(deserializer)?;

        FeeRate::from_coin_per_kvb_str(&coins).map_err(de::Error::custom)
    }
}
