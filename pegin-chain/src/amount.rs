//! Strongly-typed satoshi amounts that prevent under/overflows.
//!
//! The [`Amount`] type is parameterized by a [`Constraint`] implementation that
//! declares the range of allowed values. In contrast to regular arithmetic
//! operations, which return values, arithmetic on [`Amount`]s returns
//! [`Result`](std::result::Result)s.
//!
//! Amounts are never represented as floating point numbers. Decimal coin
//! strings, like the ones in node configuration and RPC replies, are converted
//! with [`Amount::from_coin_str`] and [`Amount::to_coin_string`].

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
    ops::RangeInclusive,
    str::FromStr,
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::serialization::{ConsensusDeserialize, ConsensusSerialize, SerializationError};

#[cfg(any(test, feature = "proptest-impl"))]
pub mod arbitrary;

pub mod coin_string;

#[cfg(test)]
mod tests;

/// The result of an amount operation.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A runtime validated type for representing amounts of satoshis.
#[derive(Clone, Copy, Serialize, Deserialize, Default)]
#[serde(try_from = "i64")]
#[serde(into = "i64")]
#[serde(bound = "C: Constraint + Clone")]
pub struct Amount<C = NegativeAllowed>(
    /// The inner amount value, in satoshis.
    i64,
    /// Used for [`Constraint`] type inference.
    #[serde(skip)]
    PhantomData<C>,
);

impl<C> fmt::Display for Amount<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sats = self.sats();

        f.pad_integral(sats >= 0, "", &sats.unsigned_abs().to_string())
    }
}

impl<C> fmt::Debug for Amount<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(&format!("Amount<{}>", std::any::type_name::<C>()))
            .field(&self.0)
            .finish()
    }
}

impl Amount<NonNegative> {
    /// Create a new non-negative [`Amount`] from a provided value in whole coins.
    pub const fn new_from_coins(coin_value: i64) -> Self {
        match coin_value.checked_mul(COIN) {
            Some(sats) => Self::new(sats),
            None => panic!("coin value should fit in i64 satoshis"),
        }
    }

    /// Create a new non-negative [`Amount`] from a provided value in satoshis.
    ///
    /// # Panics
    ///
    /// If `sats` is outside `0..=MAX_MONEY`. Use `try_from` for untrusted values.
    pub const fn new(sats: i64) -> Self {
        assert!(sats <= MAX_MONEY && sats >= 0);
        Self(sats, PhantomData)
    }
}

impl<C> Amount<C> {
    /// Returns the number of satoshis in this amount.
    pub fn sats(&self) -> i64 {
        self.0
    }

    /// Create a zero `Amount`
    pub fn zero() -> Amount<C>
    where
        C: Constraint,
    {
        0i64.try_into().expect("an amount of 0 is always valid")
    }

    /// Formats this amount as a decimal coin string.
    ///
    /// The string always has at least two decimal places, and at most eight.
    /// Trailing zeros past the second decimal place are trimmed:
    ///
    /// ```
    /// # use pegin_chain::amount::{Amount, NonNegative};
    /// assert_eq!(Amount::<NonNegative>::new(100_000_000).to_coin_string(), "1.00");
    /// assert_eq!(Amount::<NonNegative>::new(50_000_000).to_coin_string(), "0.50");
    /// assert_eq!(Amount::<NonNegative>::new(99_999_999).to_coin_string(), "0.99999999");
    /// assert_eq!(Amount::<NonNegative>::new(1_350).to_coin_string(), "0.0000135");
    /// ```
    pub fn to_coin_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };

        format!("{sign}{}", format_coins(self.0.unsigned_abs()))
    }

    /// Parses a decimal coin string, with at most eight decimal places.
    ///
    /// Parsing is exact: no floating point is involved, and strings with more
    /// precision than a satoshi are rejected rather than rounded.
    pub fn from_coin_str(s: &str) -> Result<Amount<C>>
    where
        C: Constraint,
    {
        let invalid = || Error::InvalidCoinString {
            input: s.to_string(),
        };

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (whole, fraction) = match digits.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (digits, ""),
        };

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty())
            || !all_digits(whole)
            || !all_digits(fraction)
            || fraction.len() > COIN_DECIMALS
        {
            return Err(invalid());
        }

        let whole: i128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let fraction: i128 = if fraction.is_empty() {
            0
        } else {
            format!("{fraction:0<8}").parse().map_err(|_| invalid())?
        };

        let sats = whole
            .checked_mul(i128::from(COIN))
            .and_then(|sats| sats.checked_add(fraction))
            .ok_or_else(invalid)?;

        if negative {
            (-sats).try_into()
        } else {
            sats.try_into()
        }
    }
}

/// Formats an unsigned satoshi count as a coin string with two to eight decimals.
pub(crate) fn format_coins(sats: u64) -> String {
    let coin = COIN.unsigned_abs();

    let fraction = format!("{:08}", sats % coin);
    let fraction = fraction.trim_end_matches('0');

    format!("{}.{fraction:0<2}", sats / coin)
}

impl<C> FromStr for Amount<C>
where
    C: Constraint,
{
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_coin_str(s)
    }
}

impl<C> std::ops::Add<Amount<C>> for Amount<C>
where
    C: Constraint,
{
    type Output = Result<Amount<C>>;

    fn add(self, rhs: Amount<C>) -> Self::Output {
        let value = self
            .0
            .checked_add(rhs.0)
            .expect("adding two constrained Amounts is always within an i64");
        value.try_into()
    }
}

impl<C> std::ops::Add<Amount<C>> for Result<Amount<C>>
where
    C: Constraint,
{
    type Output = Result<Amount<C>>;

    fn add(self, rhs: Amount<C>) -> Self::Output {
        self? + rhs
    }
}

impl<C> std::ops::Sub<Amount<C>> for Amount<C>
where
    C: Constraint,
{
    type Output = Result<Amount<C>>;

    fn sub(self, rhs: Amount<C>) -> Self::Output {
        let value = self
            .0
            .checked_sub(rhs.0)
            .expect("subtracting two constrained Amounts is always within an i64");
        value.try_into()
    }
}

impl<C> std::ops::Sub<Amount<C>> for Result<Amount<C>>
where
    C: Constraint,
{
    type Output = Result<Amount<C>>;

    fn sub(self, rhs: Amount<C>) -> Self::Output {
        self? - rhs
    }
}

impl<C> From<Amount<C>> for i64 {
    fn from(amount: Amount<C>) -> Self {
        amount.0
    }
}

impl From<Amount<NonNegative>> for u64 {
    fn from(amount: Amount<NonNegative>) -> Self {
        amount.0.try_into().expect("non-negative i64 fits in u64")
    }
}

impl<C> TryFrom<i64> for Amount<C>
where
    C: Constraint,
{
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        C::validate(value).map(|v| Self(v, PhantomData))
    }
}

impl<C> TryFrom<u64> for Amount<C>
where
    C: Constraint,
{
    type Error = Error;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        let value = value.try_into().map_err(|source| Error::Convert {
            value: value.into(),
            source,
        })?;

        C::validate(value).map(|v| Self(v, PhantomData))
    }
}

/// Conversion from `i128` to `Amount`.
///
/// Used to handle the results of fee rate multiplication and coin string parsing.
impl<C> TryFrom<i128> for Amount<C>
where
    C: Constraint,
{
    type Error = Error;

    fn try_from(value: i128) -> Result<Self, Self::Error> {
        let value = value
            .try_into()
            .map_err(|source| Error::Convert { value, source })?;

        C::validate(value).map(|v| Self(v, PhantomData))
    }
}

impl<C> Hash for Amount<C> {
    /// Amounts with the same value are equal, even if they have different constraints
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<C1, C2> PartialEq<Amount<C2>> for Amount<C1> {
    fn eq(&self, other: &Amount<C2>) -> bool {
        self.0.eq(&other.0)
    }
}

impl<C> PartialEq<i64> for Amount<C> {
    fn eq(&self, other: &i64) -> bool {
        self.0.eq(other)
    }
}

impl<C> Eq for Amount<C> {}

impl<C1, C2> PartialOrd<Amount<C2>> for Amount<C1> {
    fn partial_cmp(&self, other: &Amount<C2>) -> Option<Ordering> {
        Some(self.0.cmp(&other.0))
    }
}

impl<C> Ord for Amount<C> {
    fn cmp(&self, other: &Amount<C>) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<C> std::iter::Sum<Amount<C>> for Result<Amount<C>>
where
    C: Constraint,
{
    fn sum<I: Iterator<Item = Amount<C>>>(mut iter: I) -> Self {
        let sum = iter.try_fold(Amount::zero(), |acc, amount| acc + amount);

        match sum {
            Ok(sum) => Ok(sum),
            Err(Error::Constraint { value, .. }) => Err(Error::SumOverflow {
                partial_sum: value,
                remaining_items: iter.count(),
            }),
            Err(unexpected_error) => unreachable!("unexpected Add error: {:?}", unexpected_error),
        }
    }
}

impl<'amt, C> std::iter::Sum<&'amt Amount<C>> for Result<Amount<C>>
where
    C: Constraint + Copy + 'amt,
{
    fn sum<I: Iterator<Item = &'amt Amount<C>>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Errors that can be returned when validating [`Amount`]s.
#[allow(missing_docs)]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("input {value} is outside of valid range for satoshi Amount, valid_range={range:?}")]
    Constraint {
        value: i64,
        range: RangeInclusive<i64>,
    },

    #[error("{value} could not be converted to an i64 Amount")]
    Convert {
        value: i128,
        source: std::num::TryFromIntError,
    },

    #[error(
        "overflow when summing i64 amounts; \
         partial sum: {partial_sum}, number of remaining items: {remaining_items}"
    )]
    SumOverflow {
        partial_sum: i64,
        remaining_items: usize,
    },

    #[error("{input:?} is not a decimal coin amount with at most 8 decimal places")]
    InvalidCoinString { input: String },
}

/// Marker type for `Amount` that allows negative values.
///
/// ```
/// # use pegin_chain::amount::{Constraint, MAX_MONEY, NegativeAllowed};
/// assert_eq!(
///     NegativeAllowed::valid_range(),
///     -MAX_MONEY..=MAX_MONEY,
/// );
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub struct NegativeAllowed;

impl Constraint for NegativeAllowed {
    fn valid_range() -> RangeInclusive<i64> {
        -MAX_MONEY..=MAX_MONEY
    }
}

/// Marker type for `Amount` that requires nonnegative values.
///
/// ```
/// # use pegin_chain::amount::{Constraint, MAX_MONEY, NonNegative};
/// assert_eq!(
///     NonNegative::valid_range(),
///     0..=MAX_MONEY,
/// );
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Default)]
pub struct NonNegative;

impl Constraint for NonNegative {
    fn valid_range() -> RangeInclusive<i64> {
        0..=MAX_MONEY
    }
}

/// Number of satoshis in 1 coin.
pub const COIN: i64 = 100_000_000;

/// Number of decimal places in a coin string.
pub const COIN_DECIMALS: usize = 8;

/// The maximum satoshi amount.
pub const MAX_MONEY: i64 = 21_000_000 * COIN;

/// A trait for defining constraints on `Amount`
pub trait Constraint {
    /// Returns the range of values that are valid under this constraint
    fn valid_range() -> RangeInclusive<i64>;

    /// Check if an input value is within the valid range
    fn validate(value: i64) -> Result<i64, Error> {
        let range = Self::valid_range();

        if !range.contains(&value) {
            Err(Error::Constraint { value, range })
        } else {
            Ok(value)
        }
    }
}

/// Amounts are serialized as 8-byte little-endian signed integers, in both
/// parent-chain outputs and peg-in witnesses.
impl<C> ConsensusSerialize for Amount<C> {
    fn consensus_serialize<W: std::io::Write>(&self, mut writer: W) -> Result<(), std::io::Error> {
        writer.write_i64::<LittleEndian>(self.0)
    }
}

impl<C> ConsensusDeserialize for Amount<C>
where
    C: Constraint,
{
    fn consensus_deserialize<R: std::io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        Ok(reader.read_i64::<LittleEndian>()?.try_into()?)
    }
}
