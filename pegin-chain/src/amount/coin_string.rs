//! Serde helpers for amounts written as decimal coin strings.
//!
//! Use with `#[serde(with = "pegin_chain::amount::coin_string")]`:
//! `"2.0"` deserializes to `200_000_000` satoshis, and amounts serialize with
//! [`Amount::to_coin_string`].

use serde::{de, Deserialize, Deserializer, Serializer};

use super::{Amount, Constraint};

/// Serialize an amount as a decimal coin string.
pub fn serialize<S, C>(amount: &Amount<C>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&amount.to_coin_string())
}

/// Deserialize an amount from a decimal coin string.
pub fn deserialize<'de, D, C>(deserializer: D) -> Result<Amount<C>, D::Error>
where
    D: Deserializer<'de>,
    C: Constraint,
{
    let coins = String::deserialize(deserializer)?;

    Amount::from_coin_str(&coins).map_err(de::Error::custom)
}
