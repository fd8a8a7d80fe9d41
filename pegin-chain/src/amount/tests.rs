//! Fixed test vectors and property tests for amounts.

use proptest::prelude::*;

use color_eyre::eyre::Result;

use crate::serialization::{ConsensusDeserializeInto, ConsensusSerialize};

use super::*;

#[test]
fn add_and_sub_stay_within_constraints() -> Result<()> {
    pegin_test::init();

    let one = Amount::<NonNegative>::new(1);
    let two = Amount::<NonNegative>::new(2);

    assert_eq!((one + one)?, two);
    assert_eq!((two - one)?, one);
    assert!((one - two).is_err());

    let max: Amount<NonNegative> = MAX_MONEY.try_into()?;
    assert!((max + one).is_err());

    Ok(())
}

#[test]
fn sum_reports_overflow() -> Result<()> {
    pegin_test::init();

    let max: Amount<NonNegative> = MAX_MONEY.try_into()?;
    let one = Amount::<NonNegative>::new(1);

    let sum: Result<Amount<NonNegative>, Error> = [max, one, one].into_iter().sum();
    assert_eq!(
        sum,
        Err(Error::SumOverflow {
            partial_sum: MAX_MONEY + 1,
            remaining_items: 1,
        })
    );

    let sum: Amount<NonNegative> = [one, one, one].iter().sum::<Result<_, _>>()?;
    assert_eq!(sum, 3);

    Ok(())
}

#[test]
fn coin_strings_use_two_to_eight_decimals() {
    pegin_test::init();

    let cases = [
        (0, "0.00"),
        (COIN, "1.00"),
        (2 * COIN, "2.00"),
        (COIN / 2, "0.50"),
        (99_999_999, "0.99999999"),
        (1_350, "0.0000135"),
        (1, "0.00000001"),
        (MAX_MONEY, "21000000.00"),
    ];

    for (sats, expected) in cases {
        let amount = Amount::<NonNegative>::new(sats);
        assert_eq!(amount.to_coin_string(), expected, "{sats} sats");
    }

    let negative: Amount<NegativeAllowed> = (-COIN / 4).try_into().expect("valid amount");
    assert_eq!(negative.to_coin_string(), "-0.25");
}

#[test]
fn coin_strings_parse_exactly() -> Result<()> {
    pegin_test::init();

    let parse = Amount::<NonNegative>::from_coin_str;

    assert_eq!(parse("2.0")?, 2 * COIN);
    assert_eq!(parse("2")?, 2 * COIN);
    assert_eq!(parse("0.5")?, COIN / 2);
    assert_eq!(parse(".5")?, COIN / 2);
    assert_eq!(parse("1.99999999")?, 199_999_999);
    assert_eq!(parse("0.00000001")?, 1);
    assert_eq!(parse("21000000")?, MAX_MONEY);

    // more precision than a satoshi
    assert!(parse("0.000000001").is_err());
    // out of range
    assert!(parse("21000000.00000001").is_err());
    assert!(parse("-1").is_err());
    // not a number
    assert!(parse("").is_err());
    assert!(parse(".").is_err());
    assert!(parse("1e8").is_err());
    assert!(parse("1.2.3").is_err());
    assert!(parse(" 1").is_err());

    assert_eq!(Amount::<NegativeAllowed>::from_coin_str("-0.25")?, -COIN / 4);

    Ok(())
}

#[test]
fn consensus_encoding_is_little_endian_i64() -> Result<()> {
    pegin_test::init();

    let amount = Amount::<NonNegative>::new(0x0102_0304);
    let bytes = amount.consensus_serialize_to_vec()?;
    assert_eq!(bytes, [0x04, 0x03, 0x02, 0x01, 0, 0, 0, 0]);

    let parsed: Amount<NonNegative> = bytes.as_slice().consensus_deserialize_into()?;
    assert_eq!(parsed, amount);

    let negative = (-1i64).to_le_bytes();
    assert!(negative
        .as_slice()
        .consensus_deserialize_into::<Amount<NonNegative>>()
        .is_err());

    Ok(())
}

proptest! {
    #[test]
    fn coin_string_round_trip(amount in any::<Amount<NonNegative>>()) {
        pegin_test::init();

        let coins = amount.to_coin_string();
        prop_assert_eq!(Amount::<NonNegative>::from_coin_str(&coins), Ok(amount));
    }
}
