//! Tests for fee rate arithmetic and parsing.

use color_eyre::eyre::Result;
use proptest::prelude::*;

use super::*;

#[test]
fn fees_round_up() -> Result<()> {
    pegin_test::init();

    let dust_relay = FeeRate::from_sat_per_kvb(100);
    assert_eq!(dust_relay.fee(0)?, 0);
    assert_eq!(dust_relay.fee(1)?, 1);
    assert_eq!(dust_relay.fee(215)?, 22);
    assert_eq!(dust_relay.fee(220)?, 22);

    let declared: FeeRate = "2.3".parse()?;
    assert_eq!(declared.fee(100)?, 230);
    assert_eq!(declared.fee(101)?, 233);

    assert_eq!(FeeRate::from_sat_per_vb(2).fee(271)?, 542);

    Ok(())
}

#[test]
fn fees_above_the_money_supply_are_errors() {
    pegin_test::init();

    assert!(FeeRate::from_sat_per_kvb(u64::MAX).fee(u64::MAX).is_err());
}

#[test]
fn parent_floor_is_one_sat_per_vbyte() {
    pegin_test::init();

    let floor = FeeRate::MIN_PARENT;

    assert!(floor.is_met_by(Amount::new(141), 141));
    assert!(floor.is_met_by(Amount::new(142), 141));
    assert!(!floor.is_met_by(Amount::new(140), 141));
    // 0.1 sat/vB
    assert!(!floor.is_met_by(Amount::new(15), 141));

    assert_eq!(
        FeeRate::from_fee(Amount::new(15), 141),
        Some(FeeRate::from_sat_per_kvb(106))
    );
    assert_eq!(FeeRate::from_fee(Amount::new(15), 0), None);
}

#[test]
fn declared_rates_parse_without_floats() -> Result<()> {
    pegin_test::init();

    for (input, sat_per_kvb) in [
        ("1", 1_000),
        ("1.0", 1_000),
        ("1.5", 1_500),
        ("2.3", 2_300),
        ("3.9", 3_900),
        ("10.01", 10_010),
        ("22.22", 22_220),
        ("24.18", 24_180),
        ("0.1", 100),
        ("0.001", 1),
    ] {
        assert_eq!(
            input.parse::<FeeRate>()?,
            FeeRate::from_sat_per_kvb(sat_per_kvb),
            "{input}"
        );
    }

    for input in ["", ".", "-1", "1.0001", "abc", "1,5"] {
        assert!(input.parse::<FeeRate>().is_err(), "{input:?}");
    }

    Ok(())
}

#[test]
fn relay_rates_use_coins_per_kvbyte() -> Result<()> {
    pegin_test::init();

    let dust_relay = FeeRate::from_coin_per_kvb_str("0.00000100")?;
    assert_eq!(dust_relay, FeeRate::from_sat_per_kvb(100));
    assert_eq!(dust_relay.to_coin_per_kvb_string(), "0.000001");
    assert_eq!(dust_relay.to_string(), "0.100 sat/vB");

    Ok(())
}

proptest! {
    #[test]
    fn fee_always_meets_its_rate(sat_per_kvb in 0..1_000_000u64, vsize in 0..1_000_000u64) {
        pegin_test::init();

        let rate = FeeRate::from_sat_per_kvb(sat_per_kvb);
        let fee = rate.fee(vsize)?;

        prop_assert!(rate.is_met_by(fee, vsize));

        // and one satoshi less never does
        if let Ok(less) = fee - Amount::new(1) {
            prop_assert!(!rate.is_met_by(less, vsize));
        }
    }
}
