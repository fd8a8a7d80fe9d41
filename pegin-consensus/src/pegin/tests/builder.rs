//! Building claiming transactions.

use color_eyre::eyre::Result;

use pegin_chain::{
    amount::{Amount, NonNegative},
    block,
    script::Script,
    transaction::{OutputKind, Transaction},
    FeeRate,
};

use crate::{
    error::{ClaimError, ProofError},
    pegin::{evaluate, ClaimBuilder, Context, Verdict},
    tests::*,
    Config,
};

fn kinds(transaction: &Transaction) -> Vec<OutputKind> {
    transaction.outputs.iter().map(|output| output.kind()).collect()
}

fn build(
    chain: &ParentChain,
    config: &Config,
    height: u32,
    pegin: &PegIn,
) -> Result<Transaction, ClaimError> {
    let snapshot = chain.snapshot();

    ClaimBuilder::new(config, block::Height(height), destination())
        .parent_chain(&snapshot)
        .asset(ASSET)
        .build(
            &pegin.transaction_bytes(),
            &pegin.proof_bytes(),
            &claim_script(),
        )
}

fn evaluate_at(chain: &ParentChain, config: &Config, height: u32, transaction: &Transaction) -> Verdict {
    let parent_data = chain.pegin_data(transaction);

    evaluate(
        transaction,
        &Context {
            config,
            height: block::Height(height),
            parent_data: Some(&parent_data),
            declared_feerate: None,
        },
    )
}

fn payout(
    value: Amount<NonNegative>,
    subsidy: Amount<NonNegative>,
    fee: Amount<NonNegative>,
) -> Amount<NonNegative> {
    (value - subsidy)
        .and_then(|remaining| remaining - fee)
        .expect("test values cover their subsidy and fee")
}

#[test]
fn builds_a_burn_for_small_pegins_after_activation() -> Result<()> {
    pegin_test::init();

    let mut chain = ParentChain::new();
    let pegin = chain.peg_in(cents(100), FeeRate::from_sat_per_vb(2));
    let config = config(true);

    let transaction = build(&chain, &config, 100, &pegin)?;

    assert_eq!(
        kinds(&transaction),
        [OutputKind::Payment, OutputKind::Burn, OutputKind::Fee]
    );

    let fee = config.min_relay_fee.fee(transaction.vsize())?;
    assert_eq!(transaction.outputs[1].value, pegin.fee);
    assert_eq!(transaction.outputs[2].value, fee);
    assert_eq!(
        transaction.outputs[0].value,
        payout(pegin.value(), pegin.fee, fee)
    );
    assert_eq!(transaction.outputs[0].lock_script, destination());
    assert_eq!(transaction.outputs[0].asset, ASSET);

    assert_eq!(
        evaluate_at(&chain, &config, 100, &transaction),
        Verdict::Accepted
    );

    Ok(())
}

#[test]
fn builds_without_a_burn_when_no_subsidy_is_needed() -> Result<()> {
    pegin_test::init();

    let mut chain = ParentChain::new();
    let small = chain.peg_in(cents(100), FeeRate::from_sat_per_vb(2));
    let large = chain.peg_in(cents(250), FeeRate::from_sat_per_vb(2));
    let config = config(true);

    for (height, pegin) in [(99, &small), (100, &large)] {
        let transaction = build(&chain, &config, height, pegin)?;

        assert_eq!(kinds(&transaction), [OutputKind::Payment, OutputKind::Fee]);

        let fee = config.min_relay_fee.fee(transaction.vsize())?;
        assert_eq!(
            transaction.outputs[0].value,
            payout(pegin.value(), Amount::zero(), fee)
        );
        assert_eq!(
            evaluate_at(&chain, &config, height, &transaction),
            Verdict::Accepted
        );
    }

    Ok(())
}

#[test]
fn unvalidated_claims_need_a_declared_feerate() -> Result<()> {
    pegin_test::init();

    let mut chain = ParentChain::new();
    let pegin = chain.peg_in(cents(100), FeeRate::from_sat_per_vb(1));
    let config = config(false);

    let builder = ClaimBuilder::new(&config, SUBSIDY_HEIGHT, destination());
    let error = builder
        .build(
            &pegin.transaction_bytes(),
            &pegin.proof_bytes(),
            &claim_script(),
        )
        .expect_err("an unvalidated peg-in needs a fee rate to price its subsidy");

    assert!(matches!(error, ClaimError::FeerateRequired));
    assert_eq!(
        error.to_string(),
        "Bitcoin transaction fee rate must be supplied, because validatepegin is off and this pegin requires a burn subsidy."
    );

    let feerate = FeeRate::from_sat_per_vb(3);
    let transaction = builder.feerate(feerate).build(
        &pegin.transaction_bytes(),
        &pegin.proof_bytes(),
        &claim_script(),
    )?;

    assert_eq!(
        transaction.outputs[1].value,
        feerate.fee(transaction.vsize())?
    );
    assert_eq!(
        evaluate(
            &transaction,
            &Context {
                config: &config,
                height: SUBSIDY_HEIGHT,
                parent_data: None,
                declared_feerate: Some(feerate),
            },
        ),
        Verdict::Accepted
    );

    // before activation no fee rate is needed
    ClaimBuilder::new(&config, block::Height(99), destination()).build(
        &pegin.transaction_bytes(),
        &pegin.proof_bytes(),
        &claim_script(),
    )?;

    Ok(())
}

#[test]
fn parent_feerate_floor_error_message() {
    pegin_test::init();

    let mut chain = ParentChain::new();
    let pegin = chain.peg_in(cents(100), FeeRate::from_sat_per_kvb(100));

    let error = build(&chain, &config(true), 99, &pegin)
        .expect_err("0.1 sat/vB is below the parent fee rate floor");

    assert!(matches!(error, ClaimError::ParentFeerateTooLow { .. }));
    assert_eq!(
        error.to_string(),
        "Parent transaction must have a feerate of at least 1 sat/vb"
    );
}

#[test]
fn min_amount_error_message() {
    pegin_test::init();

    let mut chain = ParentChain::new();
    let pegin = chain.peg_in(cents(50), FeeRate::from_sat_per_vb(1));
    let config = Config {
        pegin_min_amount: cents(100),
        ..config(true)
    };

    let error = build(&chain, &config, 99, &pegin).expect_err("0.5 is below the minimum");

    assert_eq!(
        error.to_string(),
        "Pegin amount (0.50) is lower than the minimum pegin amount for this chain (1.00)."
    );
}

#[test]
fn min_amount_applies_without_pegin_validation() {
    pegin_test::init();

    let mut chain = ParentChain::new();
    let pegin = chain.peg_in(sats(99_999_999), FeeRate::from_sat_per_vb(1));
    let config = Config {
        pegin_min_amount: cents(100),
        ..config(false)
    };

    let error = ClaimBuilder::new(&config, SUBSIDY_HEIGHT, destination())
        .feerate(FeeRate::from_sat_per_vb(2))
        .build(
            &pegin.transaction_bytes(),
            &pegin.proof_bytes(),
            &claim_script(),
        )
        .expect_err("the builder knows the parent value even when it doesn't validate pegins");

    assert!(matches!(error, ClaimError::PeginValueTooLow { .. }));
    assert_eq!(
        error.to_string(),
        "Pegin amount (0.99999999) is lower than the minimum pegin amount for this chain (1.00)."
    );
}

#[test]
fn refuses_to_build_dust() {
    pegin_test::init();

    let mut chain = ParentChain::new();
    let config = Config {
        dust_relay_fee: FeeRate::from_sat_per_vb(10),
        ..config(true)
    };

    // the payment is positive, but below the 1330 satoshi threshold
    let small = chain.peg_in(sats(1000), FeeRate::from_sat_per_vb(1));
    let error = build(&chain, &config, 99, &small).expect_err("the payment is dust");
    assert!(matches!(error, ClaimError::Dust));
    assert_eq!(
        error.to_string(),
        "Pegin transaction would create dust output. See the log for details."
    );

    // the subsidy is more than the whole claim
    let expensive = chain.peg_in(sats(1000), FeeRate::from_sat_per_vb(10));
    assert!(expensive.fee > expensive.value());
    let error = build(&chain, &config, 100, &expensive).expect_err("nothing is left to pay");
    assert!(matches!(error, ClaimError::Dust));
}

#[test]
fn refuses_unspendable_destinations() {
    pegin_test::init();

    let mut chain = ParentChain::new();
    let pegin = chain.peg_in(cents(300), FeeRate::from_sat_per_vb(1));
    let config = config(true);
    let snapshot = chain.snapshot();

    for destination in [Script::burn(), Script::default()] {
        let error = ClaimBuilder::new(&config, SUBSIDY_HEIGHT, destination)
            .parent_chain(&snapshot)
            .build(
                &pegin.transaction_bytes(),
                &pegin.proof_bytes(),
                &claim_script(),
            )
            .expect_err("the destination can't be spent");

        assert!(matches!(error, ClaimError::InvalidDestination));
    }
}

#[test]
fn proof_material_must_check_out() {
    pegin_test::init();

    let mut chain = ParentChain::new();
    let pegin = chain.peg_in(cents(300), FeeRate::from_sat_per_vb(1));
    let other = chain.peg_in(cents(300), FeeRate::from_sat_per_vb(1));
    let config = config(true);
    let snapshot = chain.snapshot();
    let builder = ClaimBuilder::new(&config, SUBSIDY_HEIGHT, destination()).parent_chain(&snapshot);

    let error = builder
        .build(&pegin.transaction_bytes(), &pegin.proof_bytes(), &destination())
        .expect_err("no output pays the destination script");
    assert!(matches!(
        error,
        ClaimError::Proof(ProofError::OutputNotFound(txid)) if txid == pegin.transaction.txid()
    ));

    let error = builder
        .build(&pegin.transaction_bytes(), &other.proof_bytes(), &claim_script())
        .expect_err("the proof is for another transaction");
    assert!(matches!(
        error,
        ClaimError::Proof(ProofError::NotIncluded(_))
    ));

    let error = builder
        .build(&[0x02, 0x00], &pegin.proof_bytes(), &claim_script())
        .expect_err("the parent transaction is truncated");
    assert!(matches!(error, ClaimError::MalformedClaim(_)));

    // a chain that never saw the peg-in block
    let unknown = ParentChain::new().snapshot();
    let error = ClaimBuilder::new(&config, SUBSIDY_HEIGHT, destination())
        .parent_chain(&unknown)
        .build(
            &pegin.transaction_bytes(),
            &pegin.proof_bytes(),
            &claim_script(),
        )
        .expect_err("the peg-in block is unknown");
    assert!(matches!(
        error,
        ClaimError::Proof(ProofError::UnknownBlock(_))
    ));
}
