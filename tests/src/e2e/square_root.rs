//! Square roots: submit, wait for inclusion, then recover the value by simulation.

use super::{U256_MAX_DECIMAL, connected, harness_with, wait_until_busy};
use abacus_client::ClientConfig;
use abacus_core::{CallResult, ErrorKind, Operation, Outcome, U256};
use abacus_devnet::Devnet;
use color_eyre::Result;
use color_eyre::eyre::eyre;

#[tokio::test]
async fn test_square_root_value_by_simulation() -> Result<()> {
    let harness = connected().await?;
    let outcome = harness
        .calculator
        .dispatch(Operation::SquareRoot, &["16"])
        .await?;
    assert_eq!(outcome, Outcome::Value(U256::from(4)));

    let stats = harness.devnet.stats();
    assert_eq!(stats.transactions, 1);
    assert_eq!(stats.calls, 1);
    assert_eq!(harness.devnet.block_number(), 1);
    assert_eq!(harness.devnet.last_result(), U256::from(4));
    assert_eq!(harness.devnet.calculations(), U256::from(1));
    assert!(!harness.calculator.is_busy());
    Ok(())
}

#[tokio::test]
async fn test_square_root_floors() -> Result<()> {
    let harness = connected().await?;
    let cases = [
        ("0", U256::ZERO),
        ("1", U256::from(1)),
        ("15", U256::from(3)),
        ("1000000", U256::from(1000)),
        (U256_MAX_DECIMAL, U256::MAX >> 128),
    ];
    for (input, expected) in cases {
        let outcome = harness
            .calculator
            .dispatch(Operation::SquareRoot, &[input])
            .await?;
        assert_eq!(outcome.value(), Some(expected), "sqrt({input})");
    }
    assert_eq!(harness.devnet.calculations(), U256::from(cases.len()));
    Ok(())
}

#[tokio::test]
async fn test_failed_simulation_reports_hash() -> Result<()> {
    let harness = connected().await?;
    harness.devnet.set_call_outage(true);

    let outcome = harness
        .calculator
        .dispatch(Operation::SquareRoot, &["81"])
        .await?;
    let tx_hash = outcome
        .tx_hash()
        .ok_or_else(|| eyre!("expected a transaction reference, got {outcome}"))?;
    assert_eq!(outcome.value(), None);
    assert!(outcome.to_string().starts_with("Transaction successful. Hash: 0x"));

    // the transaction itself went through
    assert_eq!(harness.devnet.last_result(), U256::from(9));
    assert_eq!(harness.devnet.stats().transactions, 1);

    let state = harness.calculator.snapshot();
    assert_eq!(state.last, Some(CallResult::Submitted { tx_hash }));
    assert!(state.error().is_none());
    Ok(())
}

#[tokio::test]
async fn test_square_root_waits_for_inclusion() -> Result<()> {
    let harness = connected().await?;
    harness.devnet.set_inclusion_outage(true);

    let task = tokio::spawn({
        let calculator = harness.calculator.clone();
        async move { calculator.dispatch(Operation::SquareRoot, &["49"]).await }
    });
    wait_until_busy(&harness.calculator).await;
    while harness.devnet.pending_transactions() == 0 {
        tokio::task::yield_now().await;
    }
    assert!(harness.calculator.is_busy());

    harness.devnet.set_inclusion_outage(false);
    let outcome = task.await??;
    assert_eq!(outcome.value(), Some(U256::from(7)));
    assert!(!harness.calculator.is_busy());
    Ok(())
}

#[tokio::test]
async fn test_receipt_timeout_is_a_transaction_error() -> Result<()> {
    let config = ClientConfig {
        receipt_timeout_ms: Some(25),
        ..ClientConfig::default()
    };
    let harness = harness_with(Devnet::start()?, config)?;
    harness.calculator.connect().await?;
    harness.devnet.set_inclusion_outage(true);

    let err = harness
        .calculator
        .dispatch(Operation::SquareRoot, &["4"])
        .await
        .err()
        .ok_or_else(|| eyre!("expected a timeout"))?;
    assert_eq!(err.kind(), ErrorKind::Transaction);
    assert!(err.to_string().starts_with("Square root calculation failed"), "{err}");

    let state = harness.calculator.snapshot();
    assert!(!state.busy);
    assert!(state.error().is_some());
    // no simulation without a receipt
    assert_eq!(harness.devnet.stats().calls, 0);
    Ok(())
}
