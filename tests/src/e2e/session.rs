//! Session bookkeeping around dispatch: connection, busy flag, result/error slot, events.

use super::{connected, harness, harness_with, wait_until_busy};
use abacus_client::ClientConfig;
use abacus_core::{
    CallResult, Error, ErrorKind, InputField, Operation, SessionEvent, SessionState, U256,
};
use abacus_devnet::Devnet;
use color_eyre::Result;
use color_eyre::eyre::eyre;

#[tokio::test]
async fn test_dispatch_before_connect_makes_no_requests() -> Result<()> {
    let harness = harness()?;
    for operation in Operation::ALL {
        let operands = vec!["4"; operation.arity()];
        let err = harness
            .calculator
            .dispatch(operation, &operands)
            .await
            .err()
            .ok_or_else(|| eyre!("{operation} should require a connection"))?;
        assert_eq!(err, Error::NotConnected);
    }
    assert_eq!(harness.devnet.stats().network_requests(), 0);
    assert!(!harness.calculator.snapshot().is_connected());
    Ok(())
}

#[tokio::test]
async fn test_invalid_operands_make_no_requests() -> Result<()> {
    let harness = connected().await?;
    for operands in [["1.5", "2"], ["", "2"], ["-3", "2"], ["1e3", "1"], ["2", "0x10"]] {
        let err = harness
            .calculator
            .dispatch(Operation::Add, &operands)
            .await
            .err()
            .ok_or_else(|| eyre!("{operands:?} should be rejected"))?;
        assert_eq!(err.kind(), ErrorKind::Validation, "{operands:?}");
    }
    let err = harness
        .calculator
        .dispatch(
            Operation::SquareRoot,
            &["115792089237316195423570985008687907853269984665640564039457584007913129639936"],
        )
        .await
        .err()
        .ok_or_else(|| eyre!("2^256 should be rejected"))?;
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert_eq!(harness.devnet.stats().network_requests(), 0);
    assert!(!harness.calculator.is_busy());
    Ok(())
}

#[tokio::test]
async fn test_connect_declined() -> Result<()> {
    let harness = harness()?;
    harness.devnet.set_rejecting(true);

    let err = harness
        .calculator
        .connect()
        .await
        .err()
        .ok_or_else(|| eyre!("connect should fail"))?;
    assert!(matches!(err, Error::ProviderRejected(_)));
    let state = harness.calculator.snapshot();
    assert!(!state.is_connected());
    assert!(state.error().is_some_and(|e| e.starts_with("failed to connect wallet")));

    harness.devnet.set_rejecting(false);
    harness.calculator.connect().await?;
    let state = harness.calculator.snapshot();
    assert!(state.is_connected());
    assert!(state.error().is_none());
    Ok(())
}

#[tokio::test]
async fn test_connect_with_no_accounts() -> Result<()> {
    let harness = harness_with(Devnet::builder().accounts(0).build()?, ClientConfig::default())?;
    let err = harness
        .calculator
        .connect()
        .await
        .err()
        .ok_or_else(|| eyre!("connect should fail"))?;
    assert!(matches!(err, Error::ProviderRejected(_)));
    Ok(())
}

#[tokio::test]
async fn test_connect_uses_first_account() -> Result<()> {
    let harness = harness_with(Devnet::builder().accounts(3).build()?, ClientConfig::default())?;
    let account = harness.calculator.connect().await?;
    assert_eq!(account, harness.devnet.accounts()[0]);
    assert_eq!(harness.calculator.snapshot().account, Some(account));
    Ok(())
}

#[tokio::test]
async fn test_busy_rejects_second_operation() -> Result<()> {
    let harness = connected().await?;
    harness.devnet.set_inclusion_outage(true);

    let first = tokio::spawn({
        let calculator = harness.calculator.clone();
        async move { calculator.dispatch(Operation::SquareRoot, &["64"]).await }
    });
    wait_until_busy(&harness.calculator).await;

    let before = harness.calculator.snapshot();
    let calls_before = harness.devnet.stats().calls;
    for operation in [Operation::Add, Operation::SquareRoot] {
        let operands = vec!["1"; operation.arity()];
        let err = harness
            .calculator
            .dispatch(operation, &operands)
            .await
            .err()
            .ok_or_else(|| eyre!("{operation} should be refused while busy"))?;
        assert_eq!(err.kind(), ErrorKind::Busy);
    }
    assert_eq!(harness.calculator.snapshot(), before);
    assert_eq!(harness.devnet.stats().calls, calls_before);

    harness.devnet.set_inclusion_outage(false);
    assert_eq!(first.await??.value(), Some(U256::from(8)));
    assert_eq!(harness.devnet.stats().transactions, 1);
    Ok(())
}

#[tokio::test]
async fn test_disconnect_in_flight_discards_result() -> Result<()> {
    let harness = connected().await?;
    harness.calculator.set_input(InputField::Number, "25");
    harness.devnet.set_inclusion_outage(true);

    let task = tokio::spawn({
        let calculator = harness.calculator.clone();
        async move { calculator.run(Operation::SquareRoot).await }
    });
    wait_until_busy(&harness.calculator).await;
    harness.calculator.disconnect();
    harness.devnet.set_inclusion_outage(false);

    // the operation itself completes; the session does not show it
    assert_eq!(task.await??.value(), Some(U256::from(5)));
    assert_eq!(harness.calculator.snapshot(), SessionState::default());
    Ok(())
}

#[tokio::test]
async fn test_disconnect_twice_and_clear() -> Result<()> {
    let harness = connected().await?;
    let calculator = &harness.calculator;
    calculator.set_input(InputField::Base, "3");
    calculator.set_input(InputField::Exponent, "4");
    assert_eq!(calculator.run(Operation::Power).await?.value(), Some(U256::from(81)));

    calculator.clear();
    let state = calculator.snapshot();
    assert!(state.is_connected());
    assert!(state.last.is_none());
    assert!(state.inputs.is_empty());

    calculator.disconnect();
    calculator.disconnect();
    assert_eq!(calculator.snapshot(), SessionState::default());
    Ok(())
}

#[tokio::test]
async fn test_events_trace_a_session() -> Result<()> {
    let harness = harness()?;
    let mut events = harness.calculator.subscribe();

    let account = harness.calculator.connect().await?;
    harness.calculator.set_input(InputField::First, "7");
    harness.calculator.set_input(InputField::Second, "6");
    harness.calculator.run(Operation::Multiply).await?;
    harness.calculator.disconnect();

    let expected = vec![
        SessionEvent::Connected { account },
        SessionEvent::InputChanged {
            field: InputField::First,
            value: "7".into(),
        },
        SessionEvent::InputChanged {
            field: InputField::Second,
            value: "6".into(),
        },
        SessionEvent::Started {
            operation: Operation::Multiply,
        },
        SessionEvent::Finished {
            operation: Operation::Multiply,
            result: CallResult::Value(U256::from(42)),
        },
        SessionEvent::Disconnected,
    ];
    for want in expected {
        assert_eq!(events.recv().await?, want);
    }
    Ok(())
}

#[tokio::test]
async fn test_accessors() -> Result<()> {
    let harness = connected().await?;
    let owner = harness.calculator.owner().await?;
    assert_eq!(owner, harness.devnet.accounts()[0]);
    let scientific = harness.calculator.scientific_calculator_address().await?;
    assert_eq!(scientific, abacus_devnet::SCIENTIFIC_CALCULATOR);

    // accessors leave the result slot alone
    assert!(harness.calculator.snapshot().last.is_none());
    Ok(())
}
