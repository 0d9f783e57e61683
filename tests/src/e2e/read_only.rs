//! Read-only operations: one call, value returned directly, no transaction.

use super::{U256_MAX_DECIMAL, connected};
use abacus_core::{CallResult, Operation, Outcome, U256};
use color_eyre::Result;

#[tokio::test]
async fn test_read_only_operations() -> Result<()> {
    let harness = connected().await?;
    let cases = [
        (Operation::Add, ["2", "3"], 5u64),
        (Operation::Subtract, ["10", "4"], 6),
        (Operation::Multiply, ["6", "7"], 42),
        (Operation::Divide, ["10", "3"], 3),
        (Operation::Power, ["2", "10"], 1024),
    ];

    for (i, (operation, operands, expected)) in cases.into_iter().enumerate() {
        let outcome = harness.calculator.dispatch(operation, &operands).await?;
        assert_eq!(outcome, Outcome::Value(U256::from(expected)), "{operation}");

        let state = harness.calculator.snapshot();
        assert!(!state.busy);
        assert_eq!(state.last, Some(CallResult::Value(U256::from(expected))));

        let stats = harness.devnet.stats();
        assert_eq!(stats.calls, i + 1);
        assert_eq!(stats.transactions, 0);
    }
    assert_eq!(harness.devnet.block_number(), 0);
    Ok(())
}

#[tokio::test]
async fn test_zero_operands() -> Result<()> {
    let harness = connected().await?;
    let calculator = &harness.calculator;

    for (operation, operands, expected) in [
        (Operation::Multiply, ["0", "9"], U256::ZERO),
        (Operation::Divide, ["0", "9"], U256::ZERO),
        (Operation::Power, ["0", "0"], U256::from(1)),
        (Operation::Subtract, ["5", "5"], U256::ZERO),
    ] {
        let outcome = calculator.dispatch(operation, &operands).await?;
        assert_eq!(outcome.value(), Some(expected), "{operation}");
    }
    Ok(())
}

#[tokio::test]
async fn test_full_width_operands() -> Result<()> {
    let harness = connected().await?;
    let outcome = harness
        .calculator
        .dispatch(Operation::Add, &[U256_MAX_DECIMAL, "0"])
        .await?;
    assert_eq!(outcome.value(), Some(U256::MAX));

    let outcome = harness
        .calculator
        .dispatch(Operation::Divide, &[U256_MAX_DECIMAL, U256_MAX_DECIMAL])
        .await?;
    assert_eq!(outcome.value(), Some(U256::from(1)));
    Ok(())
}

#[tokio::test]
async fn test_inputs_drive_operations() -> Result<()> {
    let harness = connected().await?;
    let calculator = &harness.calculator;
    calculator.set_input(abacus_core::InputField::First, " 40 ");
    calculator.set_input(abacus_core::InputField::Second, "2");

    assert_eq!(calculator.run(Operation::Add).await?.value(), Some(U256::from(42)));
    assert_eq!(calculator.run(Operation::Divide).await?.value(), Some(U256::from(20)));
    assert_eq!(harness.devnet.stats().calls, 2);
    Ok(())
}
