//! Arithmetic rules enforced by the contract, surfaced as operation errors.

use super::{U256_MAX_DECIMAL, connected};
use abacus_core::{Error, ErrorKind, Operation, U256};
use color_eyre::Result;
use color_eyre::eyre::eyre;

async fn expect_call_error(operation: Operation, operands: [&str; 2], reason: &str) -> Result<()> {
    let harness = connected().await?;
    let err = harness
        .calculator
        .dispatch(operation, &operands)
        .await
        .err()
        .ok_or_else(|| eyre!("{operation} {operands:?} should fail"))?;

    assert_eq!(err.kind(), ErrorKind::Call);
    assert!(matches!(err, Error::Call { context, .. } if context == operation.label()));
    assert!(err.to_string().contains(reason), "{err}");

    let state = harness.calculator.snapshot();
    assert!(!state.busy);
    assert_eq!(state.error(), Some(err.to_string().as_str()));
    Ok(())
}

#[tokio::test]
async fn test_division_by_zero() -> Result<()> {
    expect_call_error(Operation::Divide, ["10", "0"], "division or modulo by zero (0x12)").await
}

#[tokio::test]
async fn test_subtraction_underflow() -> Result<()> {
    expect_call_error(Operation::Subtract, ["3", "5"], "arithmetic underflow or overflow").await
}

#[tokio::test]
async fn test_addition_overflow() -> Result<()> {
    expect_call_error(
        Operation::Add,
        [U256_MAX_DECIMAL, "1"],
        "arithmetic underflow or overflow",
    )
    .await
}

#[tokio::test]
async fn test_multiplication_overflow() -> Result<()> {
    expect_call_error(Operation::Multiply, [U256_MAX_DECIMAL, "2"], "(0x11)").await
}

#[tokio::test]
async fn test_power_wraps() -> Result<()> {
    let harness = connected().await?;
    let outcome = harness.calculator.dispatch(Operation::Power, &["2", "256"]).await?;
    assert_eq!(outcome.value(), Some(U256::ZERO));

    let outcome = harness.calculator.dispatch(Operation::Power, &["2", "255"]).await?;
    assert_eq!(outcome.value(), Some(U256::from(1) << 255));
    Ok(())
}

#[tokio::test]
async fn test_failure_then_success_clears_error() -> Result<()> {
    let harness = connected().await?;
    let calculator = &harness.calculator;
    assert!(calculator.dispatch(Operation::Divide, &["1", "0"]).await.is_err());
    assert!(calculator.snapshot().error().is_some());

    calculator.dispatch(Operation::Add, &["1", "1"]).await?;
    let state = calculator.snapshot();
    assert!(state.error().is_none());
    let value = state.result().and_then(|result| match result {
        abacus_core::CallResult::Value(value) => Some(*value),
        _ => None,
    });
    assert_eq!(value, Some(U256::from(2)));
    Ok(())
}
