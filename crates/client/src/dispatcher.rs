//! Operation dispatcher: routes an operation to its call strategy.
//!
//! The strategy is a static property of the operation ([`Operation::call_kind`]):
//!
//! | kind            | strategy                                          |
//! |-----------------|---------------------------------------------------|
//! | `ReadOnly`      | one `eth_call`, value returned directly            |
//! | `StateMutating` | submit, wait for inclusion, simulate ([`resolver`]) |
//!
//! [`resolver`]: crate::resolver

use crate::contract::CalculatorContract;
use crate::resolver;
use abacus_core::{CallKind, Error, Operation, Outcome, Result, U256};
use std::time::Duration;
use tracing::debug;

/// Invokes `operation` with already-marshaled operands.
///
/// Bookkeeping (busy flag, result slot) is the caller's job; this function only talks to
/// the contract and wraps failures with the operation label.
pub async fn dispatch(
    contract: &CalculatorContract,
    operation: Operation,
    operands: &[U256],
    receipt_timeout: Option<Duration>,
) -> Result<Outcome> {
    debug_assert_eq!(operands.len(), operation.arity());
    let function = operation.function();

    match operation.call_kind() {
        CallKind::ReadOnly => {
            let value = contract
                .call_uint(function, operands)
                .await
                .map_err(|e| Error::Call {
                    context: operation.label(),
                    message: e.to_string(),
                })?;
            debug!(%value, "read-only call returned");
            Ok(Outcome::Value(value))
        }
        CallKind::StateMutating => {
            resolver::submit_and_simulate(contract, operation, operands, receipt_timeout).await
        }
    }
}
