//! Result resolver for state-mutating operations.
//!
//! A receipt proves inclusion, not the function's return value. The resolver therefore:
//!
//! 1. submits the call as a signed transaction and waits for its receipt (exactly once,
//!    never resubmitted),
//! 2. replays the same call with the same arguments as a read-only simulation,
//! 3. reports the simulated value, or, if the simulation fails, the transaction hash with
//!    no claimed value.
//!
//! A reverted or missing transaction is a hard failure and skips the simulation.
//!
//! The simulation runs against state as of the call, not as of inclusion; a concurrent
//! writer to the same contract state can make the two disagree.

use crate::contract::CalculatorContract;
use abacus_core::{Error, Operation, Outcome, Result, U256};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Runs the submit-then-simulate protocol for `operation`.
pub async fn submit_and_simulate(
    contract: &CalculatorContract,
    operation: Operation,
    operands: &[U256],
    receipt_timeout: Option<Duration>,
) -> Result<Outcome> {
    let function = operation.function();
    let tx_error = |message: String| Error::Transaction {
        context: operation.label(),
        message,
    };

    let pending = contract
        .send(function, operands)
        .await
        .map_err(|e| tx_error(e.to_string()))?;
    let tx_hash = pending.tx_hash();
    debug!(%tx_hash, "transaction submitted");

    let receipt = pending
        .wait(receipt_timeout)
        .await
        .map_err(|e| tx_error(e.to_string()))?;
    if !receipt.success {
        return Err(tx_error(format!(
            "transaction {tx_hash} reverted in block {}",
            receipt.block_number
        )));
    }
    debug!(
        %tx_hash,
        block = receipt.block_number,
        gas_used = receipt.gas_used,
        "transaction included"
    );

    match contract.call_uint(function, operands).await {
        Ok(value) => {
            info!(%tx_hash, %value, "resolved value by simulation");
            Ok(Outcome::Value(value))
        }
        Err(cause) => {
            let error = Error::Simulation {
                context: operation.label(),
                message: cause.to_string(),
            };
            warn!(%tx_hash, %error, "falling back to transaction reference");
            Ok(Outcome::Submitted { tx_hash })
        }
    }
}
