//! Runs a single calculator operation against a fresh devnet session and prints the outcome.

use super::{Format, NetworkArgs};
use abacus_core::{Operation, Outcome};
use async_trait::async_trait;
use clap::Args;
use serde_json::json;
use std::error::Error;

/// Arguments for the `calc` subcommand.
#[derive(Args)]
pub struct CalcArgs {
    /// Operation to run: add, subtract, multiply, divide, power or sqrt.
    pub operation: Operation,
    /// Operands as unsigned decimal integers, in the operation's order.
    #[arg(allow_hyphen_values = true)]
    pub operands: Vec<String>,
    /// Output format: text or json.
    #[arg(long = "format", default_value = "text")]
    pub format: Format,
    #[command(flatten)]
    pub network: NetworkArgs,
}

/// Renders an outcome the way the session presents it.
pub fn render(
    operation: Operation,
    outcome: &Outcome,
    format: Format,
) -> Result<String, serde_json::Error> {
    match format {
        Format::Text => Ok(outcome.to_string()),
        Format::Json => serde_json::to_string_pretty(&json!({
            "operation": operation,
            "value": outcome.value().map(|value| value.to_string()),
            "tx_hash": outcome.tx_hash().map(|hash| hash.to_string()),
        })),
    }
}

#[async_trait]
impl super::Command for CalcArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let (_devnet, calculator) = self.network.start()?;
        calculator.connect().await?;

        let operands: Vec<&str> = self.operands.iter().map(String::as_str).collect();
        let outcome = calculator.dispatch(self.operation, &operands).await?;
        println!("{}", render(self.operation, &outcome, self.format)?);
        Ok(())
    }
}
