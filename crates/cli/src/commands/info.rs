//! Prints the connection and the contract's accessor values.

use super::{Format, NetworkArgs};
use async_trait::async_trait;
use clap::Args;
use serde_json::json;
use std::error::Error;

/// Arguments for the `info` subcommand.
#[derive(Args)]
pub struct InfoArgs {
    /// Output format: text or json.
    #[arg(long = "format", default_value = "text")]
    pub format: Format,
    #[command(flatten)]
    pub network: NetworkArgs,
}

#[async_trait]
impl super::Command for InfoArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let (devnet, calculator) = self.network.start()?;
        let account = calculator.connect().await?;
        let owner = calculator.owner().await?;
        let scientific = calculator.scientific_calculator_address().await?;

        match self.format {
            Format::Text => {
                println!("account:               {account}");
                println!("contract:              {}", calculator.contract_address());
                println!("owner:                 {owner}");
                println!("scientific calculator: {scientific}");
                println!("block:                 {}", devnet.block_number());
            }
            Format::Json => {
                let info = json!({
                    "account": account.to_string(),
                    "contract": calculator.contract_address().to_string(),
                    "owner": owner.to_string(),
                    "scientific_calculator": scientific.to_string(),
                    "block": devnet.block_number(),
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            }
        }
        Ok(())
    }
}
