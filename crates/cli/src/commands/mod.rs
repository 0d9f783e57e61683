use abacus_client::{Calculator, ClientConfig};
use abacus_devnet::Devnet;
use async_trait::async_trait;
use clap::{Args, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::str::FromStr;

pub mod calc;
pub mod info;
pub mod repl;

use thiserror::Error;

/// Errors raised by the CLI itself, before the client is involved.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] abacus_core::Error),
    /// The local chain could not be started.
    #[error("devnet error: {0}")]
    Devnet(#[from] abacus_devnet::Error),
    /// Terminal read/write error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON serialization error.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Connection settings shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct NetworkArgs {
    /// JSON configuration file (`contract_address`, `receipt_timeout_ms`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Calculator contract address, overriding the configuration.
    #[arg(long = "contract")]
    pub contract: Option<String>,
    /// Give up waiting for a transaction receipt after this many milliseconds.
    #[arg(long = "receipt-timeout-ms")]
    pub receipt_timeout_ms: Option<u64>,
    /// Number of accounts the devnet wallet grants.
    #[arg(long = "accounts", default_value_t = 1)]
    pub accounts: usize,
    /// Make the devnet wallet decline the connection request.
    #[arg(long = "reject-connect")]
    pub reject_connect: bool,
    /// Make every read-only call fail, forcing square roots onto the hash fallback.
    #[arg(long = "read-outage")]
    pub read_outage: bool,
}

impl Default for NetworkArgs {
    fn default() -> Self {
        Self {
            config: None,
            contract: None,
            receipt_timeout_ms: None,
            accounts: 1,
            reject_connect: false,
            read_outage: false,
        }
    }
}

impl NetworkArgs {
    /// Resolves the effective configuration: file, then command-line overrides.
    pub fn config(&self) -> Result<ClientConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::from_file(path)?,
            None => ClientConfig::default(),
        };
        if let Some(contract) = &self.contract {
            config.contract_address = contract.clone();
        }
        if self.receipt_timeout_ms.is_some() {
            config.receipt_timeout_ms = self.receipt_timeout_ms;
        }
        config.contract_address()?;
        Ok(config)
    }

    /// Starts a devnet hosting the configured contract and a calculator wired to its wallet.
    pub fn start(&self) -> Result<(Devnet, Calculator), CliError> {
        let config = self.config()?;
        let devnet = Devnet::builder()
            .accounts(self.accounts)
            .contract_address(config.contract_address()?)
            .build()?;
        devnet.set_rejecting(self.reject_connect);
        devnet.set_call_outage(self.read_outage);

        let calculator = Calculator::new(Some(devnet.wallet()), &config)?;
        tracing::debug!(contract = %calculator.contract_address(), "calculator ready");
        Ok((devnet, calculator))
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Text,
    Json,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Format::Text),
            "json" => Ok(Format::Json),
            other => Err(format!("unknown format `{other}` (expected text or json)")),
        }
    }
}

/// CLI subcommands for Abacus.
#[derive(Subcommand)]
pub enum Cmd {
    /// Run one calculator operation and print the result.
    Calc(calc::CalcArgs),
    /// Print the connected account and the contract's owner and linked addresses.
    Info(info::InfoArgs),
    /// Interactive calculator session.
    Repl(repl::ReplArgs),
}

/// Trait for executing CLI subcommands.
#[async_trait]
pub trait Command {
    /// Executes the subcommand.
    async fn execute(self) -> Result<(), Box<dyn Error>>;
}

#[async_trait]
impl Command for Cmd {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        match self {
            Cmd::Calc(args) => args.execute().await,
            Cmd::Info(args) => args.execute().await,
            Cmd::Repl(args) => args.execute().await,
        }
    }
}
