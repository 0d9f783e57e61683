//! Client side of the on-chain calculator: the connection manager, the operation
//! dispatcher, the result resolver for state-mutating calls, and the [`Calculator`]
//! facade that keeps the session consistent around them.

pub mod calculator;
pub mod config;
pub mod connection;
pub mod contract;
pub mod dispatcher;
pub mod provider;
pub mod resolver;

#[cfg(test)]
mod mock;

pub use calculator::Calculator;
pub use config::{ClientConfig, DEFAULT_CONTRACT_ADDRESS};
pub use connection::ConnectionManager;
pub use contract::{CalculatorContract, PendingTransaction};
pub use provider::{ProviderError, Receipt, Signer, TransactionRequest, WalletProvider};
