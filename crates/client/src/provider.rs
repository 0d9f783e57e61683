//! The wallet-provider boundary.
//!
//! A [`WalletProvider`] hands out accounts and a [`Signer`] per account, the way an
//! injected browser wallet does. The signer is the only path to the chain: read-only
//! calls, transaction submission and receipt lookup all go through it.

use abacus_core::{Address, B256, Bytes};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by the wallet provider or the node behind it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// No provider is reachable.
    #[error("wallet provider unavailable")]
    Unavailable,
    /// The user declined the request in the wallet.
    #[error("user rejected the request")]
    Rejected,
    /// The contract reverted; the message is the decoded revert reason.
    #[error("{0}")]
    Reverted(String),
    /// The node returned something that does not decode as the expected ABI type.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// No receipt arrived in time.
    #[error("no receipt for {tx_hash} after {waited:?}")]
    Timeout {
        /// Hash of the pending transaction.
        tx_hash: B256,
        /// How long the client waited.
        waited: Duration,
    },
    /// Network or node failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// The request names a function outside the bound contract interface.
    #[error("`{0}` is not part of the calculator interface")]
    UnboundFunction(&'static str),
}

/// A call or transaction against a contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
}

/// Inclusion record of a transaction. Carries no return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: B256,
    pub block_number: u64,
    pub gas_used: u64,
    /// False if execution reverted.
    pub success: bool,
}

/// The wallet side of the boundary.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Asks the user for account access. The first account is the active one.
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;

    /// Returns a signing handle for `account`.
    async fn signer(&self, account: Address) -> Result<Arc<dyn Signer>, ProviderError>;
}

/// A signing handle bound to one account.
#[async_trait]
pub trait Signer: Send + Sync {
    /// The account this handle signs for.
    fn address(&self) -> Address;

    /// Executes `request` against current state without committing anything.
    async fn call(&self, request: TransactionRequest) -> Result<Bytes, ProviderError>;

    /// Signs and submits `request`, returning the transaction hash.
    async fn send_transaction(&self, request: TransactionRequest) -> Result<B256, ProviderError>;

    /// Waits until the transaction is included.
    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<Receipt, ProviderError>;
}
