//! Contract handle bound to the calculator's address and interface.

use crate::provider::{ProviderError, Receipt, Signer, TransactionRequest};
use abacus_core::abi;
use abacus_core::operation::INTERFACE;
use abacus_core::{Accessor, Address, B256, ContractFunction, U256};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A contract handle: address, interface and the signer calls go through.
#[derive(Clone)]
pub struct CalculatorContract {
    address: Address,
    signer: Arc<dyn Signer>,
}

impl fmt::Debug for CalculatorContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalculatorContract")
            .field("address", &self.address)
            .field("account", &self.signer.address())
            .finish()
    }
}

impl CalculatorContract {
    pub fn new(address: Address, signer: Arc<dyn Signer>) -> Self {
        Self { address, signer }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// The account the handle signs for.
    pub fn account(&self) -> Address {
        self.signer.address()
    }

    /// Builds a request, refusing functions outside [`INTERFACE`].
    fn request(
        &self,
        function: &ContractFunction,
        args: &[U256],
    ) -> Result<TransactionRequest, ProviderError> {
        if !INTERFACE.iter().any(|bound| *bound == function) {
            return Err(ProviderError::UnboundFunction(function.name));
        }
        Ok(TransactionRequest {
            from: self.signer.address(),
            to: self.address,
            data: abi::encode_call(function.selector(), args),
        })
    }

    /// Calls a function returning `uint256` without sending a transaction.
    ///
    /// Used both for `pure`/`view` functions and to simulate a state-mutating one.
    pub async fn call_uint(
        &self,
        function: &ContractFunction,
        args: &[U256],
    ) -> Result<U256, ProviderError> {
        debug!(function = function.name, ?args, "eth_call");
        let output = self.signer.call(self.request(function, args)?).await?;
        abi::decode_uint(&output).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    /// Reads one of the contract's `address` accessors.
    pub async fn call_address(&self, accessor: Accessor) -> Result<Address, ProviderError> {
        let function = accessor.function();
        debug!(function = function.name, "eth_call");
        let output = self.signer.call(self.request(function, &[])?).await?;
        abi::decode_address(&output).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    /// Signs and submits a call to `function` as a transaction.
    pub async fn send(
        &self,
        function: &ContractFunction,
        args: &[U256],
    ) -> Result<PendingTransaction, ProviderError> {
        debug!(function = function.name, ?args, "eth_sendTransaction");
        let tx_hash = self
            .signer
            .send_transaction(self.request(function, args)?)
            .await?;
        Ok(PendingTransaction {
            tx_hash,
            signer: Arc::clone(&self.signer),
        })
    }
}

/// A submitted transaction whose receipt has not been seen yet.
pub struct PendingTransaction {
    tx_hash: B256,
    signer: Arc<dyn Signer>,
}

impl PendingTransaction {
    pub fn tx_hash(&self) -> B256 {
        self.tx_hash
    }

    /// Waits for inclusion, optionally bounded by `timeout`.
    pub async fn wait(&self, timeout: Option<Duration>) -> Result<Receipt, ProviderError> {
        let receipt = self.signer.wait_for_receipt(self.tx_hash);
        match timeout {
            None => receipt.await,
            Some(waited) => tokio::time::timeout(waited, receipt)
                .await
                .map_err(|_| ProviderError::Timeout {
                    tx_hash: self.tx_hash,
                    waited,
                })?,
        }
    }
}
