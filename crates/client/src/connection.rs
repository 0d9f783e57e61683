//! Connection manager: owns the link to the wallet provider and the bound contract handle.

use crate::contract::CalculatorContract;
use crate::provider::{ProviderError, WalletProvider};
use abacus_core::{Address, Error, Result};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

/// Binds at most one contract handle at a time.
pub struct ConnectionManager {
    provider: Option<Arc<dyn WalletProvider>>,
    contract_address: Address,
    bound: RwLock<Option<CalculatorContract>>,
}

impl ConnectionManager {
    /// Creates an unconnected manager. `provider` is `None` when no wallet is installed.
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, contract_address: Address) -> Self {
        Self {
            provider,
            contract_address,
            bound: RwLock::new(None),
        }
    }

    pub fn contract_address(&self) -> Address {
        self.contract_address
    }

    /// Requests account access and binds a contract handle for the first account.
    ///
    /// Nothing is bound unless every step succeeds. Connecting again replaces the previous
    /// handle.
    pub async fn connect(&self) -> Result<CalculatorContract> {
        let provider = self.provider.as_ref().ok_or(Error::ProviderUnavailable)?;

        let accounts = provider
            .request_accounts()
            .await
            .map_err(connect_error)?;
        let account = *accounts
            .first()
            .ok_or_else(|| Error::ProviderRejected("provider returned no accounts".into()))?;
        debug!(%account, available = accounts.len(), "accounts granted");

        let signer = provider.signer(account).await.map_err(connect_error)?;
        let contract = CalculatorContract::new(self.contract_address, signer);

        let previous = self.bound.write().replace(contract.clone());
        if previous.is_some() {
            debug!("replaced existing contract binding");
        }
        info!(%account, contract = %self.contract_address, "wallet connected");
        Ok(contract)
    }

    /// Drops the bound handle. Calling it while unconnected is a no-op.
    pub fn disconnect(&self) {
        if self.bound.write().take().is_some() {
            info!("wallet disconnected");
        }
    }

    /// Returns the bound handle.
    pub fn contract(&self) -> Result<CalculatorContract> {
        self.bound.read().clone().ok_or(Error::NotConnected)
    }

    pub fn is_connected(&self) -> bool {
        self.bound.read().is_some()
    }
}

fn connect_error(error: ProviderError) -> Error {
    match error {
        ProviderError::Unavailable => Error::ProviderUnavailable,
        other => Error::ProviderRejected(other.to_string()),
    }
}
