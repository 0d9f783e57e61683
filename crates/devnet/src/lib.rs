//! In-process development chain for the calculator client.
//!
//! A [`Devnet`] runs the calculator contract on `revm` over an in-memory database and
//! exposes a [`WalletProvider`] for it, so the client can be driven end to end without a
//! node or a browser wallet. Transactions are mined as soon as they are submitted unless
//! inclusion is paused with [`Devnet::set_inclusion_outage`].

pub mod chain;
pub mod contract;
pub mod wallet;

use abacus_client::{DEFAULT_CONTRACT_ADDRESS, WalletProvider};
use abacus_core::{Address, U256};
use chain::Chain;
use contract::{CALCULATIONS_SLOT, LAST_RESULT_SLOT, OWNER_SLOT, SCIENTIFIC_SLOT};
use sha3::{Digest, Keccak256};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use thiserror::Error;
use tracing::{debug, info};
use wallet::Shared;

pub use wallet::{DevnetSigner, DevnetWallet};

/// Errors raised while setting up or driving the devnet.
#[derive(Debug, Error)]
pub enum Error {
    #[error("assembly failed: {0}")]
    Assembly(String),
    #[error("devnet setup failed: {0}")]
    Setup(String),
}

/// Snapshot of the request counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub account_requests: usize,
    pub calls: usize,
    pub transactions: usize,
}

impl Stats {
    /// Requests that reached the chain, account requests excluded.
    pub fn network_requests(&self) -> usize {
        self.calls + self.transactions
    }
}

/// Derives the `index`-th devnet account.
pub fn dev_account(index: usize) -> Address {
    let digest = Keccak256::digest(format!("abacus-devnet/account/{index}"));
    Address::from_slice(&digest[12..])
}

/// Balance of every devnet account: 1 ether.
const ACCOUNT_BALANCE: u128 = 1_000_000_000_000_000_000;

/// Address stored as the calculator's scientific calculator link.
pub const SCIENTIFIC_CALCULATOR: Address = Address::repeat_byte(0x5c);

/// Configures a [`Devnet`].
#[derive(Debug, Clone)]
pub struct DevnetBuilder {
    accounts: usize,
    contract_address: Option<Address>,
}

impl Default for DevnetBuilder {
    fn default() -> Self {
        Self {
            accounts: 1,
            contract_address: None,
        }
    }
}

impl DevnetBuilder {
    /// Number of funded accounts the wallet hands out. Zero yields an empty account list.
    pub fn accounts(mut self, accounts: usize) -> Self {
        self.accounts = accounts;
        self
    }

    /// Address the calculator is installed at. Defaults to the production address.
    pub fn contract_address(mut self, address: Address) -> Self {
        self.contract_address = Some(address);
        self
    }

    pub fn build(self) -> Result<Devnet, Error> {
        let contract_address = match self.contract_address {
            Some(address) => address,
            None => Address::from_str(DEFAULT_CONTRACT_ADDRESS)
                .map_err(|e| Error::Setup(e.to_string()))?,
        };
        let accounts: Vec<Address> = (0..self.accounts).map(dev_account).collect();
        // the deployer owns the contract; with no accounts nobody does
        let owner = accounts.first().copied().unwrap_or(Address::ZERO);

        let runtime = contract::calculator_runtime()?;
        debug!(runtime = %hex::encode(&runtime), "calculator runtime");

        let mut chain = Chain::new();
        for account in &accounts {
            chain.fund(*account, U256::from(ACCOUNT_BALANCE));
        }
        chain.install(contract_address, runtime);
        for (slot, value) in [
            (OWNER_SLOT, U256::from_be_slice(owner.as_slice())),
            (
                SCIENTIFIC_SLOT,
                U256::from_be_slice(SCIENTIFIC_CALCULATOR.as_slice()),
            ),
        ] {
            chain
                .set_storage(contract_address, U256::from(slot), value)
                .map_err(Error::Setup)?;
        }

        info!(
            contract = %contract_address,
            accounts = accounts.len(),
            %owner,
            "devnet started"
        );
        Ok(Devnet {
            contract_address,
            shared: Arc::new(Shared::new(chain, accounts)),
        })
    }
}

/// Handle to a running in-process chain. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Devnet {
    contract_address: Address,
    shared: Arc<Shared>,
}

impl Devnet {
    pub fn builder() -> DevnetBuilder {
        DevnetBuilder::default()
    }

    /// A devnet with one funded account and the calculator at the default address.
    pub fn start() -> Result<Self, Error> {
        Self::builder().build()
    }

    /// The wallet provider for this chain.
    pub fn wallet(&self) -> Arc<dyn WalletProvider> {
        Arc::new(DevnetWallet::new(Arc::clone(&self.shared)))
    }

    pub fn accounts(&self) -> &[Address] {
        &self.shared.accounts
    }

    pub fn contract_address(&self) -> Address {
        self.contract_address
    }

    /// Makes every read-only call fail with a transport error.
    pub fn set_call_outage(&self, enabled: bool) {
        self.shared.call_outage.store(enabled, Ordering::Relaxed);
    }

    /// Pauses inclusion. Lifting the outage mines everything submitted meanwhile.
    pub fn set_inclusion_outage(&self, enabled: bool) {
        self.shared.inclusion_outage.store(enabled, Ordering::Relaxed);
        if !enabled {
            self.shared.mine();
        }
    }

    /// Makes the wallet decline account requests.
    pub fn set_rejecting(&self, enabled: bool) {
        self.shared.reject.store(enabled, Ordering::Relaxed);
    }

    pub fn stats(&self) -> Stats {
        let counters = &self.shared.counters;
        Stats {
            account_requests: counters.account_requests.load(Ordering::Relaxed),
            calls: counters.calls.load(Ordering::Relaxed),
            transactions: counters.transactions.load(Ordering::Relaxed),
        }
    }

    pub fn block_number(&self) -> u64 {
        self.shared.chain.lock().block_number()
    }

    /// Transactions submitted but not yet mined.
    pub fn pending_transactions(&self) -> usize {
        self.shared.chain.lock().pending()
    }

    /// The last square root stored by a transaction.
    pub fn last_result(&self) -> U256 {
        self.storage(LAST_RESULT_SLOT)
    }

    /// Number of square root transactions executed.
    pub fn calculations(&self) -> U256 {
        self.storage(CALCULATIONS_SLOT)
    }

    fn storage(&self, slot: u8) -> U256 {
        self.shared
            .chain
            .lock()
            .storage(self.contract_address, U256::from(slot))
    }
}
