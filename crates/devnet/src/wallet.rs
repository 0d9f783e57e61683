//! Wallet provider and signer over the in-process chain.

use crate::chain::Chain;
use abacus_client::{ProviderError, Receipt, Signer, TransactionRequest, WalletProvider};
use abacus_core::{Address, B256, Bytes};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Notify;
use tracing::{debug, trace, warn};

/// Request counters, readable at any time through [`crate::Devnet::stats`].
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub account_requests: AtomicUsize,
    pub calls: AtomicUsize,
    pub transactions: AtomicUsize,
}

/// State shared by the devnet handle, its wallet and every signer it hands out.
#[derive(Debug)]
pub(crate) struct Shared {
    pub chain: Mutex<Chain>,
    pub mined: Notify,
    pub accounts: Vec<Address>,
    pub call_outage: AtomicBool,
    pub inclusion_outage: AtomicBool,
    pub reject: AtomicBool,
    pub counters: Counters,
}

impl Shared {
    pub fn new(chain: Chain, accounts: Vec<Address>) -> Self {
        Self {
            chain: Mutex::new(chain),
            mined: Notify::new(),
            accounts,
            call_outage: AtomicBool::new(false),
            inclusion_outage: AtomicBool::new(false),
            reject: AtomicBool::new(false),
            counters: Counters::default(),
        }
    }

    /// Mines the queue and wakes receipt waiters.
    pub fn mine(&self) -> usize {
        let receipts = self.chain.lock().mine();
        if !receipts.is_empty() {
            debug!(count = receipts.len(), "mined queued transactions");
            self.mined.notify_waiters();
        }
        receipts.len()
    }
}

/// An injected wallet backed by the devnet.
#[derive(Debug, Clone)]
pub struct DevnetWallet {
    shared: Arc<Shared>,
}

impl DevnetWallet {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }
}

#[async_trait]
impl WalletProvider for DevnetWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.shared
            .counters
            .account_requests
            .fetch_add(1, Ordering::Relaxed);
        if self.shared.reject.load(Ordering::Relaxed) {
            warn!("account request rejected");
            return Err(ProviderError::Rejected);
        }
        Ok(self.shared.accounts.clone())
    }

    async fn signer(&self, account: Address) -> Result<Arc<dyn Signer>, ProviderError> {
        if !self.shared.accounts.contains(&account) {
            return Err(ProviderError::InvalidResponse(format!(
                "account {account} is not managed by this wallet"
            )));
        }
        Ok(Arc::new(DevnetSigner {
            account,
            shared: Arc::clone(&self.shared),
        }))
    }
}

/// Signs for one devnet account.
#[derive(Debug)]
pub struct DevnetSigner {
    account: Address,
    shared: Arc<Shared>,
}

#[async_trait]
impl Signer for DevnetSigner {
    fn address(&self) -> Address {
        self.account
    }

    async fn call(&self, request: TransactionRequest) -> Result<Bytes, ProviderError> {
        self.shared.counters.calls.fetch_add(1, Ordering::Relaxed);
        if self.shared.call_outage.load(Ordering::Relaxed) {
            return Err(ProviderError::Transport("node unreachable".into()));
        }
        let execution = self
            .shared
            .chain
            .lock()
            .call(request.from, request.to, request.data)?;
        trace!(gas_used = execution.gas_used(), "call finished");
        execution.into_output()
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<B256, ProviderError> {
        self.shared
            .counters
            .transactions
            .fetch_add(1, Ordering::Relaxed);
        if request.from != self.account {
            return Err(ProviderError::Rejected);
        }
        let tx_hash = self
            .shared
            .chain
            .lock()
            .submit(self.account, request.to, request.data);
        if !self.shared.inclusion_outage.load(Ordering::Relaxed) {
            self.shared.mine();
        }
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<Receipt, ProviderError> {
        loop {
            let mined = self.shared.mined.notified();
            let receipt = self.shared.chain.lock().receipt(&tx_hash);
            if let Some(receipt) = receipt {
                return Ok(receipt);
            }
            trace!(%tx_hash, "waiting for inclusion");
            mined.await;
        }
    }
}
