//! Scripted wallet and signer for unit tests.

use crate::provider::{ProviderError, Receipt, Signer, TransactionRequest, WalletProvider};
use abacus_core::operation::{OWNER, SCIENTIFIC_CALCULATOR_ADDRESS};
use abacus_core::{Address, B256, Bytes, Operation, U256, abi};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Notify;

pub(crate) fn scientific() -> Address {
    Address::repeat_byte(0x5c)
}

#[derive(Debug, Default)]
pub(crate) struct MockState {
    pub calls: usize,
    pub sent: Vec<TransactionRequest>,
    pub receipts: HashMap<B256, Receipt>,
    /// Every `eth_call` fails with a transport error.
    pub fail_calls: bool,
    /// Submitted transactions are included with a failed status.
    pub revert_transactions: bool,
    /// Submitted transactions never get a receipt.
    pub drop_transactions: bool,
}

pub(crate) struct MockSigner {
    account: Address,
    pub state: Mutex<MockState>,
    /// When set, every `eth_call` waits for a notification before answering.
    gate: Option<Arc<Notify>>,
}

impl MockSigner {
    pub fn new(account: Address) -> Self {
        Self {
            account,
            state: Mutex::new(MockState::default()),
            gate: None,
        }
    }

    pub fn gated(account: Address, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(account)
        }
    }

    /// Number of requests that reached the "network".
    pub fn requests(&self) -> usize {
        let state = self.state.lock();
        state.calls + state.sent.len()
    }

    fn execute(&self, data: &[u8]) -> Result<U256, ProviderError> {
        let selector: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| ProviderError::Reverted(abi::decode_revert(&[])))?;
        let word = |i: usize| {
            data.get(4 + 32 * i..4 + 32 * (i + 1))
                .map(U256::from_be_slice)
                .unwrap_or_default()
        };

        if selector == OWNER.selector() {
            return Ok(U256::from_be_slice(self.account.as_slice()));
        }
        if selector == SCIENTIFIC_CALCULATOR_ADDRESS.selector() {
            return Ok(U256::from_be_slice(scientific().as_slice()));
        }

        let operation = Operation::ALL
            .into_iter()
            .find(|op| op.function().selector() == selector)
            .ok_or_else(|| ProviderError::Reverted(abi::decode_revert(&[])))?;
        let (a, b) = (word(0), word(1));
        let panic = |code: u8| {
            let mut payload = abi::PANIC_SELECTOR.to_vec();
            payload.extend_from_slice(&U256::from(code).to_be_bytes::<32>());
            ProviderError::Reverted(abi::decode_revert(&payload))
        };

        match operation {
            Operation::Add => a.checked_add(b).ok_or_else(|| panic(0x11)),
            Operation::Subtract => a.checked_sub(b).ok_or_else(|| panic(0x11)),
            Operation::Multiply => a.checked_mul(b).ok_or_else(|| panic(0x11)),
            Operation::Divide => a.checked_div(b).ok_or_else(|| panic(0x12)),
            Operation::Power => Ok(a.wrapping_pow(b)),
            Operation::SquareRoot => Ok(isqrt(a)),
        }
    }
}

fn isqrt(n: U256) -> U256 {
    if n.is_zero() {
        return n;
    }
    let mut x = n;
    let mut y = (n >> 1) + (n & U256::from(1));
    while y < x {
        x = y;
        y = (x + n / x) >> 1;
    }
    x
}

#[async_trait]
impl Signer for MockSigner {
    fn address(&self) -> Address {
        self.account
    }

    async fn call(&self, request: TransactionRequest) -> Result<Bytes, ProviderError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let fail = {
            let mut state = self.state.lock();
            state.calls += 1;
            state.fail_calls
        };
        if fail {
            return Err(ProviderError::Transport("read path unavailable".into()));
        }
        let value = self.execute(&request.data)?;
        Ok(Bytes::from(value.to_be_bytes::<32>().to_vec()))
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<B256, ProviderError> {
        let success = self.execute(&request.data).is_ok();
        let mut state = self.state.lock();
        state.sent.push(request);
        let tx_hash = B256::with_last_byte(state.sent.len() as u8);
        if !state.drop_transactions {
            let receipt = Receipt {
                tx_hash,
                block_number: state.sent.len() as u64,
                gas_used: 21_000,
                success: success && !state.revert_transactions,
            };
            state.receipts.insert(tx_hash, receipt);
        }
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<Receipt, ProviderError> {
        let receipt = self.state.lock().receipts.get(&tx_hash).copied();
        match receipt {
            Some(receipt) => Ok(receipt),
            None => std::future::pending().await,
        }
    }
}

pub(crate) struct MockWallet {
    pub accounts: Vec<Address>,
    pub reject: bool,
    pub signer: Arc<MockSigner>,
}

impl MockWallet {
    pub fn new(signer: Arc<MockSigner>) -> Self {
        Self {
            accounts: vec![signer.address()],
            reject: false,
            signer,
        }
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        if self.reject {
            return Err(ProviderError::Rejected);
        }
        Ok(self.accounts.clone())
    }

    async fn signer(&self, _account: Address) -> Result<Arc<dyn Signer>, ProviderError> {
        Ok(self.signer.clone() as Arc<dyn Signer>)
    }
}
