//! The in-memory chain: a `revm` database, a block counter and a receipt log.

use abacus_client::{ProviderError, Receipt};
use abacus_core::{Address, B256, Bytes, U256, abi};
use revm::bytecode::Bytecode;
use revm::context::TxEnv;
use revm::context::result::{ExecutionResult, Output};
use revm::database::InMemoryDB;
use revm::primitives::{KECCAK_EMPTY, TxKind};
use revm::state::AccountInfo;
use revm::{Context, DatabaseCommit, ExecuteEvm, MainBuilder, MainContext};
use sha3::{Digest, Keccak256};
use std::collections::HashMap;
use tracing::{debug, trace, warn};

const GAS_LIMIT: u64 = 10_000_000;

/// The result of executing one call against the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Execution {
    Success { output: Bytes, gas_used: u64 },
    Revert { output: Bytes, gas_used: u64 },
    Halt { reason: String, gas_used: u64 },
}

impl Execution {
    pub fn gas_used(&self) -> u64 {
        match self {
            Execution::Success { gas_used, .. }
            | Execution::Revert { gas_used, .. }
            | Execution::Halt { gas_used, .. } => *gas_used,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Execution::Success { .. })
    }

    /// Maps a failed execution to the error a JSON-RPC node would report.
    pub fn into_output(self) -> Result<Bytes, ProviderError> {
        match self {
            Execution::Success { output, .. } => Ok(output),
            Execution::Revert { output, .. } => {
                Err(ProviderError::Reverted(abi::decode_revert(&output)))
            }
            Execution::Halt { reason, .. } => {
                Err(ProviderError::Reverted(format!("execution halted: {reason}")))
            }
        }
    }
}

#[derive(Debug, Clone)]
struct PendingTransaction {
    tx_hash: B256,
    from: Address,
    to: Address,
    data: Bytes,
}

/// Chain state shared by every signer of a devnet.
#[derive(Debug, Default)]
pub struct Chain {
    db: InMemoryDB,
    block_number: u64,
    pending: Vec<PendingTransaction>,
    receipts: HashMap<B256, Receipt>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    /// Credits an externally owned account.
    pub fn fund(&mut self, account: Address, balance: U256) {
        self.db.insert_account_info(
            account,
            AccountInfo {
                balance,
                nonce: 0,
                code_hash: KECCAK_EMPTY,
                code: None,
            },
        );
    }

    /// Places runtime code at `address` without a deployment transaction.
    pub fn install(&mut self, address: Address, runtime: Vec<u8>) {
        self.db.insert_account_info(
            address,
            AccountInfo {
                balance: U256::ZERO,
                nonce: 1,
                code_hash: KECCAK_EMPTY,
                code: Some(Bytecode::new_raw(runtime.into())),
            },
        );
    }

    pub fn set_storage(&mut self, address: Address, slot: U256, value: U256) -> Result<(), String> {
        self.db
            .insert_account_storage(address, slot, value)
            .map_err(|e| format!("{e:?}"))
    }

    /// Reads a storage slot as committed.
    pub fn storage(&self, address: Address, slot: U256) -> U256 {
        self.db
            .cache
            .accounts
            .get(&address)
            .and_then(|account| account.storage.get(&slot).copied())
            .unwrap_or_default()
    }

    pub fn nonce(&self, account: Address) -> u64 {
        self.db
            .cache
            .accounts
            .get(&account)
            .map(|account| account.info.nonce)
            .unwrap_or_default()
    }

    pub fn receipt(&self, tx_hash: &B256) -> Option<Receipt> {
        self.receipts.get(tx_hash).copied()
    }

    /// Executes a call without committing anything.
    pub fn call(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
    ) -> Result<Execution, ProviderError> {
        let (execution, _) = self.execute(from, to, data)?;
        trace!(%to, success = execution.is_success(), "eth_call executed");
        Ok(execution)
    }

    /// Queues a transaction and returns its hash. Nothing executes until [`Chain::mine`].
    pub fn submit(&mut self, from: Address, to: Address, data: Bytes) -> B256 {
        let queued = self.pending.iter().filter(|tx| tx.from == from).count() as u64;
        let tx_hash = transaction_hash(from, self.nonce(from) + queued, to, &data);
        self.pending.push(PendingTransaction {
            tx_hash,
            from,
            to,
            data,
        });
        trace!(%tx_hash, queued = self.pending.len(), "transaction queued");
        tx_hash
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Includes every queued transaction, each in its own block, in submission order.
    ///
    /// Every queued transaction gets a receipt, so no receipt waiter is left behind.
    pub fn mine(&mut self) -> Vec<Receipt> {
        let pending = std::mem::take(&mut self.pending);
        pending.into_iter().map(|tx| self.include(tx)).collect()
    }

    /// Executes and commits a transaction. A reverted transaction is still included: the
    /// sender's nonce advances and the receipt carries a failed status. A transaction the
    /// EVM refuses to execute gets a failed receipt without a new block.
    fn include(&mut self, tx: PendingTransaction) -> Receipt {
        let receipt = match self.execute(tx.from, tx.to, tx.data) {
            Ok((execution, state)) => {
                self.db.commit(state);
                self.block_number += 1;
                Receipt {
                    tx_hash: tx.tx_hash,
                    block_number: self.block_number,
                    gas_used: execution.gas_used(),
                    success: execution.is_success(),
                }
            }
            Err(error) => {
                warn!(tx_hash = %tx.tx_hash, %error, "transaction rejected");
                Receipt {
                    tx_hash: tx.tx_hash,
                    block_number: self.block_number,
                    gas_used: 0,
                    success: false,
                }
            }
        };
        self.receipts.insert(tx.tx_hash, receipt);
        debug!(
            tx_hash = %tx.tx_hash,
            block = receipt.block_number,
            success = receipt.success,
            "transaction mined"
        );
        receipt
    }

    fn execute(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
    ) -> Result<(Execution, revm::state::EvmState), ProviderError> {
        let mut evm = Context::mainnet().with_db(self.db.clone()).build_mainnet();
        let tx = TxEnv {
            caller: from,
            gas_limit: GAS_LIMIT,
            kind: TxKind::Call(to),
            data,
            value: U256::ZERO,
            nonce: self.nonce(from),
            ..Default::default()
        };

        let outcome = evm
            .transact(tx)
            .map_err(|e| ProviderError::Transport(format!("EVM error: {e:?}")))?;

        let execution = match outcome.result {
            ExecutionResult::Success {
                output, gas_used, ..
            } => match output {
                Output::Call(output) => Execution::Success { output, gas_used },
                Output::Create(..) => {
                    return Err(ProviderError::InvalidResponse(
                        "unexpected create output".into(),
                    ));
                }
            },
            ExecutionResult::Revert { output, gas_used } => Execution::Revert { output, gas_used },
            ExecutionResult::Halt { reason, gas_used } => Execution::Halt {
                reason: format!("{reason:?}"),
                gas_used,
            },
        };
        Ok((execution, outcome.state))
    }
}

/// Deterministic hash standing in for the keccak of the signed transaction envelope.
pub fn transaction_hash(from: Address, nonce: u64, to: Address, data: &[u8]) -> B256 {
    let mut hasher = Keccak256::new();
    hasher.update(from.as_slice());
    hasher.update(nonce.to_be_bytes());
    hasher.update(to.as_slice());
    hasher.update(data);
    B256::from_slice(&hasher.finalize())
}
