//! The client facade tying connection, dispatch and session together.

use crate::config::ClientConfig;
use crate::connection::ConnectionManager;
use crate::contract::CalculatorContract;
use crate::dispatcher;
use crate::provider::WalletProvider;
use abacus_core::{
    Accessor, Address, CallResult, Error, InputField, Operation, Outcome, Result, Session,
    SessionEvent, SessionState, Ticket, U256, marshal_operands,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{Instrument, debug, info_span, warn};

/// An on-chain calculator session.
///
/// All methods take `&self`; the session lock is only held for short synchronous
/// sections, never across a network round trip. Operations are serialized by the
/// session's busy flag: a dispatch while another one is in flight fails with
/// [`Error::Busy`] and changes nothing.
pub struct Calculator {
    connection: ConnectionManager,
    session: Mutex<Session>,
    receipt_timeout: Option<Duration>,
}

impl Calculator {
    /// Creates a disconnected calculator.
    ///
    /// # Arguments
    /// * `provider` - The wallet provider, or `None` when no wallet is installed.
    /// * `config` - Contract address and receipt timeout.
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, config: &ClientConfig) -> Result<Self> {
        let contract_address = config.contract_address()?;
        Ok(Self {
            connection: ConnectionManager::new(provider, contract_address),
            session: Mutex::new(Session::new()),
            receipt_timeout: config.receipt_timeout(),
        })
    }

    /// Subscribes to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.session.lock().subscribe()
    }

    /// Returns a copy of the current session state.
    pub fn snapshot(&self) -> SessionState {
        self.session.lock().state().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.session.lock().is_busy()
    }

    pub fn contract_address(&self) -> Address {
        self.connection.contract_address()
    }

    /// Connects the wallet and binds the contract handle.
    ///
    /// On failure the error is shown in the session and any previous binding is kept.
    pub async fn connect(&self) -> Result<Address> {
        match self.connection.connect().await {
            Ok(contract) => {
                let account = contract.account();
                self.session.lock().connected(account);
                Ok(account)
            }
            Err(error) => {
                warn!(%error, "connect failed");
                self.session.lock().fail(&error);
                Err(error)
            }
        }
    }

    /// Drops the binding and resets the session, inputs included. Idempotent.
    pub fn disconnect(&self) {
        self.connection.disconnect();
        self.session.lock().reset();
    }

    pub fn set_input(&self, field: InputField, value: impl Into<String>) {
        self.session.lock().set_input(field, value);
    }

    /// Empties the inputs and the result/error slot without disconnecting.
    pub fn clear(&self) {
        self.session.lock().clear();
    }

    /// Dispatches `operation` with the operands currently held in the session inputs.
    pub async fn run(&self, operation: Operation) -> Result<Outcome> {
        let prepared = self.prepare(operation, None)?;
        self.execute(operation, prepared).await
    }

    /// Dispatches `operation` with explicit operand texts.
    pub async fn dispatch(&self, operation: Operation, operands: &[&str]) -> Result<Outcome> {
        let prepared = self.prepare(operation, Some(operands))?;
        self.execute(operation, prepared).await
    }

    /// Validates and takes the busy flag, all under one lock.
    fn prepare(&self, operation: Operation, texts: Option<&[&str]>) -> Result<Prepared> {
        let mut session = self.session.lock();
        if session.is_busy() {
            return Err(Error::Busy {
                operation: operation.label(),
            });
        }

        let validated = self.connection.contract().and_then(|contract| {
            let operands = match texts {
                Some(texts) => marshal_operands(operation, texts),
                None => marshal_operands(operation, &session.state().inputs.texts_for(operation)),
            }?;
            Ok((contract, operands))
        });

        match validated {
            Ok((contract, operands)) => {
                let ticket = session.begin(operation)?;
                Ok(Prepared {
                    ticket,
                    contract,
                    operands,
                })
            }
            Err(error) => {
                debug!(%operation, %error, "rejected before dispatch");
                session.fail(&error);
                Err(error)
            }
        }
    }

    async fn execute(&self, operation: Operation, prepared: Prepared) -> Result<Outcome> {
        let Prepared {
            ticket,
            contract,
            operands,
        } = prepared;
        let mut guard = BusyGuard {
            session: &self.session,
            ticket: Some(ticket),
        };

        let result = dispatcher::dispatch(&contract, operation, &operands, self.receipt_timeout)
            .instrument(info_span!("dispatch", %operation))
            .await;

        if let Err(error) = &result {
            warn!(%operation, %error, "operation failed");
        }
        guard.finish(CallResult::from(&result));
        result
    }

    /// Reads one of the contract's address accessors. Leaves the session untouched.
    pub async fn accessor(&self, accessor: Accessor) -> Result<Address> {
        let contract = self.connection.contract()?;
        contract
            .call_address(accessor)
            .await
            .map_err(|e| Error::Call {
                context: accessor.label(),
                message: e.to_string(),
            })
    }

    pub async fn owner(&self) -> Result<Address> {
        self.accessor(Accessor::Owner).await
    }

    pub async fn scientific_calculator_address(&self) -> Result<Address> {
        self.accessor(Accessor::ScientificCalculatorAddress).await
    }
}

struct Prepared {
    ticket: Ticket,
    contract: CalculatorContract,
    operands: Vec<U256>,
}

/// Releases the busy flag when the dispatch future completes or is dropped.
struct BusyGuard<'a> {
    session: &'a Mutex<Session>,
    ticket: Option<Ticket>,
}

impl BusyGuard<'_> {
    fn finish(&mut self, result: CallResult) {
        if let Some(ticket) = self.ticket.take()
            && !self.session.lock().finish(ticket, result)
        {
            debug!("session was reset while in flight; result discarded");
        }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.session.lock().abandon(ticket);
        }
    }
}
