//! Session state: the connected account, the busy flag, the single result/error slot and
//! the pending operand inputs.
//!
//! The session is an owned value with one writer at a time. Every change is published on
//! a broadcast channel as a [`SessionEvent`], so any presentation layer can follow along
//! without polling.

use crate::operand::{InputField, OperandInputs};
use crate::operation::Operation;
use crate::result::{Error, ErrorKind, Result};
use alloy::primitives::{Address, B256, U256};
use std::fmt;
use tokio::sync::broadcast;
use tracing::debug;

const EVENT_CAPACITY: usize = 64;

/// Successful resolution of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The value computed by the contract.
    Value(U256),
    /// The transaction was included but no value could be recovered; only its hash is known.
    Submitted {
        /// Hash of the included transaction.
        tx_hash: B256,
    },
}

impl Outcome {
    pub fn value(&self) -> Option<U256> {
        match self {
            Outcome::Value(value) => Some(*value),
            Outcome::Submitted { .. } => None,
        }
    }

    pub fn tx_hash(&self) -> Option<B256> {
        match self {
            Outcome::Value(_) => None,
            Outcome::Submitted { tx_hash } => Some(*tx_hash),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Value(value) => write!(f, "{value}"),
            Outcome::Submitted { tx_hash } => write!(f, "Transaction successful. Hash: {tx_hash}"),
        }
    }
}

/// Content of the result/error slot. Exactly one variant is populated at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallResult {
    /// A numeric result.
    Value(U256),
    /// A transaction reference, with no claimed value.
    Submitted { tx_hash: B256 },
    /// A failure, rendered for display.
    Failed { kind: ErrorKind, message: String },
}

impl CallResult {
    pub fn is_error(&self) -> bool {
        matches!(self, CallResult::Failed { .. })
    }
}

impl From<Outcome> for CallResult {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Value(value) => CallResult::Value(value),
            Outcome::Submitted { tx_hash } => CallResult::Submitted { tx_hash },
        }
    }
}

impl From<&Error> for CallResult {
    fn from(error: &Error) -> Self {
        CallResult::Failed {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl From<&Result<Outcome>> for CallResult {
    fn from(result: &Result<Outcome>) -> Self {
        match result {
            Ok(outcome) => CallResult::from(*outcome),
            Err(error) => CallResult::from(error),
        }
    }
}

impl fmt::Display for CallResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallResult::Value(value) => write!(f, "{value}"),
            CallResult::Submitted { tx_hash } => {
                write!(f, "Transaction successful. Hash: {tx_hash}")
            }
            CallResult::Failed { message, .. } => write!(f, "error: {message}"),
        }
    }
}

/// A snapshot of everything a presentation layer may show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Active account, `Some` iff connected.
    pub account: Option<Address>,
    /// True while an operation is between dispatch and resolution.
    pub busy: bool,
    /// The result/error slot.
    pub last: Option<CallResult>,
    /// Pending operand texts.
    pub inputs: OperandInputs,
}

impl SessionState {
    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }

    /// The error message currently shown, if any.
    pub fn error(&self) -> Option<&str> {
        match &self.last {
            Some(CallResult::Failed { message, .. }) => Some(message),
            _ => None,
        }
    }

    /// The result currently shown, if any.
    pub fn result(&self) -> Option<&CallResult> {
        self.last.as_ref().filter(|last| !last.is_error())
    }
}

/// A change to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Connected { account: Address },
    Disconnected,
    /// An operation was dispatched; the session is busy.
    Started { operation: Operation },
    /// An operation resolved; the session is idle again.
    Finished {
        operation: Operation,
        result: CallResult,
    },
    /// The slot was filled without dispatching (validation or connection failure).
    Failed { result: CallResult },
    InputChanged { field: InputField, value: String },
    /// Inputs and the result/error slot were emptied.
    Cleared,
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEvent::Connected { account } => write!(f, "connected as {account}"),
            SessionEvent::Disconnected => f.write_str("disconnected"),
            SessionEvent::Started { operation } => write!(f, "{} ...", operation.label()),
            SessionEvent::Finished { operation, result } => {
                write!(f, "{} {}: {result}", operation.symbol(), operation)
            }
            SessionEvent::Failed { result } => write!(f, "{result}"),
            SessionEvent::InputChanged { field, value } => write!(f, "{field} = {value:?}"),
            SessionEvent::Cleared => f.write_str("cleared"),
        }
    }
}

/// Proof that an operation holds the busy flag.
///
/// A ticket becomes stale when the session is reset; finishing a stale ticket is a no-op.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a ticket must be finished or abandoned to release the busy flag"]
pub struct Ticket {
    epoch: u64,
    operation: Operation,
}

impl Ticket {
    pub fn operation(&self) -> Operation {
        self.operation
    }
}

/// The mutable session.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    epoch: u64,
    events: broadcast::Sender<SessionEvent>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: SessionState::default(),
            epoch: 0,
            events,
        }
    }

    /// Subscribes to future session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state.busy
    }

    fn emit(&self, event: SessionEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    /// Marks the session connected.
    pub fn connected(&mut self, account: Address) {
        self.state.account = Some(account);
        if self.state.error().is_some() {
            self.state.last = None;
        }
        self.emit(SessionEvent::Connected { account });
    }

    /// Fills the slot with an error that did not go through dispatch.
    pub fn fail(&mut self, error: &Error) {
        let result = CallResult::from(error);
        self.state.last = Some(result.clone());
        self.emit(SessionEvent::Failed { result });
    }

    /// Takes the busy flag for `operation`.
    ///
    /// Rejected with [`Error::Busy`] while another operation holds it, leaving the session
    /// untouched. On success any stale error is cleared.
    pub fn begin(&mut self, operation: Operation) -> Result<Ticket> {
        if self.state.busy {
            debug!(%operation, "operation in flight; rejecting");
            return Err(Error::Busy {
                operation: operation.label(),
            });
        }
        self.state.busy = true;
        if self.state.error().is_some() {
            self.state.last = None;
        }
        self.emit(SessionEvent::Started { operation });
        Ok(Ticket {
            epoch: self.epoch,
            operation,
        })
    }

    /// Releases the busy flag and stores the result.
    ///
    /// Returns false, changing nothing, if the session was reset since the ticket was issued.
    pub fn finish(&mut self, ticket: Ticket, result: CallResult) -> bool {
        if ticket.epoch != self.epoch {
            return false;
        }
        self.state.busy = false;
        self.state.last = Some(result.clone());
        self.emit(SessionEvent::Finished {
            operation: ticket.operation,
            result,
        });
        true
    }

    /// Releases the busy flag without a result (the operation was dropped mid-flight).
    pub fn abandon(&mut self, ticket: Ticket) {
        if ticket.epoch == self.epoch {
            self.state.busy = false;
        }
    }

    pub fn set_input(&mut self, field: InputField, value: impl Into<String>) {
        let value = value.into();
        self.state.inputs.set(field, value.clone());
        self.emit(SessionEvent::InputChanged { field, value });
    }

    /// Empties the inputs and the result/error slot. The connection is kept.
    pub fn clear(&mut self) {
        self.state.last = None;
        self.state.inputs.clear();
        self.emit(SessionEvent::Cleared);
    }

    /// Returns to the initial state and invalidates outstanding tickets.
    pub fn reset(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        debug!(epoch = self.epoch, busy = self.state.busy, "session reset");
        self.state = SessionState::default();
        self.emit(SessionEvent::Disconnected);
    }
}
