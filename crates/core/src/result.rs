//! Core results and error types

use thiserror::Error;

/// Broad class of a failure, matching how the client is allowed to react to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing input, or no connection. Raised before any network call.
    Validation,
    /// Another operation is already in flight.
    Busy,
    /// The wallet provider is missing or refused the connection.
    Provider,
    /// A read-only contract call was rejected.
    Call,
    /// A state-mutating transaction failed or was never included.
    Transaction,
    /// The display simulation after a successful transaction failed.
    Simulation,
}

/// Core error type encompassing every failure the client can surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// No contract handle is bound.
    #[error("wallet not connected; connect a wallet first")]
    NotConnected,

    /// An operand required by the operation was left empty.
    #[error("missing value for `{field}`")]
    MissingOperand {
        /// Name of the missing input.
        field: &'static str,
    },

    /// An operand could not be marshaled into a `uint256`.
    #[error("invalid value for `{field}` ({input:?}): {reason}")]
    InvalidOperand {
        /// Name of the offending input.
        field: &'static str,
        /// The raw text as entered.
        input: String,
        /// Why the text was rejected.
        reason: &'static str,
    },

    /// The operation was rejected because another one is still resolving.
    #[error("{operation} rejected: another operation is in flight")]
    Busy {
        /// Label of the rejected operation.
        operation: &'static str,
    },

    /// No wallet provider is installed.
    #[error("no wallet provider found; install a wallet to use this application")]
    ProviderUnavailable,

    /// The wallet provider refused or failed the connection request.
    #[error("failed to connect wallet: {0}")]
    ProviderRejected(String),

    /// A read-only call failed.
    #[error("{context} failed: {message}")]
    Call {
        /// Human label of the operation or accessor.
        context: &'static str,
        /// Underlying cause, as reported by the provider.
        message: String,
    },

    /// A transaction was rejected, reverted, or not included.
    #[error("{context} failed: {message}")]
    Transaction {
        /// Human label of the operation.
        context: &'static str,
        /// Underlying cause, as reported by the provider.
        message: String,
    },

    /// The read-only replay of a state-mutating call failed.
    #[error("{context} simulation failed: {message}")]
    Simulation {
        /// Human label of the operation.
        context: &'static str,
        /// Underlying cause, as reported by the provider.
        message: String,
    },

    /// The client configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Returns the class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotConnected
            | Error::MissingOperand { .. }
            | Error::InvalidOperand { .. }
            | Error::Config(_) => ErrorKind::Validation,
            Error::Busy { .. } => ErrorKind::Busy,
            Error::ProviderUnavailable | Error::ProviderRejected(_) => ErrorKind::Provider,
            Error::Call { .. } => ErrorKind::Call,
            Error::Transaction { .. } => ErrorKind::Transaction,
            Error::Simulation { .. } => ErrorKind::Simulation,
        }
    }
}

/// Core result type
pub type Result<T> = std::result::Result<T, Error>;
