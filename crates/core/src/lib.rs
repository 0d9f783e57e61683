//! Core types of the on-chain calculator client.
//!
//! This crate holds everything that does not talk to the network: the static operation
//! table and the contract interface it is bound to, operand marshaling, the small ABI
//! layer used to build calldata and read return values, the error taxonomy and the
//! session state shared with presentation layers.

pub mod abi;
pub mod operand;
pub mod operation;
pub mod result;
pub mod session;

pub use alloy::primitives::{Address, B256, Bytes, U256};
pub use operand::{InputField, OperandInputs, marshal_operands, parse_operand};
pub use operation::{Accessor, CallKind, ContractFunction, Operation};
pub use result::{Error, ErrorKind, Result};
pub use session::{CallResult, Outcome, Session, SessionEvent, SessionState, Ticket};
