//! The calculator's bound contract interface and the static classification of each
//! arithmetic operation.
//!
//! Every [`Operation`] maps to exactly one [`ContractFunction`] and one [`CallKind`]. The
//! mapping is a plain `match`, so adding an operation without deciding how it is called
//! does not compile.

use crate::abi;
use crate::operand::InputField;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a contract function has to be invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    /// `pure`/`view`: a single `eth_call`, no signature, no block confirmation.
    ReadOnly,
    /// Changes contract state: signed transaction, then a simulation to recover the value.
    StateMutating,
}

/// A function of the calculator contract's ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractFunction {
    /// Solidity name.
    pub name: &'static str,
    /// Canonical signature used to derive the selector.
    pub signature: &'static str,
    /// Names of the `uint256` parameters, in ABI order.
    pub params: &'static [&'static str],
}

impl ContractFunction {
    /// Returns the 4-byte function selector.
    pub fn selector(&self) -> [u8; 4] {
        abi::selector(self.signature)
    }
}

pub const ADD: ContractFunction = ContractFunction {
    name: "add",
    signature: "add(uint256,uint256)",
    params: &["a", "b"],
};

pub const SUBTRACT: ContractFunction = ContractFunction {
    name: "subtract",
    signature: "subtract(uint256,uint256)",
    params: &["a", "b"],
};

pub const MULTIPLY: ContractFunction = ContractFunction {
    name: "multiply",
    signature: "multiply(uint256,uint256)",
    params: &["a", "b"],
};

pub const DIVIDE: ContractFunction = ContractFunction {
    name: "divide",
    signature: "divide(uint256,uint256)",
    params: &["a", "b"],
};

pub const CALCULATE_POWER: ContractFunction = ContractFunction {
    name: "calculatePower",
    signature: "calculatePower(uint256,uint256)",
    params: &["base", "exponent"],
};

pub const CALCULATE_SQUARE_ROOT: ContractFunction = ContractFunction {
    name: "calculateSquareRoot",
    signature: "calculateSquareRoot(uint256)",
    params: &["number"],
};

pub const OWNER: ContractFunction = ContractFunction {
    name: "owner",
    signature: "owner()",
    params: &[],
};

pub const SCIENTIFIC_CALCULATOR_ADDRESS: ContractFunction = ContractFunction {
    name: "scientificCalculatorAddress",
    signature: "scientificCalculatorAddress()",
    params: &[],
};

/// The full interface a contract handle is bound to.
pub const INTERFACE: [&ContractFunction; 8] = [
    &ADD,
    &SUBTRACT,
    &MULTIPLY,
    &DIVIDE,
    &CALCULATE_POWER,
    &CALCULATE_SQUARE_ROOT,
    &OWNER,
    &SCIENTIFIC_CALCULATOR_ADDRESS,
];

/// An arithmetic operation offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    SquareRoot,
}

impl Operation {
    /// Every operation, in display order.
    pub const ALL: [Operation; 6] = [
        Operation::Add,
        Operation::Subtract,
        Operation::Multiply,
        Operation::Divide,
        Operation::Power,
        Operation::SquareRoot,
    ];

    /// Returns how this operation has to be invoked on chain.
    pub const fn call_kind(self) -> CallKind {
        match self {
            Operation::Add
            | Operation::Subtract
            | Operation::Multiply
            | Operation::Divide
            | Operation::Power => CallKind::ReadOnly,
            Operation::SquareRoot => CallKind::StateMutating,
        }
    }

    /// Returns the contract function backing this operation.
    pub const fn function(self) -> &'static ContractFunction {
        match self {
            Operation::Add => &ADD,
            Operation::Subtract => &SUBTRACT,
            Operation::Multiply => &MULTIPLY,
            Operation::Divide => &DIVIDE,
            Operation::Power => &CALCULATE_POWER,
            Operation::SquareRoot => &CALCULATE_SQUARE_ROOT,
        }
    }

    /// Returns the user inputs this operation reads, in argument order.
    pub const fn input_fields(self) -> &'static [InputField] {
        match self {
            Operation::Add | Operation::Subtract | Operation::Multiply | Operation::Divide => {
                &[InputField::First, InputField::Second]
            }
            Operation::Power => &[InputField::Base, InputField::Exponent],
            Operation::SquareRoot => &[InputField::Number],
        }
    }

    /// Number of operands.
    pub const fn arity(self) -> usize {
        self.function().params.len()
    }

    /// Human label used in messages, e.g. `"Power calculation failed: ..."`.
    pub const fn label(self) -> &'static str {
        match self {
            Operation::Add => "Addition",
            Operation::Subtract => "Subtraction",
            Operation::Multiply => "Multiplication",
            Operation::Divide => "Division",
            Operation::Power => "Power calculation",
            Operation::SquareRoot => "Square root calculation",
        }
    }

    /// Short symbol for compact rendering.
    pub const fn symbol(self) -> &'static str {
        match self {
            Operation::Add => "+",
            Operation::Subtract => "-",
            Operation::Multiply => "×",
            Operation::Divide => "÷",
            Operation::Power => "^",
            Operation::SquareRoot => "√",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Add => "add",
            Operation::Subtract => "subtract",
            Operation::Multiply => "multiply",
            Operation::Divide => "divide",
            Operation::Power => "power",
            Operation::SquareRoot => "sqrt",
        };
        f.write_str(name)
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "add" | "+" => Ok(Operation::Add),
            "subtract" | "sub" | "-" => Ok(Operation::Subtract),
            "multiply" | "mul" | "*" | "x" => Ok(Operation::Multiply),
            "divide" | "div" | "/" => Ok(Operation::Divide),
            "power" | "pow" | "^" => Ok(Operation::Power),
            "sqrt" | "square_root" | "squareroot" => Ok(Operation::SquareRoot),
            other => Err(format!(
                "unknown operation `{other}` (expected one of: add, subtract, multiply, divide, power, sqrt)"
            )),
        }
    }
}

/// A read-only accessor of the contract that is not an arithmetic operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accessor {
    Owner,
    ScientificCalculatorAddress,
}

impl Accessor {
    pub const fn function(self) -> &'static ContractFunction {
        match self {
            Accessor::Owner => &OWNER,
            Accessor::ScientificCalculatorAddress => &SCIENTIFIC_CALCULATOR_ADDRESS,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Accessor::Owner => "Owner lookup",
            Accessor::ScientificCalculatorAddress => "Scientific calculator lookup",
        }
    }
}
