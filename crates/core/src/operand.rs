//! Operand marshaling: user text to `uint256` with zero decimal scaling.

use crate::operation::Operation;
use crate::result::{Error, Result};
use alloy::primitives::U256;
use std::fmt;
use std::str::FromStr;

/// Parses one operand.
///
/// Accepts decimal digits with an optional fractional part made only of zeros (`"5"`,
/// `"5.0"`). Rejects empty input, signs, fractional values, exponents and anything that
/// overflows `uint256`.
///
/// # Arguments
/// * `field` - Name of the input, used in the error.
/// * `input` - Raw text as entered by the user.
pub fn parse_operand(field: &'static str, input: &str) -> Result<U256> {
    let text = input.trim();
    let invalid = |reason| Error::InvalidOperand {
        field,
        input: input.to_string(),
        reason,
    };

    if text.is_empty() {
        return Err(Error::MissingOperand { field });
    }
    if text.starts_with('-') {
        return Err(invalid("negative values are not supported"));
    }

    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text, None),
    };

    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("not a whole number"));
    }
    if let Some(fraction) = fraction {
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("not a whole number"));
        }
        if fraction.bytes().any(|b| b != b'0') {
            return Err(invalid("fractional values are not supported"));
        }
    }

    U256::from_str_radix(whole, 10).map_err(|_| invalid("exceeds the uint256 range"))
}

/// One of the operand inputs of the user surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputField {
    /// First operand of the basic operations.
    First,
    /// Second operand of the basic operations.
    Second,
    Base,
    Exponent,
    /// Operand of the square root.
    Number,
}

impl InputField {
    pub const ALL: [InputField; 5] = [
        InputField::First,
        InputField::Second,
        InputField::Base,
        InputField::Exponent,
        InputField::Number,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            InputField::First => "a",
            InputField::Second => "b",
            InputField::Base => "base",
            InputField::Exponent => "exponent",
            InputField::Number => "number",
        }
    }
}

impl fmt::Display for InputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InputField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "first" => Ok(InputField::First),
            "b" | "second" => Ok(InputField::Second),
            "base" => Ok(InputField::Base),
            "exponent" | "exp" => Ok(InputField::Exponent),
            "number" | "n" => Ok(InputField::Number),
            other => Err(format!(
                "unknown input `{other}` (expected one of: a, b, base, exponent, number)"
            )),
        }
    }
}

/// The pending operand texts, one slot per input field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperandInputs {
    pub first: String,
    pub second: String,
    pub base: String,
    pub exponent: String,
    pub number: String,
}

impl OperandInputs {
    pub fn get(&self, field: InputField) -> &str {
        match field {
            InputField::First => &self.first,
            InputField::Second => &self.second,
            InputField::Base => &self.base,
            InputField::Exponent => &self.exponent,
            InputField::Number => &self.number,
        }
    }

    pub fn set(&mut self, field: InputField, value: impl Into<String>) {
        let slot = match field {
            InputField::First => &mut self.first,
            InputField::Second => &mut self.second,
            InputField::Base => &mut self.base,
            InputField::Exponent => &mut self.exponent,
            InputField::Number => &mut self.number,
        };
        *slot = value.into();
    }

    /// Empties every slot.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        InputField::ALL.iter().all(|field| self.get(*field).is_empty())
    }

    /// Returns the raw texts the operation reads, in argument order.
    pub fn texts_for(&self, operation: Operation) -> Vec<&str> {
        operation
            .input_fields()
            .iter()
            .map(|field| self.get(*field))
            .collect()
    }
}

/// Marshals the raw operand texts of an operation.
///
/// Fails on the first missing or malformed operand. A wrong number of texts is reported
/// as a missing operand for the first parameter that has no text.
pub fn marshal_operands(operation: Operation, texts: &[&str]) -> Result<Vec<U256>> {
    let fields = operation.input_fields();
    if texts.len() > fields.len() {
        return Err(Error::InvalidOperand {
            field: fields.last().map_or("operand", |f| f.name()),
            input: texts[fields.len()..].join(" "),
            reason: "too many operands",
        });
    }

    fields
        .iter()
        .enumerate()
        .map(|(i, field)| parse_operand(field.name(), texts.get(i).copied().unwrap_or("")))
        .collect()
}
