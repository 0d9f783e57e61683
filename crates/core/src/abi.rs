//! Minimal Solidity ABI support for the calculator interface: selectors, static `uint256`
//! calldata, word-sized return values and revert payloads.

use alloy::primitives::{Address, Bytes, U256};
use sha3::{Digest, Keccak256};
use thiserror::Error;

/// Selector of `Error(string)`.
pub const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Selector of `Panic(uint256)`.
pub const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

const WORD: usize = 32;

/// Errors decoding data returned by the contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    /// Fewer bytes than a single ABI word.
    #[error("return data too short: expected {expected} bytes, got {actual}")]
    ShortData {
        /// Minimum number of bytes.
        expected: usize,
        /// Bytes actually returned.
        actual: usize,
    },
    /// An `address` word with non-zero high bytes.
    #[error("address word has dirty high-order bytes")]
    DirtyAddress,
}

/// Computes the 4-byte selector of a canonical function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    out
}

/// Builds calldata for a function taking only `uint256` arguments.
pub fn encode_call(selector: [u8; 4], args: &[U256]) -> Bytes {
    let mut data = Vec::with_capacity(4 + args.len() * WORD);
    data.extend_from_slice(&selector);
    for arg in args {
        data.extend_from_slice(&arg.to_be_bytes::<32>());
    }
    Bytes::from(data)
}

/// Decodes a single `uint256` return value.
pub fn decode_uint(data: &[u8]) -> Result<U256, AbiError> {
    let word = first_word(data)?;
    Ok(U256::from_be_slice(word))
}

/// Decodes a single `address` return value.
pub fn decode_address(data: &[u8]) -> Result<Address, AbiError> {
    let word = first_word(data)?;
    if word[..12].iter().any(|b| *b != 0) {
        return Err(AbiError::DirtyAddress);
    }
    Ok(Address::from_slice(&word[12..]))
}

fn first_word(data: &[u8]) -> Result<&[u8], AbiError> {
    data.get(..WORD).ok_or(AbiError::ShortData {
        expected: WORD,
        actual: data.len(),
    })
}

/// Renders revert data as a human-readable reason.
///
/// Understands `Error(string)` and `Panic(uint256)`; anything else is shown as hex.
pub fn decode_revert(data: &[u8]) -> String {
    if data.is_empty() {
        return "execution reverted".to_string();
    }

    if let Some(body) = data.strip_prefix(&ERROR_STRING_SELECTOR[..])
        && let Some(reason) = decode_string(body)
    {
        return format!("execution reverted: {reason}");
    }

    if let Some(body) = data.strip_prefix(&PANIC_SELECTOR[..])
        && let Ok(code) = decode_uint(body)
    {
        return format!(
            "execution reverted: panic: {} (0x{:02x})",
            panic_reason(code),
            code.saturating_to::<u64>()
        );
    }

    format!("execution reverted: 0x{}", hex::encode(data))
}

/// Describes a Solidity panic code.
pub fn panic_reason(code: U256) -> &'static str {
    match code.saturating_to::<u64>() {
        0x00 => "generic compiler panic",
        0x01 => "assertion failed",
        0x11 => "arithmetic underflow or overflow",
        0x12 => "division or modulo by zero",
        0x21 => "invalid enum value",
        0x22 => "invalid storage byte array encoding",
        0x31 => "pop on empty array",
        0x32 => "array index out of bounds",
        0x41 => "out of memory",
        0x51 => "call to uninitialized function",
        _ => "unknown panic",
    }
}

/// Decodes the ABI body of a single dynamic `string` argument.
fn decode_string(body: &[u8]) -> Option<String> {
    let offset = usize::try_from(decode_uint(body).ok()?).ok()?;
    let len_start = offset.checked_add(WORD)?;
    let len = usize::try_from(decode_uint(body.get(offset..)?).ok()?).ok()?;
    let bytes = body.get(len_start..len_start.checked_add(len)?)?;
    Some(String::from_utf8_lossy(bytes).into_owned())
}
