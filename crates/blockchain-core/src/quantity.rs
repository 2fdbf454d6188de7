// blockchain-core/src/quantity.rs

//! Hex quantity codec used by the node's JSON-RPC interface.
//!
//! Quantities are `0x`-prefixed, lowercase, with no leading zeros
//! (`0x0` is the only representation of zero).

use crate::{BlockNumber, HexError, HexResult};

/// Maximum hex digits a `u64` can hold
const MAX_U64_DIGITS: usize = 16;

/// Encode an unsigned integer as a hex quantity
pub fn encode_quantity(value: u64) -> String {
    format!("0x{:x}", value)
}

/// Decode a hex quantity into an unsigned integer
pub fn decode_quantity(input: &str) -> HexResult<u64> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .ok_or_else(|| HexError::MissingPrefix(input.to_string()))?;

    if digits.is_empty() {
        return Err(HexError::Empty);
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(HexError::InvalidDigit(input.to_string()));
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return Err(HexError::LeadingZero(input.to_string()));
    }
    if digits.len() > MAX_U64_DIGITS {
        return Err(HexError::Overflow(input.to_string()));
    }

    u64::from_str_radix(digits, 16).map_err(|_| HexError::InvalidDigit(input.to_string()))
}

/// Encode a block number for use as an RPC parameter
pub fn encode_block_number(number: BlockNumber) -> String {
    encode_quantity(number)
}

/// Decode the `number` field of a block into a cursor value
pub fn decode_block_number(input: &str) -> HexResult<BlockNumber> {
    decode_quantity(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_known_values() {
        assert_eq!(encode_quantity(0), "0x0");
        assert_eq!(encode_quantity(1), "0x1");
        assert_eq!(encode_quantity(255), "0xff");
        assert_eq!(encode_quantity(u64::MAX), "0xffffffffffffffff");
    }

    #[test]
    fn test_decode_known_values() {
        assert_eq!(decode_quantity("0x0").unwrap(), 0);
        assert_eq!(decode_quantity("0x7b").unwrap(), 123);
        assert_eq!(decode_quantity("0X7B").unwrap(), 123);
        assert_eq!(decode_quantity("0xffffffffffffffff").unwrap(), u64::MAX);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(matches!(decode_quantity("7b"), Err(HexError::MissingPrefix(_))));
        assert!(matches!(decode_quantity("0x"), Err(HexError::Empty)));
        assert!(matches!(decode_quantity("0x01"), Err(HexError::LeadingZero(_))));
        assert!(matches!(decode_quantity("0x1ffffffffffffffff"), Err(HexError::Overflow(_))));
        assert!(matches!(decode_quantity("0xzz"), Err(HexError::InvalidDigit(_))));
    }

    proptest! {
        #[test]
        fn prop_quantity_round_trip(value in any::<u64>()) {
            prop_assert_eq!(decode_quantity(&encode_quantity(value)).unwrap(), value);
        }
    }
}
