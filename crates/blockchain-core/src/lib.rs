// blockchain-core/src/lib.rs

//! Chain-native data structures for an observed node
//!
//! This crate provides:
//! - Block structure (hash-only and full-transaction forms)
//! - Transaction structure
//! - Hex quantity encoding used on the wire

pub mod block;
pub mod quantity;
pub mod transaction;
pub mod types;

pub use block::{Block, BlockSummary, BlockWithTransactions};
pub use quantity::{decode_quantity, encode_quantity};
pub use transaction::Transaction;
pub use types::*;

/// Result type for hex decoding
pub type HexResult<T> = Result<T, HexError>;

/// Errors that can occur while decoding hex quantities
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HexError {
    #[error("Hex string without 0x prefix: {0}")]
    MissingPrefix(String),

    #[error("Empty hex string")]
    Empty,

    #[error("Hex number with leading zero digits: {0}")]
    LeadingZero(String),

    #[error("Hex number > 64 bits: {0}")]
    Overflow(String),

    #[error("Invalid hex string: {0}")]
    InvalidDigit(String),
}
