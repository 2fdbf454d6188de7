// blockchain-core/src/transaction.rs

use crate::types::*;
use serde::{Deserialize, Serialize};

/// Transaction as returned by `eth_getTransactionByHash` or embedded in a full block.
///
/// Every numeric field stays in its hex wire form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transaction {
    /// Hash of the containing block (null while pending)
    pub block_hash: Option<HashHex>,
    /// Number of the containing block (null while pending)
    pub block_number: Option<Quantity>,
    /// Sender address
    #[serde(deserialize_with = "nullable")]
    pub from: AddressHex,
    /// Gas limit
    #[serde(deserialize_with = "nullable")]
    pub gas: Quantity,
    #[serde(deserialize_with = "nullable")]
    pub gas_price: Quantity,
    /// Transaction hash
    #[serde(deserialize_with = "nullable")]
    pub hash: HashHex,
    /// Call data or contract init code
    #[serde(deserialize_with = "nullable")]
    pub input: String,
    #[serde(deserialize_with = "nullable")]
    pub nonce: Quantity,
    /// Recipient (absent for contract creation)
    pub to: Option<AddressHex>,
    /// Position inside the block (null while pending)
    pub transaction_index: Option<Quantity>,
    #[serde(deserialize_with = "nullable")]
    pub value: Quantity,
    #[serde(deserialize_with = "nullable")]
    pub v: Quantity,
    #[serde(deserialize_with = "nullable")]
    pub r: Quantity,
    #[serde(deserialize_with = "nullable")]
    pub s: Quantity,
}

impl Transaction {
    /// Whether this transaction deploys a contract
    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }
}
