// blockchain-core/src/block.rs
use crate::{quantity, transaction::Transaction, types::*, HexResult};
use serde::{Deserialize, Serialize};

/// Block as returned by `eth_getBlockByNumber` / `eth_getBlockByHash`.
///
/// `T` is the transaction representation selected by the request's
/// include-transactions flag: hashes or full transaction objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Block<T> {
    #[serde(deserialize_with = "nullable")]
    pub difficulty: Quantity,
    #[serde(deserialize_with = "nullable")]
    pub extra_data: String,
    #[serde(deserialize_with = "nullable")]
    pub gas_limit: Quantity,
    #[serde(deserialize_with = "nullable")]
    pub gas_used: Quantity,
    /// Block hash
    #[serde(deserialize_with = "nullable")]
    pub hash: HashHex,
    #[serde(deserialize_with = "nullable")]
    pub logs_bloom: String,
    /// Block proposer
    #[serde(deserialize_with = "nullable")]
    pub miner: AddressHex,
    #[serde(deserialize_with = "nullable")]
    pub mix_hash: HashHex,
    #[serde(deserialize_with = "nullable")]
    pub nonce: String,
    /// Block height as a hex quantity
    #[serde(deserialize_with = "nullable")]
    pub number: Quantity,
    #[serde(deserialize_with = "nullable")]
    pub parent_hash: HashHex,
    #[serde(alias = "receiptRoot", deserialize_with = "nullable")]
    pub receipts_root: HashHex,
    #[serde(deserialize_with = "nullable")]
    pub sha3_uncles: HashHex,
    #[serde(deserialize_with = "nullable")]
    pub size: Quantity,
    #[serde(deserialize_with = "nullable")]
    pub state_root: HashHex,
    #[serde(deserialize_with = "nullable")]
    pub timestamp: Quantity,
    #[serde(deserialize_with = "nullable")]
    pub total_difficulty: Quantity,
    /// Transaction hashes or embedded transactions
    #[serde(deserialize_with = "nullable", bound(deserialize = "T: Deserialize<'de>"))]
    pub transactions: Vec<T>,
    #[serde(deserialize_with = "nullable")]
    pub transactions_root: HashHex,
    /// Uncle block hashes
    #[serde(deserialize_with = "nullable")]
    pub uncles: Vec<HashHex>,
}

/// Block carrying only transaction hashes
pub type BlockSummary = Block<HashHex>;

/// Block carrying its full transaction list
pub type BlockWithTransactions = Block<Transaction>;

impl<T> Block<T> {
    /// Decode the hex `number` field
    pub fn height(&self) -> HexResult<BlockNumber> {
        quantity::decode_block_number(&self.number)
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_genesis(&self) -> bool {
        matches!(self.height(), Ok(0))
    }
}

impl BlockWithTransactions {
    /// Drop embedded transactions down to their hashes
    pub fn to_summary(&self) -> BlockSummary {
        Block {
            difficulty: self.difficulty.clone(),
            extra_data: self.extra_data.clone(),
            gas_limit: self.gas_limit.clone(),
            gas_used: self.gas_used.clone(),
            hash: self.hash.clone(),
            logs_bloom: self.logs_bloom.clone(),
            miner: self.miner.clone(),
            mix_hash: self.mix_hash.clone(),
            nonce: self.nonce.clone(),
            number: self.number.clone(),
            parent_hash: self.parent_hash.clone(),
            receipts_root: self.receipts_root.clone(),
            sha3_uncles: self.sha3_uncles.clone(),
            size: self.size.clone(),
            state_root: self.state_root.clone(),
            timestamp: self.timestamp.clone(),
            total_difficulty: self.total_difficulty.clone(),
            transactions: self.transactions.iter().map(|tx| tx.hash.clone()).collect(),
            transactions_root: self.transactions_root.clone(),
            uncles: self.uncles.clone(),
        }
    }
}
