// storage/src/documents.rs

use crate::{Collection, DocumentStore, StorageError, StorageResult};
use blockchain_core::{BlockWithTransactions, Transaction};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Store-assigned document identity: 4-byte unix seconds followed by an
/// 8-byte store sequence, both big-endian
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId([u8; 12]);

impl DocumentId {
    pub fn new(timestamp: u32, sequence: u64) -> Self {
        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&timestamp.to_be_bytes());
        bytes[4..].copy_from_slice(&sequence.to_be_bytes());
        Self(bytes)
    }

    /// Identity for the next document at the current wall clock time
    pub fn generate(sequence: u64) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        Self::new(now, sequence)
    }

    pub fn from_slice(bytes: &[u8]) -> StorageResult<Self> {
        let array: [u8; 12] = bytes
            .try_into()
            .map_err(|_| StorageError::Corruption(format!("document id of {} bytes", bytes.len())))?;
        Ok(Self(array))
    }

    pub fn from_hex(s: &str) -> StorageResult<Self> {
        let bytes = hex::decode(s).map_err(|e| StorageError::InvalidDocument(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    pub fn sequence(&self) -> u64 {
        let mut seq = [0u8; 8];
        seq.copy_from_slice(&self.0[4..]);
        u64::from_be_bytes(seq)
    }

    /// Key the document is stored under: the sequence alone, so key order is
    /// insertion order even when the clock steps backwards
    pub fn storage_key(&self) -> [u8; 8] {
        self.sequence().to_be_bytes()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for DocumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        DocumentId::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Persisted block: identity plus every block field, transactions embedded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDocument {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(flatten)]
    pub block: BlockWithTransactions,
}

/// Persisted standalone transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDocument {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(flatten)]
    pub transaction: Transaction,
}

/// Maps chain entities to documents and inserts them, one insert per document
pub struct DocumentWriter<S: ?Sized> {
    store: Arc<S>,
}

impl<S: DocumentStore + ?Sized> DocumentWriter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Insert a block document into `blocks`
    pub fn save_block(&self, block: &BlockWithTransactions) -> StorageResult<BlockDocument> {
        let value = serde_json::to_value(block)?;
        let id = self.store.insert(Collection::Blocks, value)?;
        tracing::trace!("Saved block {} as {}", block.number, id);
        Ok(BlockDocument {
            id,
            block: block.clone(),
        })
    }

    /// Insert a transaction document into `transactions`
    pub fn save_transaction(&self, transaction: &Transaction) -> StorageResult<TransactionDocument> {
        let value = serde_json::to_value(transaction)?;
        let id = self.store.insert(Collection::Transactions, value)?;
        Ok(TransactionDocument {
            id,
            transaction: transaction.clone(),
        })
    }
}
