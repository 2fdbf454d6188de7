// storage/src/lib.rs

//! Document Storage Layer
//!
//! This crate persists observed chain data as JSON documents:
//! - Block documents with their embedded transactions
//! - Standalone transaction documents
//! - Store-assigned document identities
//! - The sync cursor checkpoint

pub mod db;
pub mod documents;
pub mod memory;

pub use db::{Database, DatabaseConfig, DatabaseStats, ColumnFamily};
pub use documents::{BlockDocument, DocumentId, DocumentWriter, TransactionDocument};
pub use memory::MemoryStore;

use blockchain_core::BlockNumber;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::SerializationError(e.to_string())
    }
}

/// Named document collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Blocks,
    Transactions,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Blocks => "blocks",
            Collection::Transactions => "transactions",
        }
    }

    pub fn all() -> [Collection; 2] {
        [Collection::Blocks, Collection::Transactions]
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Insert-only document store.
///
/// The store assigns each document its identity and writes it into the
/// document as `_id`. Nothing enforces uniqueness of chain hashes or numbers.
pub trait DocumentStore: Send + Sync {
    /// Insert a JSON object into `collection`
    fn insert(&self, collection: Collection, document: serde_json::Value) -> StorageResult<DocumentId>;

    /// Number of documents currently held by `collection`
    fn count_documents(&self, collection: Collection) -> StorageResult<u64>;

    /// Height of the last fully persisted block, if any
    fn load_cursor(&self) -> StorageResult<Option<BlockNumber>>;

    /// Record `number` as the last fully persisted block
    fn store_cursor(&self, number: BlockNumber) -> StorageResult<()>;
}

/// Attach `_id` to a document, rejecting anything that is not a JSON object
pub(crate) fn stamp_id(document: &mut serde_json::Value, id: DocumentId) -> StorageResult<()> {
    match document.as_object_mut() {
        Some(object) => {
            object.insert("_id".to_string(), serde_json::Value::String(id.to_hex()));
            Ok(())
        }
        None => Err(StorageError::InvalidDocument(format!(
            "expected a JSON object, got {}",
            document
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_names() {
        assert_eq!(Collection::Blocks.name(), "blocks");
        assert_eq!(Collection::Transactions.to_string(), "transactions");
    }

    #[test]
    fn test_stamp_id_requires_object() {
        let id = DocumentId::new(1, 1);
        let mut doc = serde_json::json!({ "hash": "0x1" });
        stamp_id(&mut doc, id).unwrap();
        assert_eq!(doc["_id"], id.to_hex());

        let mut not_object = serde_json::json!(["0x1"]);
        assert!(matches!(stamp_id(&mut not_object, id), Err(StorageError::InvalidDocument(_))));
    }
}
