// storage/src/memory.rs

use crate::{stamp_id, Collection, DocumentId, DocumentStore, StorageError, StorageResult};
use blockchain_core::BlockNumber;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-process document store keeping insertion order per collection
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    collections: HashMap<Collection, Vec<serde_json::Value>>,
    sequence: u64,
    cursor: Option<BlockNumber>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every document in `collection`, oldest first
    pub fn documents(&self, collection: Collection) -> StorageResult<Vec<serde_json::Value>> {
        let inner = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(inner.collections.get(&collection).cloned().unwrap_or_default())
    }

    fn poisoned() -> StorageError {
        StorageError::DatabaseError("memory store lock poisoned".into())
    }
}

impl DocumentStore for MemoryStore {
    fn insert(&self, collection: Collection, mut document: serde_json::Value) -> StorageResult<DocumentId> {
        let mut inner = self.inner.write().map_err(|_| Self::poisoned())?;
        let id = DocumentId::generate(inner.sequence + 1);
        stamp_id(&mut document, id)?;

        inner.sequence += 1;
        inner.collections.entry(collection).or_default().push(document);
        Ok(id)
    }

    fn count_documents(&self, collection: Collection) -> StorageResult<u64> {
        let inner = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(inner.collections.get(&collection).map_or(0, |docs| docs.len() as u64))
    }

    fn load_cursor(&self) -> StorageResult<Option<BlockNumber>> {
        Ok(self.inner.read().map_err(|_| Self::poisoned())?.cursor)
    }

    fn store_cursor(&self, number: BlockNumber) -> StorageResult<()> {
        self.inner.write().map_err(|_| Self::poisoned())?.cursor = Some(number);
        Ok(())
    }
}
