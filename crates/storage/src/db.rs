// storage/src/db.rs

use crate::{stamp_id, Collection, DocumentId, DocumentStore, StorageError, StorageResult};
use blockchain_core::BlockNumber;
use rocksdb::{IteratorMode, Options, WriteBatch, DB};
use std::sync::{Arc, Mutex};

const SEQUENCE_KEY: &str = "id_sequence";
const CURSOR_KEY: &str = "sync_cursor";
const SST_FILES_SIZE: &str = "rocksdb.total-sst-files-size";
const MEM_TABLES_SIZE: &str = "rocksdb.size-all-mem-tables";

/// Column families backing the collections
#[derive(Debug, Clone, Copy)]
pub enum ColumnFamily {
    Blocks,
    Transactions,
    Meta,
}

impl ColumnFamily {
    fn as_str(&self) -> &'static str {
        match self {
            ColumnFamily::Blocks => "blocks",
            ColumnFamily::Transactions => "transactions",
            ColumnFamily::Meta => "meta",
        }
    }

    fn all() -> Vec<Self> {
        vec![Self::Blocks, Self::Transactions, Self::Meta]
    }
}

impl From<Collection> for ColumnFamily {
    fn from(collection: Collection) -> Self {
        match collection {
            Collection::Blocks => ColumnFamily::Blocks,
            Collection::Transactions => ColumnFamily::Transactions,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: String,
    pub create_if_missing: bool,
    pub max_open_files: i32,
    pub write_buffer_size: usize,
    pub max_write_buffer_number: i32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "./data/observer".to_string(),
            create_if_missing: true,
            max_open_files: 1024,
            write_buffer_size: 64 * 1024 * 1024, // 64 MB
            max_write_buffer_number: 3,
        }
    }
}

/// RocksDB-backed document store.
///
/// Documents are stored as JSON keyed by their id's sequence, so iteration
/// order follows insertion order.
pub struct Database {
    db: Arc<DB>,
    config: DatabaseConfig,
    sequence: Mutex<u64>,
}

impl Database {
    /// Open or create database
    pub fn open(config: DatabaseConfig) -> StorageResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(config.create_if_missing);
        opts.create_missing_column_families(true);
        opts.set_max_open_files(config.max_open_files);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_max_write_buffer_number(config.max_write_buffer_number);
        opts.increase_parallelism(num_cpus::get() as i32);

        let cfs: Vec<_> = ColumnFamily::all().iter().map(|cf| cf.as_str()).collect();

        let db = DB::open_cf(&opts, &config.path, &cfs)
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        let database = Self {
            db: Arc::new(db),
            config,
            sequence: Mutex::new(0),
        };

        let sequence = database.read_u64_meta(SEQUENCE_KEY)?.unwrap_or(0);
        *database.lock_sequence()? = sequence;

        tracing::info!("Database opened at {} (sequence {})", database.config.path, sequence);
        Ok(database)
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    // ==================== DOCUMENT OPERATIONS ====================

    /// Every document in `collection`, oldest first
    pub fn documents(&self, collection: Collection) -> StorageResult<Vec<serde_json::Value>> {
        let cf = self.cf(collection.into())?;
        let mut documents = Vec::new();

        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item.map_err(|e| StorageError::DatabaseError(e.to_string()))?;
            documents.push(serde_json::from_slice(&value)?);
        }

        Ok(documents)
    }

    /// Fetch one document by id
    pub fn get_document(
        &self,
        collection: Collection,
        id: &DocumentId,
    ) -> StorageResult<Option<serde_json::Value>> {
        let cf = self.cf(collection.into())?;

        let bytes = match self.db.get_cf(cf, id.storage_key())
            .map_err(|e| StorageError::DatabaseError(e.to_string()))? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        // same sequence under a different timestamp is a different id
        let document: serde_json::Value = serde_json::from_slice(&bytes)?;
        if document["_id"] != id.to_hex().as_str() {
            return Ok(None);
        }
        Ok(Some(document))
    }

    // ==================== METADATA OPERATIONS ====================

    /// Store metadata
    pub fn store_meta(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        let cf = self.cf(ColumnFamily::Meta)?;
        self.db.put_cf(cf, key.as_bytes(), value)
            .map_err(|e| StorageError::DatabaseError(e.to_string()))
    }

    /// Get metadata
    pub fn get_meta(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let cf = self.cf(ColumnFamily::Meta)?;
        self.db.get_cf(cf, key.as_bytes())
            .map_err(|e| StorageError::DatabaseError(e.to_string()))
    }

    fn read_u64_meta(&self, key: &str) -> StorageResult<Option<u64>> {
        match self.get_meta(key)? {
            Some(bytes) => {
                let number = u64::from_be_bytes(bytes.try_into()
                    .map_err(|_| StorageError::Corruption(format!("Invalid {}", key)))?);
                Ok(Some(number))
            }
            None => Ok(None),
        }
    }

    // ==================== UTILITY OPERATIONS ====================

    /// Flush memtables of every column family to disk
    pub fn flush(&self) -> StorageResult<()> {
        for cf_type in ColumnFamily::all() {
            let cf = self.cf(cf_type)?;
            self.db.flush_cf(cf)
                .map_err(|e| StorageError::DatabaseError(e.to_string()))?;
        }
        Ok(())
    }

    /// Get database statistics
    pub fn stats(&self) -> StorageResult<DatabaseStats> {
        Ok(DatabaseStats {
            sync_cursor: self.load_cursor()?,
            total_blocks: self.count_documents(Collection::Blocks)?,
            total_transactions: self.count_documents(Collection::Transactions)?,
            total_size_bytes: self.total_size()?,
        })
    }

    /// Bytes held in SST files plus memtables, over every column family
    fn total_size(&self) -> StorageResult<u64> {
        let mut total = 0u64;
        for cf_type in ColumnFamily::all() {
            let cf = self.cf(cf_type)?;
            for property in [SST_FILES_SIZE, MEM_TABLES_SIZE] {
                total += self
                    .db
                    .property_int_value_cf(cf, property)
                    .map_err(|e| StorageError::DatabaseError(e.to_string()))?
                    .unwrap_or(0);
            }
        }
        Ok(total)
    }

    fn lock_sequence(&self) -> StorageResult<std::sync::MutexGuard<'_, u64>> {
        self.sequence
            .lock()
            .map_err(|_| StorageError::DatabaseError("id sequence lock poisoned".into()))
    }

    /// Get column family handle
    fn cf(&self, cf_type: ColumnFamily) -> StorageResult<&rocksdb::ColumnFamily> {
        self.db.cf_handle(cf_type.as_str())
            .ok_or_else(|| StorageError::DatabaseError(format!("{} CF not found", cf_type.as_str())))
    }
}

impl DocumentStore for Database {
    fn insert(&self, collection: Collection, mut document: serde_json::Value) -> StorageResult<DocumentId> {
        let mut sequence = self.lock_sequence()?;
        let next = *sequence + 1;
        let id = DocumentId::generate(next);
        stamp_id(&mut document, id)?;

        let bytes = serde_json::to_vec(&document)?;
        let cf_docs = self.cf(collection.into())?;
        let cf_meta = self.cf(ColumnFamily::Meta)?;

        // document and sequence land together
        let mut batch = WriteBatch::default();
        batch.put_cf(cf_docs, id.storage_key(), &bytes);
        batch.put_cf(cf_meta, SEQUENCE_KEY.as_bytes(), next.to_be_bytes());

        self.db.write(batch)
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        *sequence = next;
        tracing::trace!("Inserted {} into {}", id, collection);
        Ok(id)
    }

    fn count_documents(&self, collection: Collection) -> StorageResult<u64> {
        let cf = self.cf(collection.into())?;
        let mut count = 0u64;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            item.map_err(|e| StorageError::DatabaseError(e.to_string()))?;
            count += 1;
        }
        Ok(count)
    }

    fn load_cursor(&self) -> StorageResult<Option<BlockNumber>> {
        self.read_u64_meta(CURSOR_KEY)
    }

    fn store_cursor(&self, number: BlockNumber) -> StorageResult<()> {
        self.store_meta(CURSOR_KEY, &number.to_be_bytes())
    }
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub sync_cursor: Option<BlockNumber>,
    pub total_blocks: u64,
    pub total_transactions: u64,
    pub total_size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_db() -> (Database, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = DatabaseConfig {
            path: temp_dir.path().to_str().unwrap().to_string(),
            ..Default::default()
        };
        let db = Database::open(config).unwrap();
        (db, temp_dir)
    }

    #[test]
    fn test_insert_and_fetch_document() {
        let (db, _temp) = create_test_db();

        let id = db.insert(Collection::Blocks, json!({ "number": "0x1", "hash": "0xb1" })).unwrap();
        let doc = db.get_document(Collection::Blocks, &id).unwrap().unwrap();

        assert_eq!(doc["_id"], id.to_hex());
        assert_eq!(doc["hash"], "0xb1");
        assert!(db.get_document(Collection::Transactions, &id).unwrap().is_none());
    }

    #[test]
    fn test_documents_in_insertion_order() {
        let (db, _temp) = create_test_db();

        for n in 1..=5u64 {
            db.insert(Collection::Blocks, json!({ "number": format!("0x{:x}", n) })).unwrap();
        }

        let numbers: Vec<String> = db
            .documents(Collection::Blocks)
            .unwrap()
            .iter()
            .map(|d| d["number"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(numbers, vec!["0x1", "0x2", "0x3", "0x4", "0x5"]);
        assert_eq!(db.count_documents(Collection::Blocks).unwrap(), 5);
        assert_eq!(db.count_documents(Collection::Transactions).unwrap(), 0);
    }

    #[test]
    fn test_sequence_and_cursor_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let config = DatabaseConfig {
            path: temp_dir.path().to_str().unwrap().to_string(),
            ..Default::default()
        };

        let last = {
            let db = Database::open(config.clone()).unwrap();
            db.insert(Collection::Transactions, json!({ "hash": "0xa" })).unwrap();
            let last = db.insert(Collection::Transactions, json!({ "hash": "0xb" })).unwrap();
            db.store_cursor(42).unwrap();
            db.flush().unwrap();
            last
        };

        let db = Database::open(config).unwrap();
        assert_eq!(db.load_cursor().unwrap(), Some(42));

        let next = db.insert(Collection::Transactions, json!({ "hash": "0xc" })).unwrap();
        assert_eq!(next.sequence(), last.sequence() + 1);
        assert_eq!(db.count_documents(Collection::Transactions).unwrap(), 3);
    }

    #[test]
    fn test_rejects_non_object_documents() {
        let (db, _temp) = create_test_db();
        assert!(matches!(
            db.insert(Collection::Blocks, json!(null)),
            Err(StorageError::InvalidDocument(_))
        ));
        assert_eq!(db.count_documents(Collection::Blocks).unwrap(), 0);
    }

    #[test]
    fn test_lookup_requires_full_id() {
        let (db, _temp) = create_test_db();
        let id = db.insert(Collection::Blocks, json!({ "hash": "0xb1" })).unwrap();

        let other_time = DocumentId::new(id.timestamp().wrapping_add(1), id.sequence());
        assert!(db.get_document(Collection::Blocks, &other_time).unwrap().is_none());
        assert!(db.get_document(Collection::Blocks, &id).unwrap().is_some());
    }

    #[test]
    fn test_size_grows_with_data() {
        let (db, _temp) = create_test_db();
        let empty = db.stats().unwrap().total_size_bytes;

        for n in 0..500u64 {
            db.insert(
                Collection::Transactions,
                json!({ "hash": format!("0x{:064x}", n), "input": "0x".to_string() + &"ab".repeat(256) }),
            )
            .unwrap();
        }
        db.flush().unwrap();

        let filled = db.stats().unwrap().total_size_bytes;
        assert!(filled > empty);
    }

    #[test]
    fn test_stats() {
        let (db, _temp) = create_test_db();
        db.insert(Collection::Blocks, json!({})).unwrap();
        db.insert(Collection::Transactions, json!({})).unwrap();
        db.insert(Collection::Transactions, json!({})).unwrap();
        db.store_cursor(1).unwrap();

        let stats = db.stats().unwrap();
        assert_eq!(stats.total_blocks, 1);
        assert_eq!(stats.total_transactions, 2);
        assert_eq!(stats.sync_cursor, Some(1));
    }
}
