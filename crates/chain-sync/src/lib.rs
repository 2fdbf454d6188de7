// chain-sync/src/lib.rs

//! Chain Synchronization
//!
//! This crate drives ingestion of an observed chain into the document store:
//! - Full historical sync from block 1 to the observed head
//! - Incremental sync from the stored cursor
//! - Follow mode polling for new blocks until shutdown
//! - Optional bounded prefetch with strictly ordered persistence

pub mod engine;

pub use engine::{SyncConfig, SyncEngine, SyncMode, SyncReport, SyncStatus};

use blockchain_core::BlockNumber;
use rpc::RpcError;
use storage::StorageError;

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that abort a sync run
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// `block` is `None` when the failing call was the head probe
    #[error("RPC error{}: {source}", at_block(.block))]
    Rpc {
        block: Option<BlockNumber>,
        #[source]
        source: RpcError,
    },

    #[error("Storage error at block {block}: {source}")]
    Storage {
        block: BlockNumber,
        #[source]
        source: StorageError,
    },

    #[error("Sync cancelled after block {cursor}")]
    Cancelled { cursor: BlockNumber },
}

fn at_block(block: &Option<BlockNumber>) -> String {
    match block {
        Some(number) => format!(" at block {}", number),
        None => " while probing head".to_string(),
    }
}
