// chain-sync/src/engine.rs
use crate::{SyncError, SyncResult};
use blockchain_core::{BlockNumber, BlockWithTransactions};
use futures::StreamExt;
use rpc::ChainSource;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use storage::{DocumentStore, DocumentWriter};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStatus {
    Idle,
    Syncing { current: BlockNumber, target: BlockNumber },
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Start at block 1 regardless of what is stored
    Full,
    /// Start after the stored cursor
    Incremental,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Blocks fetched concurrently ahead of the writer; 1 means strictly sequential
    pub fetch_concurrency: usize,
    /// Delay between head probes in follow mode
    pub poll_interval: Duration,
    /// Log progress every this many blocks
    pub progress_log_interval: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            fetch_concurrency: 1,
            poll_interval: Duration::from_secs(5),
            progress_log_interval: 100,
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Cursor the run started from
    pub start: BlockNumber,
    /// Last block persisted (equals `start` if nothing was)
    pub end: BlockNumber,
    /// Head height seen by the final probe
    pub head: BlockNumber,
    pub blocks: u64,
    pub transactions: u64,
}

impl SyncReport {
    fn starting_at(cursor: BlockNumber) -> Self {
        Self {
            start: cursor,
            end: cursor,
            ..Default::default()
        }
    }

    fn absorb(&mut self, other: SyncReport) {
        self.end = other.end;
        self.head = other.head;
        self.blocks += other.blocks;
        self.transactions += other.transactions;
    }
}

/// Pulls blocks from a chain source and writes them as documents, in strictly
/// ascending block order
pub struct SyncEngine<C, S: ?Sized> {
    source: Arc<C>,
    writer: DocumentWriter<S>,
    config: SyncConfig,
    status: SyncStatus,
    shutdown: Option<watch::Receiver<bool>>,
}

impl<C, S> SyncEngine<C, S>
where
    C: ChainSource,
    S: DocumentStore + ?Sized,
{
    pub fn new(source: Arc<C>, store: Arc<S>, config: SyncConfig) -> Self {
        Self {
            source,
            writer: DocumentWriter::new(store),
            config,
            status: SyncStatus::Idle,
            shutdown: None,
        }
    }

    /// Stop at the next await point once `true` is sent on the channel
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn status(&self) -> SyncStatus {
        self.status
    }

    pub fn is_syncing(&self) -> bool {
        matches!(self.status, SyncStatus::Syncing { .. })
    }

    pub async fn sync(&mut self, mode: SyncMode) -> SyncResult<SyncReport> {
        match mode {
            SyncMode::Full => self.sync_full().await,
            SyncMode::Incremental => self.sync_incremental().await,
        }
    }

    /// Ingest every block from 1 to the head, re-probing the head as it goes.
    ///
    /// Documents already in the store are written again.
    pub async fn sync_full(&mut self) -> SyncResult<SyncReport> {
        tracing::info!("Starting full sync from block 1");
        self.run(0).await
    }

    /// Ingest only the blocks above the stored cursor
    pub async fn sync_incremental(&mut self) -> SyncResult<SyncReport> {
        let cursor = self.load_checkpoint()?;

        tracing::debug!("Starting incremental sync after block {}", cursor);
        self.run(cursor).await
    }

    /// Incremental sync, then wait for new blocks until shutdown.
    ///
    /// The returned report covers rounds that ran to completion; the stored
    /// cursor always reflects everything persisted.
    pub async fn follow(&mut self) -> SyncResult<SyncReport> {
        let mut total: Option<SyncReport> = None;

        loop {
            let report = match self.sync_incremental().await {
                Ok(report) => report,
                Err(SyncError::Cancelled { .. }) => break,
                Err(e) => return Err(e),
            };
            total.get_or_insert(SyncReport::starting_at(report.start)).absorb(report);

            let sleep = tokio::time::sleep(self.config.poll_interval);
            if cancellable(&mut self.shutdown, sleep).await.is_none() {
                break;
            }
        }

        tracing::info!("Follow mode stopped");
        Ok(total.unwrap_or_default())
    }

    async fn run(&mut self, start: BlockNumber) -> SyncResult<SyncReport> {
        let source = self.source.clone();
        let concurrency = self.config.fetch_concurrency.max(1);
        let mut report = SyncReport::starting_at(start);
        let mut cursor = start;
        let checkpoint = self.load_checkpoint()?;

        loop {
            let head = cancellable(&mut self.shutdown, source.block_number())
                .await
                .ok_or(SyncError::Cancelled { cursor })?
                .map_err(|source| SyncError::Rpc { block: None, source })?;
            report.head = head;

            tracing::debug!("{}/{}", cursor, head);
            if cursor >= head {
                break;
            }

            let window_end = head.min(cursor.saturating_add(concurrency as u64));
            self.status = SyncStatus::Syncing { current: cursor, target: head };

            // the stream yields in request order, so writes stay ascending
            let mut fetches = source.blocks_with_transactions(cursor + 1..=window_end, concurrency);

            while let Some(next) = cancellable(&mut self.shutdown, fetches.next()).await {
                let Some((number, result)) = next else {
                    break;
                };
                let block = result.map_err(|source| SyncError::Rpc { block: Some(number), source })?;

                let transactions = self.persist(number, &block, checkpoint)?;
                cursor = number;
                report.end = number;
                report.blocks += 1;
                report.transactions += transactions;
                self.status = SyncStatus::Syncing { current: cursor, target: head };

                if number % self.config.progress_log_interval.max(1) == 0 || number == head {
                    tracing::info!("Synced {}/{}", number, head);
                }
            }

            if cursor < window_end {
                return Err(SyncError::Cancelled { cursor });
            }
        }

        self.status = SyncStatus::Complete;
        if report.blocks > 0 {
            tracing::info!(
                "Sync complete at {}/{}: {} blocks, {} transactions",
                cursor,
                report.head,
                report.blocks,
                report.transactions
            );
        }
        Ok(report)
    }

    fn load_checkpoint(&self) -> SyncResult<BlockNumber> {
        let stored = self
            .writer
            .store()
            .load_cursor()
            .map_err(|source| SyncError::Storage { block: 0, source })?;
        Ok(stored.unwrap_or(0))
    }

    /// Write the block, then each of its transactions in server order, then
    /// advance the checkpoint. The checkpoint never moves below `checkpoint`,
    /// the value stored when the run began.
    fn persist(
        &self,
        number: BlockNumber,
        block: &BlockWithTransactions,
        checkpoint: BlockNumber,
    ) -> SyncResult<u64> {
        let storage_error = |source| SyncError::Storage { block: number, source };

        if !matches!(block.height(), Ok(h) if h == number) {
            tracing::warn!("Node returned block {:?} for height {}", block.number, number);
        }

        self.writer.save_block(block).map_err(storage_error)?;
        for tx in &block.transactions {
            self.writer.save_transaction(tx).map_err(storage_error)?;
        }
        if number > checkpoint {
            self.writer.store().store_cursor(number).map_err(storage_error)?;
        }

        Ok(block.transactions.len() as u64)
    }
}

/// Race `fut` against the shutdown signal; `None` means shutdown won
async fn cancellable<F: Future>(
    shutdown: &mut Option<watch::Receiver<bool>>,
    fut: F,
) -> Option<F::Output> {
    match shutdown {
        Some(rx) => {
            tokio::select! {
                biased;
                _ = shutdown_requested(rx) => None,
                output = fut => Some(output),
            }
        }
        None => Some(fut.await),
    }
}

async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            // sender gone: nobody can ask for shutdown any more
            std::future::pending::<()>().await;
        }
    }
}
