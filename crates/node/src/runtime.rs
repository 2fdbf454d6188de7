// node/src/runtime.rs
use crate::ObserverConfig;
use chain_sync::{SyncEngine, SyncError, SyncMode, SyncReport};
use rpc::ChainClient;
use std::sync::Arc;
use storage::{Database, DatabaseStats};
use tokio::sync::watch;

/// Chain client and document database wired together for ingestion
pub struct Observer {
    config: ObserverConfig,
    client: Arc<ChainClient>,
    database: Arc<Database>,
}

impl Observer {
    pub fn new(config: ObserverConfig) -> anyhow::Result<Self> {
        tracing::info!("Initializing observer components");

        let client = Arc::new(ChainClient::new(config.rpc_config())?);
        let database = Arc::new(Database::open(config.database_config())?);

        tracing::info!("Observing {}", client.transport().endpoint());
        Ok(Self {
            config,
            client,
            database,
        })
    }

    pub fn config(&self) -> &ObserverConfig {
        &self.config
    }

    pub fn client(&self) -> &Arc<ChainClient> {
        &self.client
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.database
    }

    /// Run one sync pass. An interrupted pass is not an error: everything up
    /// to the reported cursor is stored and `--incremental` resumes from it.
    pub async fn sync(
        &self,
        mode: SyncMode,
        shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<Option<SyncReport>> {
        self.client.verify_chain_id().await?;

        let mut engine = self.engine(shutdown);
        match engine.sync(mode).await {
            Ok(report) => Ok(Some(report)),
            Err(SyncError::Cancelled { cursor }) => {
                tracing::warn!("Sync interrupted after block {}", cursor);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Keep the store at the chain head until shutdown
    pub async fn follow(&self, shutdown: watch::Receiver<bool>) -> anyhow::Result<SyncReport> {
        self.client.verify_chain_id().await?;

        let report = self.engine(shutdown).follow().await?;
        Ok(report)
    }

    pub fn stats(&self) -> anyhow::Result<DatabaseStats> {
        Ok(self.database.stats()?)
    }

    pub async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!("Flushing database...");
        self.database.flush()?;

        tracing::info!("Observer shutdown complete");
        Ok(())
    }

    fn engine(&self, shutdown: watch::Receiver<bool>) -> SyncEngine<ChainClient, Database> {
        SyncEngine::new(
            self.client.clone(),
            self.database.clone(),
            self.config.sync_config(),
        )
        .with_shutdown(shutdown)
    }
}

/// Shutdown channel flipped to `true` on the first Ctrl-C
pub fn shutdown_on_ctrl_c() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received shutdown signal");
                let _ = tx.send(true);
            }
            Err(e) => {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                // keep tx alive so receivers never see a closed channel
                std::future::pending::<()>().await;
            }
        }
    });

    rx
}
