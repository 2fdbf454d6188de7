// node/src/config.rs
use anyhow::Context;
use chain_sync::SyncConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use storage::DatabaseConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    pub rpc: RpcSettings,
    pub storage: StorageSettings,
    pub sync: SyncSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcSettings {
    pub host: String,
    pub port: u16,
    /// Expected chain id; unchecked when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub data_dir: String,
    /// Database directory name under `data_dir`
    pub database: String,
    pub create_if_missing: bool,
    pub max_open_files: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub fetch_concurrency: usize,
    pub poll_interval_secs: u64,
    pub progress_log_interval: u64,
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8545,
            chain_id: None,
            request_timeout_secs: 30,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: "./data".into(),
            database: "observer".into(),
            create_if_missing: true,
            max_open_files: 1024,
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            fetch_concurrency: 1,
            poll_interval_secs: 5,
            progress_log_interval: 100,
        }
    }
}

impl ObserverConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        let config = toml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path))?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn rpc_config(&self) -> rpc::RpcConfig {
        rpc::RpcConfig {
            host: self.rpc.host.clone(),
            port: self.rpc.port,
            chain_id: self.rpc.chain_id,
            request_timeout: Duration::from_secs(self.rpc.request_timeout_secs),
        }
    }

    /// Database lives at `{data_dir}/{database}`
    pub fn database_config(&self) -> DatabaseConfig {
        let path = Path::new(&self.storage.data_dir).join(&self.storage.database);
        DatabaseConfig {
            path: path.to_string_lossy().into_owned(),
            create_if_missing: self.storage.create_if_missing,
            max_open_files: self.storage.max_open_files,
            ..Default::default()
        }
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            fetch_concurrency: self.sync.fetch_concurrency,
            poll_interval: Duration::from_secs(self.sync.poll_interval_secs),
            progress_log_interval: self.sync.progress_log_interval,
        }
    }
}
