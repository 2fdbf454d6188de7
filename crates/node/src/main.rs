// node/src/main.rs
use chain_sync::SyncMode;
use clap::{Parser, Subcommand};
use node::runtime::shutdown_on_ctrl_c;
use node::{Observer, ObserverConfig};
use rpc::{BlockId, ChainClient};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "blockchain-observer")]
#[command(about = "Mirrors an Ethereum-compatible chain into a local document store", version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "./config.toml")]
    config: String,

    /// Override the node host (an `http://` prefix is optional)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Override the node port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Override the data directory
    #[arg(long, global = true)]
    data_dir: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file and create the data directory
    Init {
        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },

    /// Ingest blocks up to the current head
    Sync {
        /// Resume after the last stored block instead of starting at block 1
        #[arg(short, long)]
        incremental: bool,
    },

    /// Sync, then keep polling for new blocks until interrupted
    Follow,

    /// Print the current head height
    Head,

    /// Print a block by decimal number or 0x hash
    Block {
        id: BlockId,

        /// Include full transaction objects
        #[arg(short, long)]
        full: bool,
    },

    /// Print a transaction by hash
    Tx { hash: String },

    /// Print the newest blocks, newest first
    Latest {
        #[arg(default_value = "10")]
        count: u64,
    },

    /// Print the validator set at a block number or hash
    Validators { id: BlockId },

    /// Show database statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "node={lvl},blockchain_observer={lvl},chain_sync={lvl},rpc={lvl},storage={lvl},hyper=warn",
                    lvl = log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let Cli { command, config: config_path, host, port, data_dir, .. } = cli;
    let load = || load_config(&config_path, host.clone(), port, data_dir.clone());

    match command {
        Commands::Init { force } => {
            init_observer(&config_path, data_dir.clone(), force)?;
        }
        Commands::Sync { incremental } => {
            let mode = if incremental { SyncMode::Incremental } else { SyncMode::Full };
            run_sync(load()?, mode).await?;
        }
        Commands::Follow => {
            run_follow(load()?).await?;
        }
        Commands::Head => {
            let client = connect(&load()?)?;
            println!("{}", client.block_number().await?);
        }
        Commands::Block { id, full } => {
            let client = connect(&load()?)?;
            if full {
                print_json(&client.block_with_transactions_by_id(&id).await?)?;
            } else {
                print_json(&client.block(&id).await?)?;
            }
        }
        Commands::Tx { hash } => {
            let client = connect(&load()?)?;
            print_json(&client.transaction_by_hash(&hash).await?)?;
        }
        Commands::Latest { count } => {
            let client = connect(&load()?)?;
            print_json(&client.latest_blocks(count).await?)?;
        }
        Commands::Validators { id } => {
            let client = connect(&load()?)?;
            print_json(&client.validators_at(&id).await?)?;
        }
        Commands::Stats => {
            show_stats(load()?)?;
        }
    }

    Ok(())
}

fn load_config(
    path: &str,
    host: Option<String>,
    port: Option<u16>,
    data_dir: Option<String>,
) -> anyhow::Result<ObserverConfig> {
    let mut config = if std::path::Path::new(path).exists() {
        tracing::debug!("Loading configuration from {}", path);
        ObserverConfig::from_file(path)?
    } else {
        tracing::warn!("No config file at {}, using defaults", path);
        ObserverConfig::default()
    };

    if let Some(host) = host {
        config.rpc.host = host;
    }
    if let Some(port) = port {
        config.rpc.port = port;
    }
    if let Some(data_dir) = data_dir {
        config.storage.data_dir = data_dir;
    }

    Ok(config)
}

fn init_observer(config_path: &str, data_dir: Option<String>, force: bool) -> anyhow::Result<()> {
    if std::path::Path::new(config_path).exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", config_path);
    }

    let mut config = ObserverConfig::default();
    if let Some(data_dir) = data_dir {
        config.storage.data_dir = data_dir;
    }

    tracing::info!("Initializing observer at {}", config.storage.data_dir);
    std::fs::create_dir_all(&config.storage.data_dir)?;
    config.to_file(config_path)?;

    tracing::info!("Configuration written to {}", config_path);
    tracing::info!("Edit {} to point at your node", config_path);
    Ok(())
}

async fn run_sync(config: ObserverConfig, mode: SyncMode) -> anyhow::Result<()> {
    let observer = Observer::new(config)?;
    let shutdown = shutdown_on_ctrl_c();

    let result = observer.sync(mode, shutdown).await;
    observer.stop().await?;

    match result? {
        Some(report) if report.blocks == 0 => {
            tracing::info!("Already at head {}, nothing to sync", report.head)
        }
        Some(report) => tracing::info!(
            "Synced blocks {}..={} ({} blocks, {} transactions)",
            report.start + 1,
            report.end,
            report.blocks,
            report.transactions
        ),
        None => tracing::info!("Run `sync --incremental` to resume"),
    }
    Ok(())
}

async fn run_follow(config: ObserverConfig) -> anyhow::Result<()> {
    let observer = Observer::new(config)?;
    let shutdown = shutdown_on_ctrl_c();

    tracing::info!("Following chain head (Ctrl-C to stop)");
    let result = observer.follow(shutdown).await;
    observer.stop().await?;

    let report = result?;
    tracing::info!(
        "Stored {} blocks and {} transactions, last block {}",
        report.blocks,
        report.transactions,
        report.end
    );
    Ok(())
}

fn show_stats(config: ObserverConfig) -> anyhow::Result<()> {
    let observer = Observer::new(config)?;
    let stats = observer.stats()?;

    tracing::info!("Database statistics:");
    tracing::info!("  Path:         {}", observer.database().config().path);
    match stats.sync_cursor {
        Some(cursor) => tracing::info!("  Last block:   {}", cursor),
        None => tracing::info!("  Last block:   none"),
    }
    tracing::info!("  Blocks:       {}", stats.total_blocks);
    tracing::info!("  Transactions: {}", stats.total_transactions);
    tracing::info!("  Size:         {} bytes", stats.total_size_bytes);
    Ok(())
}

fn connect(config: &ObserverConfig) -> anyhow::Result<ChainClient> {
    Ok(ChainClient::new(config.rpc_config())?)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
