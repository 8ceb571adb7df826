//! Redrock - Redis-compatible server backed by an embedded ordered store
//!
//! Every data structure is encoded into one RocksDB key space, so capacity
//! scales with disk rather than RAM.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use storage::RocksStore;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use redrock::config::Config;
use redrock::dispatch::Dispatcher;
use redrock::server::RedisServer;

/// Redrock server configuration
#[derive(Parser, Debug)]
#[command(name = "redrock")]
#[command(about = "Redrock - Redis-compatible server backed by RocksDB")]
struct Args {
    /// Redis server listen address
    #[arg(short, long, default_value = "")]
    listen_addr: String,

    /// Data storage directory
    #[arg(short, long, default_value = "")]
    data_dir: PathBuf,

    /// Log level
    #[arg(long, default_value = "")]
    log_level: String,

    /// Configuration file path (YAML format)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration from file if specified, otherwise use defaults
    let mut config = if let Some(config_path) = &args.config {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };

    // Override config with command line arguments
    if !args.listen_addr.is_empty() {
        config.network.listen_addr = args.listen_addr.clone();
    }
    if !args.data_dir.as_os_str().is_empty() {
        config.storage.data_dir = args.data_dir.clone();
    }
    if !args.log_level.is_empty() {
        config.log.level = args.log_level.clone();
    }

    // Initialize logging
    let level = match config.log.level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting redrock");
    info!("Listen address: {}", config.network.listen_addr);
    info!("Data directory: {:?}", config.storage.data_dir);

    std::fs::create_dir_all(&config.storage.data_dir)?;

    let store = Arc::new(RocksStore::open(&config.storage.data_dir)?);
    let dispatcher = Arc::new(Dispatcher::new(store));

    let addr: SocketAddr = config.network.listen_addr.parse()?;
    let server = RedisServer::new(dispatcher, addr);

    info!(
        "Connect with: redis-cli -h {} -p {}",
        addr.ip(),
        addr.port()
    );

    server.start().await
}
