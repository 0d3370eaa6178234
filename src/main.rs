//! Service entrypoint: config → adapters → store → engines → API.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use custodian::adapter::{ChainAdapter, EvmAdapter};
use custodian::api::{self, AppState};
use custodian::config::loader::load_config;
use custodian::custody::KeyCustody;
use custodian::engine::{
    AdapterSet, ChainMonitorConfig, DepositMonitor, WalletService, WithdrawalProcessor,
};
use custodian::lifecycle::{self, Shutdown};
use custodian::model::Chain;
use custodian::observability;
use custodian::store::{MemoryStore, Store};

#[derive(Parser)]
#[command(name = "custodian", version, about = "Exchange deposit/withdrawal custody service")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "custodian.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    observability::logging::init(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "custodian starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let custody = KeyCustody::from_hex(&config.custody.resolved_master_key())?;
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());

    // Adapter and monitor tables are built once here and never mutated.
    let mut adapters: AdapterSet = HashMap::new();
    let mut monitor_configs: HashMap<Chain, ChainMonitorConfig> = HashMap::new();
    for (name, chain_config) in &config.chains {
        let chain = Chain(name.clone());
        match EvmAdapter::new(
            &chain_config.rpc_url,
            chain_config.chain_id,
            Duration::from_secs(chain_config.rpc_timeout_secs),
        ) {
            Ok(adapter) => {
                adapters.insert(chain.clone(), Arc::new(adapter) as Arc<dyn ChainAdapter>);
                monitor_configs.insert(chain, ChainMonitorConfig::from(chain_config));
            }
            Err(e) => {
                tracing::warn!(chain = %name, error = %e, "Failed to initialize adapter, skipping chain");
            }
        }
    }
    let adapters = Arc::new(adapters);

    let wallets = Arc::new(WalletService::new(
        store.clone(),
        adapters.clone(),
        custody.clone(),
    ));

    for chain in adapters.keys() {
        if let Err(e) = wallets.ensure_hot_wallet(chain).await {
            tracing::error!(chain = %chain, error = %e, "Hot wallet provisioning failed");
        }
    }

    let shutdown = Arc::new(Shutdown::new());

    let monitor = Arc::new(DepositMonitor::new(
        store.clone(),
        adapters.clone(),
        monitor_configs,
    ));
    monitor.spawn_all(&shutdown);

    let processor = Arc::new(WithdrawalProcessor::new(
        store.clone(),
        adapters.clone(),
        custody.clone(),
        Duration::from_secs(config.withdrawal.interval_secs),
        config.withdrawal.batch_size,
    ));
    processor.spawn(&shutdown);

    let state = AppState {
        wallets,
        withdrawals: processor,
        store: store.clone(),
    };
    let app = api::router(state);

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "API server listening");

    let signal_shutdown = Arc::clone(&shutdown);
    tokio::spawn(async move {
        lifecycle::listen_for_signals(&signal_shutdown).await;
    });

    let mut rx = shutdown.subscribe();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = rx.recv().await;
        })
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
