//! Deposit reconciliation engine.
//!
//! # Responsibilities
//! - Run one independent scanning task per configured chain
//! - Advance a persisted, monotonic "last scanned block" cursor
//! - Detect transfers landing on issued deposit addresses
//! - Track confirmation depth and flip deposits to Confirmed exactly once
//!
//! # Design Decisions
//! - Blocks are processed strictly in ascending order, one at a time, so
//!   the cursor never moves backwards and never skips unscanned ranges
//! - The cursor advances to the head fetched at the start of the pass once
//!   every block in range has been attempted; a failing block is logged
//!   and skipped rather than halting the scan
//! - A transaction hash already recorded on the deposit is never processed
//!   again, so one transfer produces at most one confirmation event

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time;

use crate::adapter::{AdapterError, ChainAdapter};
use crate::config::ChainConfig;
use crate::engine::AdapterSet;
use crate::lifecycle::Shutdown;
use crate::model::{Chain, Deposit, DepositStatus};
use crate::observability::metrics;
use crate::store::{Store, StoreError};

/// Per-chain scan tunables, fixed at startup.
#[derive(Debug, Clone)]
pub struct ChainMonitorConfig {
    /// Confirmations required before a deposit is Confirmed.
    pub min_confirmations: u32,
    /// Scan interval.
    pub poll_interval: std::time::Duration,
}

impl Default for ChainMonitorConfig {
    fn default() -> Self {
        Self {
            min_confirmations: 1,
            poll_interval: std::time::Duration::from_secs(5),
        }
    }
}

impl From<&ChainConfig> for ChainMonitorConfig {
    fn from(config: &ChainConfig) -> Self {
        Self {
            min_confirmations: config.min_confirmations,
            poll_interval: std::time::Duration::from_secs(config.poll_interval_secs),
        }
    }
}

/// Errors inside one block-processing step. Always logged and skipped.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Service scanning configured chains for incoming deposits.
pub struct DepositMonitor {
    store: Arc<dyn Store>,
    adapters: Arc<AdapterSet>,
    configs: HashMap<Chain, ChainMonitorConfig>,
}

impl DepositMonitor {
    pub fn new(
        store: Arc<dyn Store>,
        adapters: Arc<AdapterSet>,
        configs: HashMap<Chain, ChainMonitorConfig>,
    ) -> Self {
        Self {
            store,
            adapters,
            configs,
        }
    }

    /// Spawn one scanning task per configured chain.
    pub fn spawn_all(self: &Arc<Self>, shutdown: &Shutdown) -> Vec<JoinHandle<()>> {
        self.adapters
            .keys()
            .cloned()
            .map(|chain| {
                let monitor = Arc::clone(self);
                let rx = shutdown.subscribe();
                tokio::spawn(async move { monitor.scan_chain(chain, rx).await })
            })
            .collect()
    }

    async fn scan_chain(&self, chain: Chain, mut shutdown: broadcast::Receiver<()>) {
        let config = self.configs.get(&chain).cloned().unwrap_or_default();

        tracing::info!(
            chain = %chain,
            min_confirmations = config.min_confirmations,
            poll_interval_secs = config.poll_interval.as_secs(),
            "Deposit scan starting"
        );

        let mut cursor = match self.store.scan_cursor(&chain).await {
            Ok(cursor) => cursor,
            Err(e) => {
                tracing::warn!(chain = %chain, error = %e, "Failed to load scan cursor, starting fresh");
                None
            }
        };

        let mut ticker = time::interval(config.poll_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    cursor = self.scan_tick(&chain, &config, cursor).await;
                }
                _ = shutdown.recv() => {
                    tracing::info!(chain = %chain, "Deposit scan received shutdown signal, exiting");
                    break;
                }
            }
        }
    }

    /// One full scan pass for a chain. Returns the cursor to carry into
    /// the next tick; on a failed head fetch the cursor is unchanged.
    pub async fn scan_tick(
        &self,
        chain: &Chain,
        config: &ChainMonitorConfig,
        cursor: Option<u64>,
    ) -> Option<u64> {
        let Some(adapter) = self.adapters.get(chain) else {
            return cursor;
        };

        let head = match adapter.head_block().await {
            Ok(head) => head,
            Err(e) => {
                tracing::warn!(chain = %chain, error = %e, "Failed to fetch chain head, skipping tick");
                return cursor;
            }
        };

        let Some(last_scanned) = cursor else {
            // First run on this chain: baseline at the current head rather
            // than replaying chain history.
            tracing::info!(chain = %chain, block = head, "Initialized scan cursor at chain head");
            self.persist_cursor(chain, head).await;
            return Some(head);
        };

        if head > last_scanned {
            metrics::record_scan_lag(chain, head - last_scanned);

            for block_number in (last_scanned + 1)..=head {
                if let Err(e) = self
                    .process_block(chain, adapter.as_ref(), block_number, config)
                    .await
                {
                    tracing::warn!(
                        chain = %chain,
                        block = block_number,
                        error = %e,
                        "Block scan failed, skipping block"
                    );
                }
            }

            self.persist_cursor(chain, head).await;
        }

        self.refresh_unconfirmed(chain, adapter.as_ref(), config).await;

        Some(head.max(last_scanned))
    }

    async fn persist_cursor(&self, chain: &Chain, block_number: u64) {
        if let Err(e) = self.store.set_scan_cursor(chain, block_number).await {
            tracing::error!(
                chain = %chain,
                block = block_number,
                error = %e,
                "Failed to persist scan cursor; a restart will rescan from the previous one"
            );
        }
    }

    /// Match a block's transfers against issued deposit addresses.
    async fn process_block(
        &self,
        chain: &Chain,
        adapter: &dyn ChainAdapter,
        block_number: u64,
        config: &ChainMonitorConfig,
    ) -> Result<(), ScanError> {
        let transfers = adapter.block_transfers(block_number).await?;

        for transfer in transfers {
            let Some(mut deposit) = self.store.deposit_by_address(chain, &transfer.to).await?
            else {
                // Not one of ours.
                continue;
            };

            if deposit.tx_hash == transfer.hash {
                // Already processed.
                continue;
            }

            let status = adapter.transaction_status(&transfer.hash).await?;

            deposit.tx_hash = transfer.hash.clone();
            deposit.received_amount = transfer.amount.to_string();
            deposit.block_number = status.block_number;
            deposit.confirmations = status.confirmations;
            self.maybe_confirm(&mut deposit, config);

            self.store.update_deposit(&deposit).await?;
        }

        Ok(())
    }

    /// Re-check confirmation depth of deposits that have a tracked
    /// transaction but have not reached the chain's minimum yet. New
    /// blocks won't contain the transfer again, so depth progress has to
    /// be polled from its recorded hash.
    async fn refresh_unconfirmed(
        &self,
        chain: &Chain,
        adapter: &dyn ChainAdapter,
        config: &ChainMonitorConfig,
    ) {
        let deposits = match self.store.unconfirmed_deposits(chain).await {
            Ok(deposits) => deposits,
            Err(e) => {
                tracing::warn!(chain = %chain, error = %e, "Failed to list unconfirmed deposits");
                return;
            }
        };

        for mut deposit in deposits {
            let status = match adapter.transaction_status(&deposit.tx_hash).await {
                Ok(status) => status,
                Err(e) => {
                    tracing::warn!(
                        chain = %chain,
                        tx_hash = %deposit.tx_hash,
                        error = %e,
                        "Failed to refresh confirmation depth"
                    );
                    continue;
                }
            };

            if status.confirmations == deposit.confirmations
                && status.block_number == deposit.block_number
            {
                continue;
            }

            deposit.block_number = status.block_number;
            deposit.confirmations = status.confirmations;
            self.maybe_confirm(&mut deposit, config);

            if let Err(e) = self.store.update_deposit(&deposit).await {
                tracing::warn!(
                    chain = %chain,
                    address = %deposit.address,
                    error = %e,
                    "Failed to update deposit"
                );
            }
        }
    }

    /// Flip to Confirmed when depth is reached. The transition happens at
    /// most once; the timestamp is never overwritten.
    fn maybe_confirm(&self, deposit: &mut Deposit, config: &ChainMonitorConfig) {
        if deposit.confirmations >= config.min_confirmations
            && deposit.status != DepositStatus::Confirmed
        {
            deposit.status = DepositStatus::Confirmed;
            deposit.confirmed_at = Some(Utc::now());

            tracing::info!(
                chain = %deposit.chain,
                order_id = %deposit.order_id,
                amount = %deposit.received_amount,
                tx_hash = %deposit.tx_hash,
                "Deposit confirmed"
            );
            metrics::record_deposit_confirmed(&deposit.chain);
        }
    }
}
