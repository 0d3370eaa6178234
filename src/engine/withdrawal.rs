//! Withdrawal processing engine.
//!
//! # Responsibilities
//! - Periodically drain pending withdrawals for every configured chain
//! - Verify funds against the live hot-wallet balance at send time
//! - Price the fee from the current rate, decrypt the signing credential,
//!   dispatch the transfer, and record the outcome
//!
//! # Design Decisions
//! - Items within one chain are processed strictly sequentially; a single
//!   hot wallet cannot tolerate concurrent signing against one nonce
//! - One item's failure never aborts the batch; the item stays Pending and
//!   is retried on the next tick, with no retry cap or backoff
//! - Insufficient funds is a distinguished transient condition, not a
//!   failure state

use std::sync::Arc;

use alloy::primitives::U256;
use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time;

use crate::adapter::{AdapterError, ChainAdapter, TRANSFER_GAS};
use crate::custody::{CustodyError, KeyCustody};
use crate::engine::AdapterSet;
use crate::lifecycle::Shutdown;
use crate::model::{Chain, Withdrawal, WithdrawalStatus};
use crate::observability::metrics;
use crate::store::{Store, StoreError};

/// Errors from processing a single withdrawal item.
#[derive(Debug, thiserror::Error)]
pub enum WithdrawError {
    #[error("chain {0} not supported")]
    UnsupportedChain(Chain),

    #[error("hot wallet not found for chain {0}")]
    MissingWallet(Chain),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("amount plus fee overflows")]
    FeeOverflow,

    /// Transient by design: the item stays Pending until the wallet can
    /// afford it.
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientFunds { have: U256, need: U256 },

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Custody(#[from] CustodyError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Service draining pending withdrawals across all chains.
pub struct WithdrawalProcessor {
    store: Arc<dyn Store>,
    adapters: Arc<AdapterSet>,
    custody: KeyCustody,
    interval: std::time::Duration,
    batch_size: usize,
}

impl WithdrawalProcessor {
    pub fn new(
        store: Arc<dyn Store>,
        adapters: Arc<AdapterSet>,
        custody: KeyCustody,
        interval: std::time::Duration,
        batch_size: usize,
    ) -> Self {
        Self {
            store,
            adapters,
            custody,
            interval,
            batch_size,
        }
    }

    /// Spawn the drain task. One task drives all chains from a shared
    /// timer; chains are independent, items within a chain are not.
    pub fn spawn(self: &Arc<Self>, shutdown: &Shutdown) -> JoinHandle<()> {
        let processor = Arc::clone(self);
        let mut rx = shutdown.subscribe();

        tokio::spawn(async move {
            tracing::info!(
                interval_secs = processor.interval.as_secs(),
                batch_size = processor.batch_size,
                "Withdrawal processor starting"
            );

            let mut ticker = time::interval(processor.interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        processor.drain_all().await;
                    }
                    _ = rx.recv() => {
                        tracing::info!("Withdrawal processor received shutdown signal, exiting");
                        break;
                    }
                }
            }
        })
    }

    /// Drain every configured chain once.
    pub async fn drain_all(&self) {
        for chain in self.adapters.keys() {
            if let Err(e) = self.drain_chain(chain).await {
                tracing::error!(chain = %chain, error = %e, "Withdrawal drain failed");
            }
        }
    }

    /// Process up to one batch of pending withdrawals for a chain.
    pub async fn drain_chain(&self, chain: &Chain) -> Result<(), WithdrawError> {
        let adapter = self
            .adapters
            .get(chain)
            .ok_or_else(|| WithdrawError::UnsupportedChain(chain.clone()))?;

        let batch = self
            .store
            .pending_withdrawals(chain, self.batch_size)
            .await?;

        for withdrawal in batch {
            let id = withdrawal.id;
            let order_id = withdrawal.order_id.clone();

            match self.process_item(adapter.as_ref(), withdrawal).await {
                Ok(()) => {}
                Err(WithdrawError::InsufficientFunds { have, need }) => {
                    tracing::warn!(
                        chain = %chain,
                        withdrawal_id = %id,
                        order_id = %order_id,
                        have = %have,
                        need = %need,
                        "Insufficient hot wallet balance, leaving withdrawal pending"
                    );
                    metrics::record_withdrawal_deferred(chain, "insufficient_funds");
                }
                Err(e) => {
                    tracing::warn!(
                        chain = %chain,
                        withdrawal_id = %id,
                        order_id = %order_id,
                        error = %e,
                        "Withdrawal failed, will retry next tick"
                    );
                    metrics::record_withdrawal_deferred(chain, "error");
                }
            }
        }

        Ok(())
    }

    /// The send pipeline for one item: wallet → live balance → amount →
    /// fee → affordability → decrypt → submit → persist Sent.
    async fn process_item(
        &self,
        adapter: &dyn ChainAdapter,
        mut withdrawal: Withdrawal,
    ) -> Result<(), WithdrawError> {
        let wallet = self
            .store
            .hot_wallet(&withdrawal.chain)
            .await?
            .ok_or_else(|| WithdrawError::MissingWallet(withdrawal.chain.clone()))?;

        // The cached balance is advisory only; send decisions use the
        // live value.
        let balance = adapter.balance(&wallet.address).await?;

        let amount: U256 = withdrawal
            .amount
            .parse()
            .map_err(|_| WithdrawError::InvalidAmount(withdrawal.amount.clone()))?;

        let fee_rate = adapter.fee_rate().await?;
        let fee = fee_rate
            .checked_mul(U256::from(TRANSFER_GAS))
            .ok_or(WithdrawError::FeeOverflow)?;
        let needed = amount.checked_add(fee).ok_or(WithdrawError::FeeOverflow)?;

        if balance < needed {
            return Err(WithdrawError::InsufficientFunds {
                have: balance,
                need: needed,
            });
        }

        let credential = self.custody.decrypt(&wallet.encrypted_key)?;

        let tx_hash = adapter
            .send_transfer(&wallet.address, &withdrawal.to_address, amount, &credential)
            .await?;

        withdrawal.tx_hash = tx_hash.clone();
        withdrawal.fee = fee.to_string();
        withdrawal.status = WithdrawalStatus::Sent;
        withdrawal.sent_at = Some(Utc::now());

        if let Err(e) = self.store.update_withdrawal(&withdrawal).await {
            // The transfer is on-chain but the record still says Pending.
            // Re-running the item would double-send, so this must reach an
            // operator, not a retry loop.
            tracing::error!(
                chain = %withdrawal.chain,
                withdrawal_id = %withdrawal.id,
                tx_hash = %tx_hash,
                error = %e,
                "CRITICAL: transfer sent but record update failed; reconcile manually before the next drain"
            );
            metrics::record_withdrawal_update_failure(&withdrawal.chain);
            return Err(e.into());
        }

        tracing::info!(
            chain = %withdrawal.chain,
            order_id = %withdrawal.order_id,
            tx_hash = %tx_hash,
            fee = %withdrawal.fee,
            "Withdrawal sent"
        );
        metrics::record_withdrawal_sent(&withdrawal.chain);

        Ok(())
    }

    /// Record a new withdrawal request in Pending state.
    ///
    /// No balance or fee validation happens here; both are deferred to
    /// send time, when they can be checked against live values.
    pub async fn create(
        &self,
        chain: Chain,
        order_id: String,
        to_address: String,
        amount: String,
    ) -> Result<Withdrawal, WithdrawError> {
        if !self.adapters.contains_key(&chain) {
            return Err(WithdrawError::UnsupportedChain(chain));
        }

        let wallet = self
            .store
            .hot_wallet(&chain)
            .await?
            .ok_or_else(|| WithdrawError::MissingWallet(chain.clone()))?;

        let withdrawal = Withdrawal::new(chain, order_id, wallet.address, to_address, amount);
        self.store.create_withdrawal(withdrawal.clone()).await?;

        Ok(withdrawal)
    }
}
