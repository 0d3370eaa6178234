//! Persistence contract.
//!
//! # Responsibilities
//! - Define the narrow storage interface the engines consume
//! - Keep the core agnostic to the backing store: callers issue
//!   create/read/update operations and never assume how records persist
//!
//! # Design Decisions
//! - Implementations must be safe for concurrent use across chains and
//!   provide their own internal synchronization
//! - Scan cursors are part of durable state so a restart resumes where the
//!   previous process stopped, instead of rescanning chain history

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{Chain, Deposit, HotWallet, Withdrawal};

pub use memory::MemoryStore;

/// Errors from the backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("duplicate record: {0}")]
    Duplicate(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Narrow storage interface for deposits, withdrawals, hot wallets, and
/// scan cursors.
#[async_trait]
pub trait Store: Send + Sync {
    /// Persist a new deposit record. (chain, address) must be unique.
    async fn create_deposit(&self, deposit: Deposit) -> StoreResult<()>;

    /// Replace an existing deposit record.
    async fn update_deposit(&self, deposit: &Deposit) -> StoreResult<()>;

    /// Look up a deposit by its (chain, address) key.
    async fn deposit_by_address(&self, chain: &Chain, address: &str)
        -> StoreResult<Option<Deposit>>;

    /// Deposits on a chain that have a tracked transaction but are not yet
    /// Confirmed; the scan loop re-checks their confirmation depth.
    async fn unconfirmed_deposits(&self, chain: &Chain) -> StoreResult<Vec<Deposit>>;

    /// Persist a new withdrawal request.
    async fn create_withdrawal(&self, withdrawal: Withdrawal) -> StoreResult<()>;

    /// Replace an existing withdrawal record.
    async fn update_withdrawal(&self, withdrawal: &Withdrawal) -> StoreResult<()>;

    /// Look up a withdrawal by id.
    async fn withdrawal(&self, id: Uuid) -> StoreResult<Option<Withdrawal>>;

    /// Pending withdrawals for a chain, oldest first, bounded by `limit`.
    async fn pending_withdrawals(&self, chain: &Chain, limit: usize)
        -> StoreResult<Vec<Withdrawal>>;

    /// The chain's hot wallet, if provisioned.
    async fn hot_wallet(&self, chain: &Chain) -> StoreResult<Option<HotWallet>>;

    /// Create or replace the chain's hot wallet record.
    async fn upsert_hot_wallet(&self, wallet: HotWallet) -> StoreResult<()>;

    /// Refresh the advisory cached balance of the chain's hot wallet.
    async fn update_hot_wallet_balance(&self, chain: &Chain, balance: &str) -> StoreResult<()>;

    /// Last block fully scanned for the chain.
    async fn scan_cursor(&self, chain: &Chain) -> StoreResult<Option<u64>>;

    /// Advance the chain's scan cursor.
    async fn set_scan_cursor(&self, chain: &Chain, block_number: u64) -> StoreResult<()>;
}
