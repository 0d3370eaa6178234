//! Chain adapter contract.
//!
//! # Responsibilities
//! - Define the capability set every supported network implements
//! - Keep the engines chain-agnostic: they call these seven operations and
//!   never branch on network specifics
//!
//! # Design Decisions
//! - One concrete adapter per network family; the engines are written once
//!   against the trait and don't care how many chains are configured
//! - Operations are async and cancellable by drop; concrete adapters bound
//!   each call with their own timeout
//! - Failures surface as [`AdapterError`], never panics

pub mod evm;
pub mod types;

use alloy::primitives::U256;
use async_trait::async_trait;

pub use evm::EvmAdapter;
pub use types::{AdapterError, AdapterResult, GeneratedAddress, Transfer, TxState, TxStatus};

/// Gas consumed by a plain value transfer. Used both as the submitted gas
/// limit and as the multiplier when the withdrawal engine prices a fee.
pub const TRANSFER_GAS: u64 = 21_000;

/// Capability interface a chain integration must provide.
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    /// Generate a fresh address and its signing credential.
    async fn generate_address(&self) -> AdapterResult<GeneratedAddress>;

    /// Balance of an address in the chain's smallest unit.
    async fn balance(&self, address: &str) -> AdapterResult<U256>;

    /// Submit a signed transfer; returns the transaction hash.
    async fn send_transfer(
        &self,
        from: &str,
        to: &str,
        amount: U256,
        credential: &str,
    ) -> AdapterResult<String>;

    /// Inclusion state and confirmation count of a transaction.
    async fn transaction_status(&self, tx_hash: &str) -> AdapterResult<TxStatus>;

    /// Current chain head block number.
    async fn head_block(&self) -> AdapterResult<u64>;

    /// Value-transfer transactions included in the given block.
    async fn block_transfers(&self, block_number: u64) -> AdapterResult<Vec<Transfer>>;

    /// Current suggested fee rate (gas price) in the smallest unit.
    async fn fee_rate(&self) -> AdapterResult<U256>;
}
