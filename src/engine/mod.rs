//! Reconciliation engines.
//!
//! # Data Flow
//! ```text
//! engine::deposit     one scan task per chain
//!     adapter (head, blocks, tx status) → store (deposit records, cursor)
//!
//! engine::withdrawal  one drain task for all chains
//!     store (pending batch, hot wallet) → adapter (balance, fee, submit)
//!     → custody (credential decrypt) → store (Sent record)
//!
//! engine::wallet      boundary operations for the API layer
//! ```
//!
//! The two loops never call each other; they share only the store and the
//! adapter set, both immutable after startup and safe for concurrent use.

pub mod deposit;
pub mod wallet;
pub mod withdrawal;

use std::collections::HashMap;
use std::sync::Arc;

use crate::adapter::ChainAdapter;
use crate::model::Chain;

pub use deposit::{ChainMonitorConfig, DepositMonitor};
pub use wallet::WalletService;
pub use withdrawal::WithdrawalProcessor;

/// Immutable per-chain adapter table, constructed once at startup and
/// shared by every component.
pub type AdapterSet = HashMap<Chain, Arc<dyn ChainAdapter>>;
