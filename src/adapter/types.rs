//! Adapter-facing types and error definitions.

use alloy::primitives::U256;
use thiserror::Error;

/// Errors that can occur during adapter operations.
///
/// Every variant is transient from the engines' point of view: the failing
/// tick or item is logged and skipped, and the next timer fire retries.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// The node answered with something we could not interpret.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Requested block does not exist (yet) on the node.
    #[error("block {0} not found")]
    BlockNotFound(u64),

    /// Invalid credential or signing failure.
    #[error("wallet error: {0}")]
    Wallet(String),
}

/// Result type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// A freshly generated address with its signing credential.
///
/// The credential leaves the adapter exactly once, here; callers are
/// expected to hand it to key custody immediately.
#[derive(Debug, Clone)]
pub struct GeneratedAddress {
    pub address: String,
    pub credential: String,
}

/// On-chain inclusion state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    /// Not yet included in a block.
    Pending,
    /// Included in a block.
    Confirmed,
}

/// Status of a submitted or observed transaction.
#[derive(Debug, Clone)]
pub struct TxStatus {
    pub state: TxState,
    /// Inclusion block, 0 while pending.
    pub block_number: u64,
    /// Blocks mined on top of the inclusion block.
    pub confirmations: u32,
    /// Whether execution succeeded. False while pending.
    pub success: bool,
}

impl TxStatus {
    /// Status of a transaction still waiting for inclusion.
    pub fn pending() -> Self {
        Self {
            state: TxState::Pending,
            block_number: 0,
            confirmations: 0,
            success: false,
        }
    }
}

/// A value transfer observed in a block. Contract creations and other
/// non-transfer entries are filtered out before this type is built.
#[derive(Debug, Clone)]
pub struct Transfer {
    pub hash: String,
    pub from: String,
    pub to: String,
    /// Amount in the chain's smallest unit.
    pub amount: U256,
    pub block_number: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_status_is_zeroed() {
        let status = TxStatus::pending();
        assert_eq!(status.state, TxState::Pending);
        assert_eq!(status.block_number, 0);
        assert_eq!(status.confirmations, 0);
        assert!(!status.success);
    }

    #[test]
    fn error_display() {
        let err = AdapterError::Timeout(10);
        assert_eq!(err.to_string(), "RPC timeout after 10 seconds");

        let err = AdapterError::BlockNotFound(42);
        assert!(err.to_string().contains("42"));
    }
}
