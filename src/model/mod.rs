//! Domain records shared by the engines, the store, and the API layer.
//!
//! # Design Decisions
//! - Monetary amounts are decimal strings of the chain's smallest unit at
//!   every boundary; engines parse them into `U256` when they need to do
//!   arithmetic.
//! - Status enums only move forward (Pending → Confirmed, Pending → Sent);
//!   the engines enforce this, the types just make the states explicit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a supported blockchain network (e.g. "ethereum").
///
/// Used as the key partitioning all per-chain state: adapters, monitor
/// configs, hot wallets, scan cursors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Chain(pub String);

impl Chain {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Chain {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a tracked inbound deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepositStatus {
    Pending,
    Confirmed,
}

/// A tracked inbound-funds record, one per issued deposit address.
///
/// Created when an address is issued; mutated only by the deposit
/// reconciliation engine as matching on-chain activity is observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deposit {
    pub chain: Chain,
    /// Deposit address, unique per chain, never reassigned.
    pub address: String,
    pub user_id: String,
    pub order_id: String,
    /// Amount the order expects, decimal string ("0" when unknown).
    pub expected_amount: String,
    /// Last observed received amount, decimal string.
    pub received_amount: String,
    /// Hash of the last transfer seen landing on this address. Doubles as
    /// the idempotence guard: a transaction already recorded here is never
    /// re-processed.
    pub tx_hash: String,
    /// Block the tracked transfer was included in.
    pub block_number: u64,
    pub confirmations: u32,
    pub status: DepositStatus,
    /// Set exactly once, on the first transition to Confirmed.
    pub confirmed_at: Option<DateTime<Utc>>,
    /// Signing credential for the deposit address, encrypted by key
    /// custody at issuance. Kept so landed funds stay sweepable.
    pub encrypted_key: String,
}

impl Deposit {
    /// Fresh pending record for a newly issued address.
    pub fn new(
        chain: Chain,
        address: String,
        user_id: String,
        order_id: String,
        encrypted_key: String,
    ) -> Self {
        Self {
            chain,
            address,
            user_id,
            order_id,
            expected_amount: "0".to_string(),
            received_amount: String::new(),
            tx_hash: String::new(),
            block_number: 0,
            confirmations: 0,
            status: DepositStatus::Pending,
            confirmed_at: None,
            encrypted_key,
        }
    }
}

/// Lifecycle state of an outbound withdrawal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Sent,
}

/// An outbound-transfer request.
///
/// Created Pending by the API layer; moved to Sent exactly once by the
/// withdrawal engine, atomically with fee, hash, and timestamp. There is no
/// failure state: an unsendable item stays Pending and is retried on every
/// drain tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: Uuid,
    pub chain: Chain,
    pub order_id: String,
    /// Hot wallet address funding the transfer.
    pub from_address: String,
    pub to_address: String,
    /// Requested amount, decimal string. Parsed and validated against the
    /// live balance only at send time.
    pub amount: String,
    /// Network fee, decimal string. "0" until sent.
    pub fee: String,
    /// Empty until sent.
    pub tx_hash: String,
    pub status: WithdrawalStatus,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl Withdrawal {
    pub fn new(
        chain: Chain,
        order_id: String,
        from_address: String,
        to_address: String,
        amount: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            chain,
            order_id,
            from_address,
            to_address,
            amount,
            fee: "0".to_string(),
            tx_hash: String::new(),
            status: WithdrawalStatus::Pending,
            created_at: Utc::now(),
            sent_at: None,
        }
    }
}

/// Custodial wallet funding withdrawals for one chain. Exactly one per
/// chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotWallet {
    pub chain: Chain,
    pub address: String,
    /// Signing credential, encrypted by key custody.
    pub encrypted_key: String,
    /// Advisory cache only. Send decisions always re-fetch the live
    /// balance through the adapter.
    pub balance: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_display_and_eq() {
        let chain = Chain::from("ethereum");
        assert_eq!(chain.to_string(), "ethereum");
        assert_eq!(chain, Chain("ethereum".to_string()));
    }

    #[test]
    fn new_deposit_is_pending() {
        let d = Deposit::new(
            Chain::from("ethereum"),
            "0xabc".into(),
            "user-1".into(),
            "order-1".into(),
            "deadbeef".into(),
        );
        assert_eq!(d.status, DepositStatus::Pending);
        assert!(d.confirmed_at.is_none());
        assert!(d.tx_hash.is_empty());
    }

    #[test]
    fn new_withdrawal_has_zero_fee_and_no_hash() {
        let w = Withdrawal::new(
            Chain::from("ethereum"),
            "order-2".into(),
            "0xfrom".into(),
            "0xto".into(),
            "1000".into(),
        );
        assert_eq!(w.status, WithdrawalStatus::Pending);
        assert_eq!(w.fee, "0");
        assert!(w.tx_hash.is_empty());
        assert!(w.sent_at.is_none());
    }

    #[test]
    fn status_serde_is_lowercase() {
        let json = serde_json::to_string(&DepositStatus::Confirmed).unwrap();
        assert_eq!(json, "\"confirmed\"");
        let json = serde_json::to_string(&WithdrawalStatus::Sent).unwrap();
        assert_eq!(json, "\"sent\"");
    }
}
