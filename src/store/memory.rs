//! In-memory implementation of the persistence contract.
//!
//! Concurrent maps keyed the same way a relational backend would index the
//! tables. Used by the test suite and as the default backing store until a
//! durable implementation is wired in; everything behind [`Store`] so the
//! swap touches no engine code.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::model::{Chain, Deposit, DepositStatus, HotWallet, Withdrawal, WithdrawalStatus};
use crate::store::{Store, StoreError, StoreResult};

/// DashMap-backed store.
#[derive(Default)]
pub struct MemoryStore {
    /// Keyed by (chain, lowercased address).
    deposits: DashMap<(Chain, String), Deposit>,
    withdrawals: DashMap<Uuid, Withdrawal>,
    wallets: DashMap<Chain, HotWallet>,
    cursors: DashMap<Chain, u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn deposit_key(chain: &Chain, address: &str) -> (Chain, String) {
        (chain.clone(), address.to_ascii_lowercase())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_deposit(&self, deposit: Deposit) -> StoreResult<()> {
        let key = Self::deposit_key(&deposit.chain, &deposit.address);
        if self.deposits.contains_key(&key) {
            return Err(StoreError::Duplicate(format!(
                "deposit {}/{}",
                deposit.chain, deposit.address
            )));
        }
        self.deposits.insert(key, deposit);
        Ok(())
    }

    async fn update_deposit(&self, deposit: &Deposit) -> StoreResult<()> {
        let key = Self::deposit_key(&deposit.chain, &deposit.address);
        if !self.deposits.contains_key(&key) {
            return Err(StoreError::NotFound(format!(
                "deposit {}/{}",
                deposit.chain, deposit.address
            )));
        }
        self.deposits.insert(key, deposit.clone());
        Ok(())
    }

    async fn deposit_by_address(
        &self,
        chain: &Chain,
        address: &str,
    ) -> StoreResult<Option<Deposit>> {
        let key = Self::deposit_key(chain, address);
        Ok(self.deposits.get(&key).map(|r| r.value().clone()))
    }

    async fn unconfirmed_deposits(&self, chain: &Chain) -> StoreResult<Vec<Deposit>> {
        let mut deposits: Vec<Deposit> = self
            .deposits
            .iter()
            .filter(|r| {
                let d = r.value();
                d.chain == *chain && d.status == DepositStatus::Pending && !d.tx_hash.is_empty()
            })
            .map(|r| r.value().clone())
            .collect();
        deposits.sort_by(|a, b| a.address.cmp(&b.address));
        Ok(deposits)
    }

    async fn create_withdrawal(&self, withdrawal: Withdrawal) -> StoreResult<()> {
        if self.withdrawals.contains_key(&withdrawal.id) {
            return Err(StoreError::Duplicate(format!("withdrawal {}", withdrawal.id)));
        }
        self.withdrawals.insert(withdrawal.id, withdrawal);
        Ok(())
    }

    async fn update_withdrawal(&self, withdrawal: &Withdrawal) -> StoreResult<()> {
        if !self.withdrawals.contains_key(&withdrawal.id) {
            return Err(StoreError::NotFound(format!("withdrawal {}", withdrawal.id)));
        }
        self.withdrawals.insert(withdrawal.id, withdrawal.clone());
        Ok(())
    }

    async fn withdrawal(&self, id: Uuid) -> StoreResult<Option<Withdrawal>> {
        Ok(self.withdrawals.get(&id).map(|r| r.value().clone()))
    }

    async fn pending_withdrawals(
        &self,
        chain: &Chain,
        limit: usize,
    ) -> StoreResult<Vec<Withdrawal>> {
        let mut pending: Vec<Withdrawal> = self
            .withdrawals
            .iter()
            .filter(|r| {
                r.value().chain == *chain && r.value().status == WithdrawalStatus::Pending
            })
            .map(|r| r.value().clone())
            .collect();

        // Oldest first, so retried items keep their place in the queue.
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        pending.truncate(limit);
        Ok(pending)
    }

    async fn hot_wallet(&self, chain: &Chain) -> StoreResult<Option<HotWallet>> {
        Ok(self.wallets.get(chain).map(|r| r.value().clone()))
    }

    async fn upsert_hot_wallet(&self, wallet: HotWallet) -> StoreResult<()> {
        self.wallets.insert(wallet.chain.clone(), wallet);
        Ok(())
    }

    async fn update_hot_wallet_balance(&self, chain: &Chain, balance: &str) -> StoreResult<()> {
        match self.wallets.get_mut(chain) {
            Some(mut entry) => {
                entry.value_mut().balance = balance.to_string();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("hot wallet for {}", chain))),
        }
    }

    async fn scan_cursor(&self, chain: &Chain) -> StoreResult<Option<u64>> {
        Ok(self.cursors.get(chain).map(|r| *r.value()))
    }

    async fn set_scan_cursor(&self, chain: &Chain, block_number: u64) -> StoreResult<()> {
        self.cursors.insert(chain.clone(), block_number);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deposit(chain: &str, address: &str) -> Deposit {
        Deposit::new(
            Chain::from(chain),
            address.to_string(),
            "user-1".into(),
            "order-1".into(),
            "encrypted".into(),
        )
    }

    fn withdrawal(chain: &str, order: &str) -> Withdrawal {
        Withdrawal::new(
            Chain::from(chain),
            order.to_string(),
            "0xhot".into(),
            "0xdest".into(),
            "1000".into(),
        )
    }

    #[tokio::test]
    async fn deposit_lookup_is_case_insensitive() {
        let store = MemoryStore::new();
        store
            .create_deposit(deposit("ethereum", "0xAbCd"))
            .await
            .unwrap();

        let chain = Chain::from("ethereum");
        let found = store.deposit_by_address(&chain, "0xabcd").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn duplicate_deposit_address_rejected() {
        let store = MemoryStore::new();
        store
            .create_deposit(deposit("ethereum", "0xabc"))
            .await
            .unwrap();

        let err = store
            .create_deposit(deposit("ethereum", "0xABC"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));

        // Same address on a different chain is a different key.
        store
            .create_deposit(deposit("polygon", "0xabc"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn pending_withdrawals_are_bounded_and_oldest_first() {
        let store = MemoryStore::new();
        let chain = Chain::from("ethereum");

        for i in 0..5 {
            let mut w = withdrawal("ethereum", &format!("order-{i}"));
            w.created_at = chrono::Utc::now() - chrono::Duration::seconds(100 - i);
            store.create_withdrawal(w).await.unwrap();
        }

        let batch = store.pending_withdrawals(&chain, 3).await.unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0].order_id, "order-0");
        assert_eq!(batch[2].order_id, "order-2");
    }

    #[tokio::test]
    async fn sent_withdrawals_leave_the_pending_list() {
        let store = MemoryStore::new();
        let chain = Chain::from("ethereum");

        let mut w = withdrawal("ethereum", "order-1");
        store.create_withdrawal(w.clone()).await.unwrap();

        w.status = WithdrawalStatus::Sent;
        store.update_withdrawal(&w).await.unwrap();

        assert!(store
            .pending_withdrawals(&chain, 10)
            .await
            .unwrap()
            .is_empty());
        let by_id = store.withdrawal(w.id).await.unwrap().unwrap();
        assert_eq!(by_id.status, WithdrawalStatus::Sent);
    }

    #[tokio::test]
    async fn balance_update_requires_wallet() {
        let store = MemoryStore::new();
        let chain = Chain::from("ethereum");

        let err = store
            .update_hot_wallet_balance(&chain, "100")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        store
            .upsert_hot_wallet(HotWallet {
                chain: chain.clone(),
                address: "0xhot".into(),
                encrypted_key: "enc".into(),
                balance: "0".into(),
            })
            .await
            .unwrap();

        store.update_hot_wallet_balance(&chain, "100").await.unwrap();
        let wallet = store.hot_wallet(&chain).await.unwrap().unwrap();
        assert_eq!(wallet.balance, "100");
    }

    #[tokio::test]
    async fn cursor_roundtrip() {
        let store = MemoryStore::new();
        let chain = Chain::from("ethereum");

        assert_eq!(store.scan_cursor(&chain).await.unwrap(), None);
        store.set_scan_cursor(&chain, 105).await.unwrap();
        assert_eq!(store.scan_cursor(&chain).await.unwrap(), Some(105));
    }
}
