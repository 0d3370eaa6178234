//! Wallet service: boundary operations consumed by the API layer.

use std::sync::Arc;

use alloy::primitives::U256;

use crate::adapter::AdapterError;
use crate::custody::{CustodyError, KeyCustody};
use crate::engine::AdapterSet;
use crate::model::{Chain, Deposit, HotWallet};
use crate::store::{Store, StoreError};

/// Errors from wallet-facing boundary operations.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("chain {0} not supported")]
    UnsupportedChain(Chain),

    #[error("hot wallet not found for chain {0}")]
    MissingWallet(Chain),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Custody(#[from] CustodyError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Address issuance and balance queries.
pub struct WalletService {
    store: Arc<dyn Store>,
    adapters: Arc<AdapterSet>,
    custody: KeyCustody,
}

impl WalletService {
    pub fn new(store: Arc<dyn Store>, adapters: Arc<AdapterSet>, custody: KeyCustody) -> Self {
        Self {
            store,
            adapters,
            custody,
        }
    }

    /// Issue a fresh deposit address for an order.
    ///
    /// The adapter's credential is encrypted before it is stored; the
    /// plaintext never leaves this function.
    pub async fn issue_deposit_address(
        &self,
        chain: Chain,
        user_id: String,
        order_id: String,
    ) -> Result<String, WalletError> {
        let adapter = self
            .adapters
            .get(&chain)
            .ok_or_else(|| WalletError::UnsupportedChain(chain.clone()))?;

        let generated = adapter.generate_address().await?;
        let encrypted_key = self.custody.encrypt(&generated.credential)?;

        let deposit = Deposit::new(
            chain.clone(),
            generated.address.clone(),
            user_id,
            order_id.clone(),
            encrypted_key,
        );
        self.store.create_deposit(deposit).await?;

        tracing::info!(
            chain = %chain,
            order_id = %order_id,
            address = %generated.address,
            "Deposit address issued"
        );

        Ok(generated.address)
    }

    /// Live balance of the chain's hot wallet.
    ///
    /// Refreshes the advisory cache as a side effect; a cache-update
    /// failure is logged and swallowed since the live value was already
    /// obtained.
    pub async fn hot_wallet_balance(&self, chain: &Chain) -> Result<U256, WalletError> {
        let wallet = self
            .store
            .hot_wallet(chain)
            .await?
            .ok_or_else(|| WalletError::MissingWallet(chain.clone()))?;

        let adapter = self
            .adapters
            .get(chain)
            .ok_or_else(|| WalletError::UnsupportedChain(chain.clone()))?;

        let balance = adapter.balance(&wallet.address).await?;

        if let Err(e) = self
            .store
            .update_hot_wallet_balance(chain, &balance.to_string())
            .await
        {
            tracing::warn!(chain = %chain, error = %e, "Failed to refresh cached balance");
        }

        Ok(balance)
    }

    /// Provision a hot wallet for a chain that doesn't have one yet.
    ///
    /// Called once per configured chain at startup. Existing wallets are
    /// left untouched.
    pub async fn ensure_hot_wallet(&self, chain: &Chain) -> Result<HotWallet, WalletError> {
        if let Some(wallet) = self.store.hot_wallet(chain).await? {
            return Ok(wallet);
        }

        let adapter = self
            .adapters
            .get(chain)
            .ok_or_else(|| WalletError::UnsupportedChain(chain.clone()))?;

        let generated = adapter.generate_address().await?;
        let wallet = HotWallet {
            chain: chain.clone(),
            address: generated.address,
            encrypted_key: self.custody.encrypt(&generated.credential)?,
            balance: "0".to_string(),
        };
        self.store.upsert_hot_wallet(wallet.clone()).await?;

        tracing::warn!(
            chain = %chain,
            address = %wallet.address,
            "Provisioned new hot wallet; fund it before withdrawals can be sent"
        );

        Ok(wallet)
    }
}
