//! EVM implementation of the chain adapter contract.
//!
//! # Responsibilities
//! - Connect to a JSON-RPC endpoint
//! - Query chain state (head, balances, blocks, receipts, gas price)
//! - Build, sign, and broadcast simple value transfers
//! - Bound every RPC call with a timeout and map failures to domain errors

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use alloy::consensus::Transaction as _;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use tokio::time::timeout;

use crate::adapter::types::{
    AdapterError, AdapterResult, GeneratedAddress, Transfer, TxState, TxStatus,
};
use crate::adapter::{ChainAdapter, TRANSFER_GAS};

/// Adapter for EVM-compatible chains over JSON-RPC.
#[derive(Clone)]
pub struct EvmAdapter {
    provider: Arc<dyn Provider + Send + Sync>,
    chain_id: u64,
    timeout_duration: Duration,
}

impl EvmAdapter {
    /// Create an adapter for one RPC endpoint.
    pub fn new(rpc_url: &str, chain_id: u64, rpc_timeout: Duration) -> AdapterResult<Self> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e| AdapterError::Rpc(format!("invalid RPC URL '{}': {}", rpc_url, e)))?;

        let provider =
            Arc::new(ProviderBuilder::new().connect_http(url)) as Arc<dyn Provider + Send + Sync>;

        tracing::info!(
            rpc_url = %rpc_url,
            chain_id = chain_id,
            "EVM adapter initialized"
        );

        Ok(Self {
            provider,
            chain_id,
            timeout_duration: rpc_timeout,
        })
    }

    /// Run an RPC call under the configured timeout, mapping failures.
    async fn bounded<T, F>(&self, fut: F) -> AdapterResult<T>
    where
        F: IntoFuture<Output = Result<T, alloy::transports::TransportError>>,
    {
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(AdapterError::Rpc(e.to_string())),
            Err(_) => Err(AdapterError::Timeout(self.timeout_duration.as_secs())),
        }
    }

    fn parse_address(&self, address: &str) -> AdapterResult<Address> {
        address
            .parse()
            .map_err(|e| AdapterError::Malformed(format!("bad address '{}': {}", address, e)))
    }
}

#[async_trait]
impl ChainAdapter for EvmAdapter {
    async fn generate_address(&self) -> AdapterResult<GeneratedAddress> {
        let signer = PrivateKeySigner::random();
        Ok(GeneratedAddress {
            address: signer.address().to_string(),
            credential: hex::encode(signer.to_bytes()),
        })
    }

    async fn balance(&self, address: &str) -> AdapterResult<U256> {
        let addr = self.parse_address(address)?;
        self.bounded(self.provider.get_balance(addr)).await
    }

    async fn send_transfer(
        &self,
        from: &str,
        to: &str,
        amount: U256,
        credential: &str,
    ) -> AdapterResult<String> {
        let signer: PrivateKeySigner = credential
            .trim_start_matches("0x")
            .parse()
            .map_err(|e| AdapterError::Wallet(format!("invalid credential: {}", e)))?;

        let from_addr = self.parse_address(from)?;
        let to_addr = self.parse_address(to)?;

        // The credential must control the claimed source address; anything
        // else means the wallet record and its key have diverged.
        if signer.address() != from_addr {
            return Err(AdapterError::Wallet(format!(
                "credential controls {}, not source address {}",
                signer.address(),
                from_addr
            )));
        }

        let nonce = self
            .bounded(self.provider.get_transaction_count(from_addr).pending())
            .await?;
        let gas_price = self.bounded(self.provider.get_gas_price()).await?;

        let request = TransactionRequest::default()
            .with_from(from_addr)
            .with_to(to_addr)
            .with_value(amount)
            .with_nonce(nonce)
            .with_gas_price(gas_price)
            .with_gas_limit(TRANSFER_GAS)
            .with_chain_id(self.chain_id);

        let wallet = EthereumWallet::from(signer);
        let envelope = request
            .build(&wallet)
            .await
            .map_err(|e| AdapterError::Wallet(format!("signing failed: {}", e)))?;

        let pending = match timeout(
            self.timeout_duration,
            self.provider.send_tx_envelope(envelope),
        )
        .await
        {
            Ok(Ok(pending)) => pending,
            Ok(Err(e)) => return Err(AdapterError::Rpc(e.to_string())),
            Err(_) => return Err(AdapterError::Timeout(self.timeout_duration.as_secs())),
        };

        Ok(pending.tx_hash().to_string())
    }

    async fn transaction_status(&self, tx_hash: &str) -> AdapterResult<TxStatus> {
        let hash: TxHash = tx_hash
            .parse()
            .map_err(|e| AdapterError::Malformed(format!("bad tx hash '{}': {}", tx_hash, e)))?;

        let receipt = self
            .bounded(self.provider.get_transaction_receipt(hash))
            .await?;

        let Some(receipt) = receipt else {
            // No receipt: still in the mempool (or unknown to this node).
            return Ok(TxStatus::pending());
        };

        let head = self.bounded(self.provider.get_block_number()).await?;
        let block_number = receipt.block_number.unwrap_or(head);

        Ok(TxStatus {
            state: TxState::Confirmed,
            block_number,
            confirmations: head.saturating_sub(block_number) as u32,
            success: receipt.status(),
        })
    }

    async fn head_block(&self) -> AdapterResult<u64> {
        self.bounded(self.provider.get_block_number()).await
    }

    async fn block_transfers(&self, block_number: u64) -> AdapterResult<Vec<Transfer>> {
        let block = self
            .bounded(self.provider.get_block_by_number(block_number.into()).full())
            .await?
            .ok_or(AdapterError::BlockNotFound(block_number))?;

        let mut transfers = Vec::new();
        for tx in block.transactions.into_transactions() {
            // Contract creations carry no destination and are not transfers.
            let Some(to) = tx.to() else {
                continue;
            };

            transfers.push(Transfer {
                hash: tx.inner.tx_hash().to_string(),
                from: tx.inner.signer().to_string(),
                to: to.to_string(),
                amount: tx.value(),
                block_number,
            });
        }

        Ok(transfers)
    }

    async fn fee_rate(&self) -> AdapterResult<U256> {
        let gas_price = self.bounded(self.provider.get_gas_price()).await?;
        Ok(U256::from(gas_price))
    }
}

impl std::fmt::Debug for EvmAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmAdapter")
            .field("chain_id", &self.chain_id)
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn generated_addresses_are_unique_and_parseable() {
        let adapter = EvmAdapter::new("http://localhost:8545", 31337, Duration::from_secs(5))
            .unwrap();

        let a = adapter.generate_address().await.unwrap();
        let b = adapter.generate_address().await.unwrap();

        assert_ne!(a.address, b.address);
        assert!(a.address.parse::<Address>().is_ok());
        // Credential round-trips into a signer controlling the address.
        let signer: PrivateKeySigner = a.credential.parse().unwrap();
        assert_eq!(signer.address().to_string(), a.address);
    }

    #[tokio::test]
    async fn send_rejects_mismatched_credential() {
        let adapter = EvmAdapter::new("http://localhost:8545", 31337, Duration::from_secs(5))
            .unwrap();

        let a = adapter.generate_address().await.unwrap();
        let b = adapter.generate_address().await.unwrap();

        // b's credential cannot spend from a's address.
        let err = adapter
            .send_transfer(&a.address, &b.address, U256::from(1u64), &b.credential)
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Wallet(_)));
    }

    #[test]
    fn invalid_rpc_url_rejected() {
        let result = EvmAdapter::new("not a url", 1, Duration::from_secs(5));
        assert!(result.is_err());
    }
}
