//! Shared utilities for integration testing: a scriptable chain adapter.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use alloy::primitives::U256;
use async_trait::async_trait;

use custodian::adapter::{
    AdapterError, AdapterResult, ChainAdapter, GeneratedAddress, Transfer, TxStatus,
};

/// A transfer the mock was asked to broadcast.
#[derive(Debug, Clone)]
pub struct SentTransfer {
    pub from: String,
    pub to: String,
    pub amount: U256,
    pub credential: String,
    pub tx_hash: String,
}

#[derive(Default)]
struct MockChainState {
    head: u64,
    head_error: bool,
    blocks: HashMap<u64, Vec<Transfer>>,
    failing_blocks: HashSet<u64>,
    tx_status: HashMap<String, TxStatus>,
    balances: HashMap<String, U256>,
    fee_rate: U256,
    sent: Vec<SentTransfer>,
}

/// Programmable in-memory chain, driven from test code.
#[derive(Default)]
pub struct MockAdapter {
    state: Mutex<MockChainState>,
    address_counter: AtomicU64,
}

impl MockAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_head(&self, head: u64) {
        self.state.lock().unwrap().head = head;
    }

    pub fn fail_head(&self, fail: bool) {
        self.state.lock().unwrap().head_error = fail;
    }

    pub fn put_block(&self, block_number: u64, transfers: Vec<Transfer>) {
        self.state
            .lock()
            .unwrap()
            .blocks
            .insert(block_number, transfers);
    }

    pub fn fail_block(&self, block_number: u64) {
        self.state
            .lock()
            .unwrap()
            .failing_blocks
            .insert(block_number);
    }

    pub fn put_tx_status(&self, tx_hash: &str, status: TxStatus) {
        self.state
            .lock()
            .unwrap()
            .tx_status
            .insert(tx_hash.to_string(), status);
    }

    pub fn set_balance(&self, address: &str, balance: U256) {
        self.state
            .lock()
            .unwrap()
            .balances
            .insert(address.to_string(), balance);
    }

    pub fn set_fee_rate(&self, rate: U256) {
        self.state.lock().unwrap().fee_rate = rate;
    }

    /// Every transfer submitted through the mock, in order.
    pub fn sent(&self) -> Vec<SentTransfer> {
        self.state.lock().unwrap().sent.clone()
    }
}

#[async_trait]
impl ChainAdapter for MockAdapter {
    async fn generate_address(&self) -> AdapterResult<GeneratedAddress> {
        let n = self.address_counter.fetch_add(1, Ordering::SeqCst);
        Ok(GeneratedAddress {
            address: format!("0xmockaddr{n:04}"),
            credential: format!("mock-credential-{n:04}"),
        })
    }

    async fn balance(&self, address: &str) -> AdapterResult<U256> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .balances
            .get(address)
            .copied()
            .unwrap_or(U256::ZERO))
    }

    async fn send_transfer(
        &self,
        from: &str,
        to: &str,
        amount: U256,
        credential: &str,
    ) -> AdapterResult<String> {
        let mut state = self.state.lock().unwrap();
        let tx_hash = format!("0xsent{:04}", state.sent.len());
        state.sent.push(SentTransfer {
            from: from.to_string(),
            to: to.to_string(),
            amount,
            credential: credential.to_string(),
            tx_hash: tx_hash.clone(),
        });
        Ok(tx_hash)
    }

    async fn transaction_status(&self, tx_hash: &str) -> AdapterResult<TxStatus> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .tx_status
            .get(tx_hash)
            .cloned()
            .unwrap_or_else(TxStatus::pending))
    }

    async fn head_block(&self) -> AdapterResult<u64> {
        let state = self.state.lock().unwrap();
        if state.head_error {
            return Err(AdapterError::Rpc("node unreachable".to_string()));
        }
        Ok(state.head)
    }

    async fn block_transfers(&self, block_number: u64) -> AdapterResult<Vec<Transfer>> {
        let state = self.state.lock().unwrap();
        if state.failing_blocks.contains(&block_number) {
            return Err(AdapterError::Rpc(format!("block {block_number} fetch failed")));
        }
        Ok(state
            .blocks
            .get(&block_number)
            .cloned()
            .unwrap_or_default())
    }

    async fn fee_rate(&self) -> AdapterResult<U256> {
        Ok(self.state.lock().unwrap().fee_rate)
    }
}

/// Build a transfer landing on `to` in `block_number`.
pub fn transfer(hash: &str, to: &str, amount: u64, block_number: u64) -> Transfer {
    Transfer {
        hash: hash.to_string(),
        from: "0xsender".to_string(),
        to: to.to_string(),
        amount: U256::from(amount),
        block_number,
    }
}
