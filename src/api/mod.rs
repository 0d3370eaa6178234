//! HTTP API layer.
//!
//! Thin request/response marshalling over the boundary operations; every
//! decision lives in the engines. Handlers stay free of business logic.

pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::engine::{WalletService, WithdrawalProcessor};
use crate::store::Store;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub wallets: Arc<WalletService>,
    pub withdrawals: Arc<WithdrawalProcessor>,
    pub store: Arc<dyn Store>,
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/v1/deposit/address",
            post(handlers::issue_deposit_address),
        )
        .route("/api/v1/balance/{chain}", get(handlers::balance))
        .route("/api/v1/withdrawal", post(handlers::create_withdrawal))
        .route("/api/v1/withdrawal/{id}", get(handlers::withdrawal))
        .with_state(state)
}
