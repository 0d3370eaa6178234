//! Request handlers for the boundary operations.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::AppState;
use crate::engine::wallet::WalletError;
use crate::engine::withdrawal::WithdrawError;
use crate::model::{Chain, Withdrawal};

/// Error payload returned to API clients.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<WalletError> for ApiError {
    fn from(err: WalletError) -> Self {
        let status = match &err {
            WalletError::UnsupportedChain(_) => StatusCode::BAD_REQUEST,
            WalletError::MissingWallet(_) => StatusCode::NOT_FOUND,
            WalletError::Adapter(_) => StatusCode::BAD_GATEWAY,
            WalletError::Custody(_) | WalletError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<WithdrawError> for ApiError {
    fn from(err: WithdrawError) -> Self {
        let status = match &err {
            WithdrawError::UnsupportedChain(_) | WithdrawError::InvalidAmount(_) => {
                StatusCode::BAD_REQUEST
            }
            WithdrawError::MissingWallet(_) => StatusCode::NOT_FOUND,
            WithdrawError::Adapter(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

#[derive(Serialize)]
pub struct HealthStatus {
    pub version: &'static str,
    pub status: &'static str,
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "ok",
    })
}

#[derive(Deserialize)]
pub struct DepositAddressRequest {
    pub chain: String,
    pub user_id: String,
    pub order_id: String,
}

#[derive(Serialize)]
pub struct DepositAddressResponse {
    pub chain: String,
    pub address: String,
    pub order_id: String,
}

pub async fn issue_deposit_address(
    State(state): State<AppState>,
    Json(req): Json<DepositAddressRequest>,
) -> Result<Json<DepositAddressResponse>, ApiError> {
    let address = state
        .wallets
        .issue_deposit_address(Chain(req.chain.clone()), req.user_id, req.order_id.clone())
        .await?;

    Ok(Json(DepositAddressResponse {
        chain: req.chain,
        address,
        order_id: req.order_id,
    }))
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub chain: String,
    /// Decimal string in the chain's smallest unit.
    pub balance: String,
}

pub async fn balance(
    State(state): State<AppState>,
    Path(chain): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state
        .wallets
        .hot_wallet_balance(&Chain(chain.clone()))
        .await?;

    Ok(Json(BalanceResponse {
        chain,
        balance: balance.to_string(),
    }))
}

#[derive(Deserialize)]
pub struct CreateWithdrawalRequest {
    pub chain: String,
    pub order_id: String,
    pub to_address: String,
    /// Decimal string in the chain's smallest unit.
    pub amount: String,
}

pub async fn create_withdrawal(
    State(state): State<AppState>,
    Json(req): Json<CreateWithdrawalRequest>,
) -> Result<Json<Withdrawal>, ApiError> {
    let withdrawal = state
        .withdrawals
        .create(Chain(req.chain), req.order_id, req.to_address, req.amount)
        .await?;

    Ok(Json(withdrawal))
}

pub async fn withdrawal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Withdrawal>, ApiError> {
    let record = state
        .store
        .withdrawal(id)
        .await
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, format!("withdrawal {id} not found")))?;

    Ok(Json(record))
}
