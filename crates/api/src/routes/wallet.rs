//! Wallet routes: enable, view, disable, deposits, withdrawals and history.
//!
//! Soft outcomes of the wallet service (already enabled, disabled wallet) are
//! answered with a `fail` envelope; errors go through [`ApiError`].

use std::future::Future;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::Response,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use wallet_core::wallet::{
    TransactionDirection, Wallet, WalletError, WalletOutcome, WalletTransaction,
};
use wallet_shared::types::PageRequest;

use crate::{
    AppState,
    error::ApiError,
    extractors::FormOrJson,
    middleware::AuthUser,
    response::{fail, success},
};

/// Attempts per balance change before a stale read is reported to the client.
const MAX_ATTEMPTS: usize = 3;

/// Creates the wallet routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/wallet",
            get(view_wallet).post(enable_wallet).patch(disable_wallet),
        )
        .route("/wallet/deposits", post(deposit))
        .route("/wallet/withdrawals", post(withdraw))
        .route("/wallet/transactions", get(list_transactions))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for deposits and withdrawals.
#[derive(Debug, Deserialize)]
pub struct BalanceChangeRequest {
    /// Positive amount in minor units.
    pub amount: i64,
    /// Caller-chosen idempotency key.
    #[serde(default)]
    pub reference_id: String,
}

/// Wallet as shown to its owner.
#[derive(Debug, Serialize)]
pub struct WalletDetail {
    /// Wallet ID.
    pub id: Uuid,
    /// Customer ID of the owner.
    pub owned_by: String,
    /// `enabled` or `disabled`.
    pub status: &'static str,
    /// When the wallet was last enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_at: Option<DateTime<Utc>>,
    /// When the wallet was last disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_at: Option<DateTime<Utc>>,
    /// Current balance.
    pub balance: i64,
}

impl WalletDetail {
    fn new(wallet: &Wallet, owned_by: &str) -> Self {
        let (status, enabled_at, disabled_at) = if wallet.is_active() {
            ("enabled", Some(wallet.status_changed_at), None)
        } else {
            ("disabled", None, Some(wallet.status_changed_at))
        };
        Self {
            id: wallet.id.into_inner(),
            owned_by: owned_by.to_string(),
            status,
            enabled_at,
            disabled_at,
            balance: wallet.balance,
        }
    }
}

/// Response for a deposit.
#[derive(Debug, Serialize)]
pub struct DepositDetail {
    /// Transaction ID.
    pub id: Uuid,
    /// Customer ID of the depositor.
    pub deposited_by: String,
    /// Always `success`.
    pub status: &'static str,
    /// Commit time.
    pub deposited_at: DateTime<Utc>,
    /// Amount.
    pub amount: i64,
    /// Idempotency key.
    pub reference_id: String,
}

/// Response for a withdrawal.
#[derive(Debug, Serialize)]
pub struct WithdrawalDetail {
    /// Transaction ID.
    pub id: Uuid,
    /// Customer ID of the withdrawer.
    pub withdrawn_by: String,
    /// Always `success`.
    pub status: &'static str,
    /// Commit time.
    pub withdrawn_at: DateTime<Utc>,
    /// Amount.
    pub amount: i64,
    /// Idempotency key.
    pub reference_id: String,
}

/// Ledger entry in the history listing.
#[derive(Debug, Serialize)]
pub struct TransactionItem {
    /// Transaction ID.
    pub id: Uuid,
    /// `deposit` or `withdrawal`.
    #[serde(rename = "type")]
    pub direction: TransactionDirection,
    /// Amount.
    pub amount: i64,
    /// Idempotency key.
    pub reference_id: String,
    /// Commit time.
    pub created_at: DateTime<Utc>,
}

impl From<WalletTransaction> for TransactionItem {
    fn from(tx: WalletTransaction) -> Self {
        Self {
            id: tx.id.into_inner(),
            direction: tx.direction,
            amount: tx.amount,
            reference_id: tx.reference_id,
            created_at: tx.created_at,
        }
    }
}

fn wallet_body(wallet: &Wallet, auth: &AuthUser) -> serde_json::Value {
    serde_json::json!({ "wallet": WalletDetail::new(wallet, &auth.customer_xid) })
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/wallet` - Enable the caller's wallet, creating it on first use.
async fn enable_wallet(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Response, ApiError> {
    match state.wallets.enable_wallet(auth.user_id).await? {
        WalletOutcome::Applied(transition) => Ok(success(
            StatusCode::CREATED,
            wallet_body(&transition.wallet, &auth),
        )),
        WalletOutcome::AlreadyInState(_) | WalletOutcome::Unavailable => {
            Ok(fail(StatusCode::BAD_REQUEST, "Already enabled"))
        }
    }
}

/// GET `/wallet` - View the balance of an enabled wallet.
async fn view_wallet(State(state): State<AppState>, auth: AuthUser) -> Result<Response, ApiError> {
    match state.wallets.view_balance(auth.user_id).await? {
        WalletOutcome::Applied(wallet) => Ok(success(StatusCode::OK, wallet_body(&wallet, &auth))),
        WalletOutcome::AlreadyInState(_) | WalletOutcome::Unavailable => {
            Ok(fail(StatusCode::NOT_FOUND, "Disabled"))
        }
    }
}

/// PATCH `/wallet` - Disable the caller's wallet.
async fn disable_wallet(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Response, ApiError> {
    match state.wallets.disable_wallet(auth.user_id).await? {
        WalletOutcome::Applied(transition) => {
            Ok(success(StatusCode::OK, wallet_body(&transition.wallet, &auth)))
        }
        WalletOutcome::AlreadyInState(_) => Ok(fail(StatusCode::BAD_REQUEST, "Already disabled")),
        WalletOutcome::Unavailable => Ok(fail(StatusCode::NOT_FOUND, "Wallet not found")),
    }
}

/// POST `/wallet/deposits` - Add money to an enabled wallet.
async fn deposit(
    State(state): State<AppState>,
    auth: AuthUser,
    FormOrJson(body): FormOrJson<BalanceChangeRequest>,
) -> Result<Response, ApiError> {
    let outcome = with_retry(|| {
        state
            .wallets
            .deposit(auth.user_id, &body.reference_id, body.amount)
    })
    .await?;

    match outcome {
        WalletOutcome::Applied(tx) => Ok(success(
            StatusCode::CREATED,
            serde_json::json!({
                "deposit": DepositDetail {
                    id: tx.id.into_inner(),
                    deposited_by: auth.customer_xid.clone(),
                    status: "success",
                    deposited_at: tx.created_at,
                    amount: tx.amount,
                    reference_id: tx.reference_id,
                }
            }),
        )),
        WalletOutcome::AlreadyInState(_) | WalletOutcome::Unavailable => {
            Ok(fail(StatusCode::BAD_REQUEST, "Wallet disabled"))
        }
    }
}

/// POST `/wallet/withdrawals` - Take money from an enabled wallet.
async fn withdraw(
    State(state): State<AppState>,
    auth: AuthUser,
    FormOrJson(body): FormOrJson<BalanceChangeRequest>,
) -> Result<Response, ApiError> {
    let outcome = with_retry(|| {
        state
            .wallets
            .withdraw(auth.user_id, &body.reference_id, body.amount)
    })
    .await?;

    match outcome {
        WalletOutcome::Applied(tx) => Ok(success(
            StatusCode::CREATED,
            serde_json::json!({
                "withdrawal": WithdrawalDetail {
                    id: tx.id.into_inner(),
                    withdrawn_by: auth.customer_xid.clone(),
                    status: "success",
                    withdrawn_at: tx.created_at,
                    amount: tx.amount,
                    reference_id: tx.reference_id,
                }
            }),
        )),
        WalletOutcome::AlreadyInState(_) | WalletOutcome::Unavailable => {
            Ok(fail(StatusCode::BAD_REQUEST, "Wallet disabled"))
        }
    }
}

/// GET `/wallet/transactions` - Page through the ledger, newest first.
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
) -> Result<Response, ApiError> {
    match state.wallets.list_transactions(auth.user_id, page).await? {
        WalletOutcome::Applied(page) => {
            let page = page.map(TransactionItem::from);
            Ok(success(
                StatusCode::OK,
                serde_json::json!({ "transactions": page.data, "meta": page.meta }),
            ))
        }
        WalletOutcome::AlreadyInState(_) | WalletOutcome::Unavailable => {
            Ok(fail(StatusCode::NOT_FOUND, "Disabled"))
        }
    }
}

/// Re-runs a balance change whose read went stale before it was applied.
async fn with_retry<F, Fut>(mut attempt: F) -> Result<WalletOutcome<WalletTransaction>, WalletError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<WalletOutcome<WalletTransaction>, WalletError>>,
{
    let mut tries = 1;
    loop {
        match attempt().await {
            Err(err) if err.is_retryable() && tries < MAX_ATTEMPTS => {
                warn!(error = %err, attempt = tries, "Retrying balance change");
                tries += 1;
            }
            result => return result,
        }
    }
}
