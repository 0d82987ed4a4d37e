//! Wallet error types.
//!
//! `StoreError` covers failures of the ledger store. `WalletError` is what
//! callers of the wallet service see: hard validation failures plus store
//! errors passed through unchanged.

use thiserror::Error;
use wallet_shared::types::{UserId, WalletId};

use super::types::TransactionDirection;

/// Errors raised by a `LedgerStore` implementation.
///
/// A store operation that returns an error has left no trace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Wallet not found.
    #[error("Wallet not found: {0}")]
    WalletNotFound(WalletId),

    /// The owner already has a wallet.
    #[error("User {0} already has a wallet")]
    WalletExists(UserId),

    /// The reference was already applied in this direction.
    #[error("Reference {reference_id} was already used for a {direction}")]
    DuplicateReference {
        /// The idempotency key.
        reference_id: String,
        /// The direction it was applied in.
        direction: TransactionDirection,
    },

    /// The wallet changed between planning and applying a balance change.
    #[error("Concurrent modification detected for wallet {0}, please retry")]
    ConcurrentModification(WalletId),

    /// A write would have broken a ledger invariant.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl StoreError {
    /// Returns true if repeating the whole operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification(_))
    }
}

/// Errors returned by wallet operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    // ========== Validation Errors ==========
    /// Amount must be strictly positive.
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(i64),

    /// Reference ID must not be blank.
    #[error("Reference ID is required")]
    MissingReference,

    // ========== Business Rule Errors ==========
    /// Withdrawal larger than the balance.
    #[error("Insufficient balance: balance {balance}, requested {requested}")]
    InsufficientBalance {
        /// Current balance.
        balance: i64,
        /// Requested withdrawal.
        requested: i64,
    },

    /// The reference was already applied in this direction.
    #[error("Reference ID must be unique: {reference_id} was already used for a {direction}")]
    DuplicateReference {
        /// The idempotency key.
        reference_id: String,
        /// The direction it was applied in.
        direction: TransactionDirection,
    },

    /// The deposit would overflow the balance.
    #[error("Deposit of {amount} would overflow balance {balance}")]
    BalanceOverflow {
        /// Current balance.
        balance: i64,
        /// Requested deposit.
        amount: i64,
    },

    // ========== Store Errors ==========
    /// The ledger store failed.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for WalletError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateReference {
                reference_id,
                direction,
            } => Self::DuplicateReference {
                reference_id,
                direction,
            },
            other => Self::Store(other),
        }
    }
}

impl WalletError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::MissingReference => "MISSING_REFERENCE",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::DuplicateReference { .. } => "DUPLICATE_REFERENCE",
            Self::BalanceOverflow { .. } => "BALANCE_OVERFLOW",
            Self::Store(StoreError::WalletNotFound(_)) => "WALLET_NOT_FOUND",
            Self::Store(StoreError::WalletExists(_)) => "WALLET_EXISTS",
            Self::Store(StoreError::DuplicateReference { .. }) => "DUPLICATE_REFERENCE",
            Self::Store(StoreError::ConcurrentModification(_)) => "CONCURRENT_MODIFICATION",
            Self::Store(StoreError::InvariantViolation(_)) => "INVARIANT_VIOLATION",
            Self::Store(StoreError::Database(_)) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - malformed input
            Self::InvalidAmount(_) | Self::MissingReference => 400,

            // 404 Not Found
            Self::Store(StoreError::WalletNotFound(_)) => 404,

            // 409 Conflict - idempotency and concurrency
            Self::DuplicateReference { .. }
            | Self::Store(
                StoreError::WalletExists(_)
                | StoreError::DuplicateReference { .. }
                | StoreError::ConcurrentModification(_),
            ) => 409,

            // 422 Unprocessable - business rules
            Self::InsufficientBalance { .. } | Self::BalanceOverflow { .. } => 422,

            // 500 Internal Server Error
            Self::Store(StoreError::InvariantViolation(_) | StoreError::Database(_)) => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Store(err) => err.is_retryable(),
            _ => false,
        }
    }
}
