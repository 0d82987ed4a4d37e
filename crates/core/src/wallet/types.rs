//! Wallet domain types.
//!
//! Balances and amounts are integer minor units. A wallet's balance never
//! goes below zero and every ledger entry carries a strictly positive amount.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wallet_shared::types::{UserId, WalletId, WalletTransactionId};

/// Whether a wallet accepts balance changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletStatus {
    /// Wallet is enabled.
    Active,
    /// Wallet is disabled; the balance is frozen.
    Inactive,
}

impl WalletStatus {
    /// Returns true if balance changes are allowed.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for WalletStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a balance change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionDirection {
    /// Money added to the wallet.
    Deposit,
    /// Money taken from the wallet.
    Withdrawal,
}

impl TransactionDirection {
    /// Applies `amount` to `balance` in this direction.
    ///
    /// Returns `None` on overflow or when the result would be negative.
    #[must_use]
    pub fn apply(self, balance: i64, amount: i64) -> Option<i64> {
        let next = match self {
            Self::Deposit => balance.checked_add(amount)?,
            Self::Withdrawal => balance.checked_sub(amount)?,
        };
        (next >= 0).then_some(next)
    }

    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
        }
    }
}

impl std::fmt::Display for TransactionDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Wallet ID.
    pub id: WalletId,
    /// The owning user; one wallet per user.
    pub owner_id: UserId,
    /// Current balance, never negative.
    pub balance: i64,
    /// Current status.
    pub status: WalletStatus,
    /// When the status last changed (creation counts as a change).
    pub status_changed_at: DateTime<Utc>,
}

impl Wallet {
    /// Returns true if the wallet accepts balance changes.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// An immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletTransaction {
    /// Transaction ID.
    pub id: WalletTransactionId,
    /// The wallet whose balance changed.
    pub wallet_id: WalletId,
    /// Deposit or withdrawal.
    pub direction: TransactionDirection,
    /// Amount moved, always positive.
    pub amount: i64,
    /// Caller-supplied idempotency key, unique per direction.
    pub reference_id: String,
    /// When the entry was recorded.
    pub created_at: DateTime<Utc>,
}

/// A fully validated balance change, ready for the store's atomic unit.
///
/// `expected_balance` is the balance the change was computed from. The store
/// rejects the change if the wallet no longer holds that balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceChange {
    /// Target wallet.
    pub wallet_id: WalletId,
    /// Idempotency key.
    pub reference_id: String,
    /// Deposit or withdrawal.
    pub direction: TransactionDirection,
    /// Positive amount.
    pub amount: i64,
    /// Balance observed when the change was planned.
    pub expected_balance: i64,
    /// Balance to write.
    pub new_balance: i64,
}

/// The status transition performed by enable/disable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusChange {
    /// No wallet existed; one was created active.
    Created,
    /// An inactive wallet was enabled again.
    Reactivated,
    /// An active wallet was disabled.
    Deactivated,
}

/// A wallet after a status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletTransition {
    /// What happened.
    pub change: StatusChange,
    /// The wallet after the change.
    pub wallet: Wallet,
}

/// Outcome of a wallet operation that did not fail with an error.
///
/// Soft failures are expected business outcomes and are reported here rather
/// than as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletOutcome<T> {
    /// The operation took effect.
    Applied(T),
    /// The wallet is already in the requested state; nothing was written.
    AlreadyInState(Wallet),
    /// The wallet does not exist or is disabled.
    Unavailable,
}

impl<T> WalletOutcome<T> {
    /// Returns true if the operation took effect.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// Returns the applied value, if any.
    #[must_use]
    pub fn applied(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            Self::AlreadyInState(_) | Self::Unavailable => None,
        }
    }

    /// Maps the applied value.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> WalletOutcome<U> {
        match self {
            Self::Applied(value) => WalletOutcome::Applied(f(value)),
            Self::AlreadyInState(wallet) => WalletOutcome::AlreadyInState(wallet),
            Self::Unavailable => WalletOutcome::Unavailable,
        }
    }
}
