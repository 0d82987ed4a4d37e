//! Ledger store contract.

use std::future::Future;

use wallet_shared::types::{PageRequest, UserId, WalletId};

use super::error::StoreError;
use super::types::{BalanceChange, TransactionDirection, Wallet, WalletStatus, WalletTransaction};

/// Durable storage for wallets and their ledger.
///
/// This trait is implemented by the db crate to provide actual database
/// operations, and by [`super::MemoryLedgerStore`] for tests and embedding.
pub trait LedgerStore: Send + Sync {
    /// Finds the wallet owned by a user.
    fn get_wallet(
        &self,
        owner_id: UserId,
    ) -> impl Future<Output = Result<Option<Wallet>, StoreError>> + Send;

    /// Creates an active wallet for a user.
    ///
    /// Fails with [`StoreError::WalletExists`] if the user already has one.
    fn create_wallet(
        &self,
        owner_id: UserId,
        initial_balance: i64,
    ) -> impl Future<Output = Result<Wallet, StoreError>> + Send;

    /// Sets a wallet's status and stamps `status_changed_at`.
    fn set_wallet_status(
        &self,
        wallet_id: WalletId,
        status: WalletStatus,
    ) -> impl Future<Output = Result<Wallet, StoreError>> + Send;

    /// Finds the transaction recorded for a reference in one direction.
    fn find_transaction_by_reference(
        &self,
        reference_id: &str,
        direction: TransactionDirection,
    ) -> impl Future<Output = Result<Option<WalletTransaction>, StoreError>> + Send;

    /// Writes the new balance and appends the ledger entry as one atomic unit.
    ///
    /// Implementations must hold the wallet exclusively for the whole unit and
    /// re-validate inside it, in this order:
    /// 1. the reference is unused for the direction, else [`StoreError::DuplicateReference`];
    /// 2. the wallet is active and still holds `expected_balance`, else
    ///    [`StoreError::ConcurrentModification`];
    /// 3. `new_balance` is non-negative, else [`StoreError::InvariantViolation`].
    ///
    /// On any error neither write is visible.
    fn apply_balance_change(
        &self,
        change: BalanceChange,
    ) -> impl Future<Output = Result<WalletTransaction, StoreError>> + Send;

    /// Lists a wallet's ledger, newest first, with the total entry count.
    fn list_transactions(
        &self,
        wallet_id: WalletId,
        page: PageRequest,
    ) -> impl Future<Output = Result<(Vec<WalletTransaction>, u64), StoreError>> + Send;
}
