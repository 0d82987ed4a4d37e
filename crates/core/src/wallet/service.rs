//! Wallet service wiring the state machine and the transaction processor to a store.

use std::sync::Arc;

use wallet_shared::types::{PageRequest, PageResponse, UserId};

use super::error::WalletError;
use super::store::LedgerStore;
use super::types::{WalletOutcome, WalletTransaction};

/// Entry point for every wallet operation.
///
/// The store handle is injected, so the same service runs against the
/// database repository in production and the in-memory store in tests.
pub struct WalletService<S: LedgerStore> {
    pub(super) store: Arc<S>,
    pub(super) default_balance: i64,
}

impl<S: LedgerStore> Clone for WalletService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            default_balance: self.default_balance,
        }
    }
}

impl<S: LedgerStore> WalletService<S> {
    /// Creates a new wallet service.
    ///
    /// `default_balance` is credited to wallets on their first enable. A
    /// negative value is refused by the store when the first wallet is
    /// created.
    #[must_use]
    pub fn new(store: Arc<S>, default_balance: i64) -> Self {
        debug_assert!(default_balance >= 0, "default balance must not be negative");
        Self {
            store,
            default_balance,
        }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Balance given to newly created wallets.
    #[must_use]
    pub const fn default_balance(&self) -> i64 {
        self.default_balance
    }

    /// Lists the ledger of the user's active wallet, newest first.
    pub async fn list_transactions(
        &self,
        owner_id: UserId,
        page: PageRequest,
    ) -> Result<WalletOutcome<PageResponse<WalletTransaction>>, WalletError> {
        let WalletOutcome::Applied(wallet) = self.view_balance(owner_id).await? else {
            return Ok(WalletOutcome::Unavailable);
        };

        let page = page.normalized();
        let (items, total) = self.store.list_transactions(wallet.id, page).await?;

        Ok(WalletOutcome::Applied(PageResponse::new(
            items,
            page.page,
            page.per_page,
            total,
        )))
    }
}
