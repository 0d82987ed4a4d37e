//! In-memory ledger store.
//!
//! One mutex guards all state, so every operation, `apply_balance_change`
//! included, is serialized. Used as the test double for the wallet service
//! and for running the service without a database.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::Mutex;
use wallet_shared::types::{PageRequest, UserId, WalletId, WalletTransactionId};

use super::error::StoreError;
use super::store::LedgerStore;
use super::types::{BalanceChange, TransactionDirection, Wallet, WalletStatus, WalletTransaction};

#[derive(Debug, Default)]
struct MemoryState {
    wallets: HashMap<WalletId, Wallet>,
    by_owner: HashMap<UserId, WalletId>,
    transactions: Vec<WalletTransaction>,
    references: HashMap<(String, TransactionDirection), usize>,
}

/// Ledger store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    state: Mutex<MemoryState>,
}

impl MemoryLedgerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ledger entries across all wallets.
    pub async fn transaction_count(&self) -> usize {
        self.state.lock().await.transactions.len()
    }
}

impl LedgerStore for MemoryLedgerStore {
    async fn get_wallet(&self, owner_id: UserId) -> Result<Option<Wallet>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .by_owner
            .get(&owner_id)
            .and_then(|id| state.wallets.get(id))
            .cloned())
    }

    async fn create_wallet(
        &self,
        owner_id: UserId,
        initial_balance: i64,
    ) -> Result<Wallet, StoreError> {
        if initial_balance < 0 {
            return Err(StoreError::InvariantViolation(format!(
                "initial balance {initial_balance} is negative"
            )));
        }

        let mut state = self.state.lock().await;
        if state.by_owner.contains_key(&owner_id) {
            return Err(StoreError::WalletExists(owner_id));
        }

        let wallet = Wallet {
            id: WalletId::new(),
            owner_id,
            balance: initial_balance,
            status: WalletStatus::Active,
            status_changed_at: Utc::now(),
        };
        state.by_owner.insert(owner_id, wallet.id);
        state.wallets.insert(wallet.id, wallet.clone());
        Ok(wallet)
    }

    async fn set_wallet_status(
        &self,
        wallet_id: WalletId,
        status: WalletStatus,
    ) -> Result<Wallet, StoreError> {
        let mut state = self.state.lock().await;
        let wallet = state
            .wallets
            .get_mut(&wallet_id)
            .ok_or(StoreError::WalletNotFound(wallet_id))?;
        wallet.status = status;
        wallet.status_changed_at = Utc::now();
        Ok(wallet.clone())
    }

    async fn find_transaction_by_reference(
        &self,
        reference_id: &str,
        direction: TransactionDirection,
    ) -> Result<Option<WalletTransaction>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .references
            .get(&(reference_id.to_string(), direction))
            .map(|&index| state.transactions[index].clone()))
    }

    async fn apply_balance_change(
        &self,
        change: BalanceChange,
    ) -> Result<WalletTransaction, StoreError> {
        let mut state = self.state.lock().await;

        let key = (change.reference_id.clone(), change.direction);
        if state.references.contains_key(&key) {
            return Err(StoreError::DuplicateReference {
                reference_id: change.reference_id,
                direction: change.direction,
            });
        }

        let wallet = state
            .wallets
            .get(&change.wallet_id)
            .ok_or(StoreError::WalletNotFound(change.wallet_id))?;
        if !wallet.is_active() || wallet.balance != change.expected_balance {
            return Err(StoreError::ConcurrentModification(change.wallet_id));
        }
        if change.new_balance < 0 {
            return Err(StoreError::InvariantViolation(format!(
                "balance of wallet {} would become {}",
                change.wallet_id, change.new_balance
            )));
        }

        // Every check passed; nothing below can fail, so both writes land together.
        let transaction = WalletTransaction {
            id: WalletTransactionId::new(),
            wallet_id: change.wallet_id,
            direction: change.direction,
            amount: change.amount,
            reference_id: change.reference_id,
            created_at: Utc::now(),
        };
        if let Some(wallet) = state.wallets.get_mut(&change.wallet_id) {
            wallet.balance = change.new_balance;
        }
        let index = state.transactions.len();
        state.transactions.push(transaction.clone());
        state.references.insert(key, index);

        Ok(transaction)
    }

    async fn list_transactions(
        &self,
        wallet_id: WalletId,
        page: PageRequest,
    ) -> Result<(Vec<WalletTransaction>, u64), StoreError> {
        let state = self.state.lock().await;
        let entries: Vec<&WalletTransaction> = state
            .transactions
            .iter()
            .rev()
            .filter(|tx| tx.wallet_id == wallet_id)
            .collect();

        let total = entries.len() as u64;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        let items = entries
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok((items, total))
    }
}
