//! Transaction processor: deposits and withdrawals.
//!
//! Processing order for a request:
//! 1. validate the input,
//! 2. gate on an active wallet (soft failure otherwise),
//! 3. check funds for withdrawals and compute the new balance,
//! 4. reject a reference already applied in the same direction,
//! 5. hand the change to the store's atomic unit.
//!
//! Steps 3 and 4 are repeated by the store inside its atomic unit, so two
//! racing requests cannot both pass them.

use tracing::{info, warn};
use wallet_shared::types::UserId;

use super::error::WalletError;
use super::service::WalletService;
use super::store::LedgerStore;
use super::types::{BalanceChange, TransactionDirection, Wallet, WalletOutcome, WalletTransaction};

/// Rejects blank references and non-positive amounts.
pub fn validate_request(reference_id: &str, amount: i64) -> Result<(), WalletError> {
    if reference_id.trim().is_empty() {
        return Err(WalletError::MissingReference);
    }
    if amount <= 0 {
        return Err(WalletError::InvalidAmount(amount));
    }
    Ok(())
}

/// Computes the balance change for an active wallet.
pub fn plan_balance_change(
    wallet: &Wallet,
    reference_id: &str,
    direction: TransactionDirection,
    amount: i64,
) -> Result<BalanceChange, WalletError> {
    let new_balance = match direction {
        TransactionDirection::Withdrawal if amount > wallet.balance => {
            return Err(WalletError::InsufficientBalance {
                balance: wallet.balance,
                requested: amount,
            });
        }
        _ => direction
            .apply(wallet.balance, amount)
            .ok_or(WalletError::BalanceOverflow {
                balance: wallet.balance,
                amount,
            })?,
    };

    Ok(BalanceChange {
        wallet_id: wallet.id,
        reference_id: reference_id.to_string(),
        direction,
        amount,
        expected_balance: wallet.balance,
        new_balance,
    })
}

impl<S: LedgerStore> WalletService<S> {
    /// Adds `amount` to the user's wallet.
    pub async fn deposit(
        &self,
        owner_id: UserId,
        reference_id: &str,
        amount: i64,
    ) -> Result<WalletOutcome<WalletTransaction>, WalletError> {
        self.process(owner_id, reference_id, TransactionDirection::Deposit, amount)
            .await
    }

    /// Takes `amount` from the user's wallet.
    pub async fn withdraw(
        &self,
        owner_id: UserId,
        reference_id: &str,
        amount: i64,
    ) -> Result<WalletOutcome<WalletTransaction>, WalletError> {
        self.process(owner_id, reference_id, TransactionDirection::Withdrawal, amount)
            .await
    }

    /// Runs a balance change request through every check and applies it.
    pub async fn process(
        &self,
        owner_id: UserId,
        reference_id: &str,
        direction: TransactionDirection,
        amount: i64,
    ) -> Result<WalletOutcome<WalletTransaction>, WalletError> {
        validate_request(reference_id, amount)?;

        let WalletOutcome::Applied(wallet) = self.view_balance(owner_id).await? else {
            info!(%owner_id, %direction, "wallet disabled, balance change skipped");
            return Ok(WalletOutcome::Unavailable);
        };

        let change = plan_balance_change(&wallet, reference_id, direction, amount)?;

        if let Some(existing) = self
            .store
            .find_transaction_by_reference(reference_id, direction)
            .await?
        {
            warn!(
                reference_id,
                %direction,
                transaction_id = %existing.id,
                "reference already applied"
            );
            return Err(WalletError::DuplicateReference {
                reference_id: reference_id.to_string(),
                direction,
            });
        }

        let transaction = self.store.apply_balance_change(change).await?;

        info!(
            wallet_id = %wallet.id,
            transaction_id = %transaction.id,
            %direction,
            amount,
            "balance updated"
        );

        Ok(WalletOutcome::Applied(transaction))
    }
}
