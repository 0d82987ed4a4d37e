//! Wallet state machine.
//!
//! ```text
//! Uninitialized ──enable──▶ Active ◀──enable/disable──▶ Inactive
//! ```
//!
//! A wallet never returns to `Uninitialized` and is never deleted.

use tracing::{debug, info};
use wallet_shared::types::UserId;

use super::error::{StoreError, WalletError};
use super::service::WalletService;
use super::store::LedgerStore;
use super::types::{StatusChange, Wallet, WalletOutcome, WalletStatus, WalletTransition};

/// What an enable request must do for the wallet as currently stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnablePlan {
    /// No wallet yet.
    Create,
    /// Wallet is inactive.
    Reactivate(Wallet),
    /// Wallet is already active; nothing to do.
    AlreadyActive(Wallet),
}

impl EnablePlan {
    /// Plans an enable for the stored wallet, if any.
    #[must_use]
    pub fn for_wallet(existing: Option<Wallet>) -> Self {
        match existing {
            None => Self::Create,
            Some(wallet) if wallet.is_active() => Self::AlreadyActive(wallet),
            Some(wallet) => Self::Reactivate(wallet),
        }
    }
}

/// What a disable request must do for the wallet as currently stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisablePlan {
    /// No wallet; nothing to disable.
    Missing,
    /// Wallet is active.
    Deactivate(Wallet),
    /// Wallet is already inactive; nothing to do.
    AlreadyInactive(Wallet),
}

impl DisablePlan {
    /// Plans a disable for the stored wallet, if any.
    #[must_use]
    pub fn for_wallet(existing: Option<Wallet>) -> Self {
        match existing {
            None => Self::Missing,
            Some(wallet) if wallet.is_active() => Self::Deactivate(wallet),
            Some(wallet) => Self::AlreadyInactive(wallet),
        }
    }
}

/// Gate consulted before every balance change: only active wallets pass.
#[must_use]
pub fn active_only(existing: Option<Wallet>) -> WalletOutcome<Wallet> {
    match existing {
        Some(wallet) if wallet.is_active() => WalletOutcome::Applied(wallet),
        _ => WalletOutcome::Unavailable,
    }
}

impl<S: LedgerStore> WalletService<S> {
    /// Enables the user's wallet, creating it on first use.
    pub async fn enable_wallet(
        &self,
        owner_id: UserId,
    ) -> Result<WalletOutcome<WalletTransition>, WalletError> {
        let existing = self.store.get_wallet(owner_id).await?;

        match EnablePlan::for_wallet(existing) {
            EnablePlan::Create => self.create_wallet(owner_id).await,
            EnablePlan::Reactivate(wallet) => self.reactivate(wallet).await,
            EnablePlan::AlreadyActive(wallet) => {
                debug!(wallet_id = %wallet.id, "wallet already enabled");
                Ok(WalletOutcome::AlreadyInState(wallet))
            }
        }
    }

    /// Disables the user's wallet, freezing its balance.
    pub async fn disable_wallet(
        &self,
        owner_id: UserId,
    ) -> Result<WalletOutcome<WalletTransition>, WalletError> {
        let existing = self.store.get_wallet(owner_id).await?;

        match DisablePlan::for_wallet(existing) {
            DisablePlan::Missing => {
                debug!(%owner_id, "no wallet to disable");
                Ok(WalletOutcome::Unavailable)
            }
            DisablePlan::AlreadyInactive(wallet) => {
                debug!(wallet_id = %wallet.id, "wallet already disabled");
                Ok(WalletOutcome::AlreadyInState(wallet))
            }
            DisablePlan::Deactivate(wallet) => {
                let wallet = self
                    .store
                    .set_wallet_status(wallet.id, WalletStatus::Inactive)
                    .await?;
                info!(wallet_id = %wallet.id, %owner_id, "wallet disabled");
                Ok(WalletOutcome::Applied(WalletTransition {
                    change: StatusChange::Deactivated,
                    wallet,
                }))
            }
        }
    }

    /// Returns the user's wallet if it exists and is active.
    pub async fn view_balance(&self, owner_id: UserId) -> Result<WalletOutcome<Wallet>, WalletError> {
        let existing = self.store.get_wallet(owner_id).await?;
        let outcome = active_only(existing);
        if !outcome.is_applied() {
            debug!(%owner_id, "wallet unavailable");
        }
        Ok(outcome)
    }

    async fn create_wallet(
        &self,
        owner_id: UserId,
    ) -> Result<WalletOutcome<WalletTransition>, WalletError> {
        match self.store.create_wallet(owner_id, self.default_balance).await {
            Ok(wallet) => {
                info!(
                    wallet_id = %wallet.id,
                    %owner_id,
                    balance = wallet.balance,
                    "wallet created"
                );
                Ok(WalletOutcome::Applied(WalletTransition {
                    change: StatusChange::Created,
                    wallet,
                }))
            }
            Err(StoreError::WalletExists(_)) => {
                // Another request created it first; continue from the stored wallet.
                debug!(%owner_id, "wallet created concurrently");
                match self.store.get_wallet(owner_id).await? {
                    Some(wallet) if wallet.is_active() => Ok(WalletOutcome::AlreadyInState(wallet)),
                    Some(wallet) => self.reactivate(wallet).await,
                    None => Err(StoreError::WalletExists(owner_id).into()),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn reactivate(
        &self,
        wallet: Wallet,
    ) -> Result<WalletOutcome<WalletTransition>, WalletError> {
        let wallet = self
            .store
            .set_wallet_status(wallet.id, WalletStatus::Active)
            .await?;
        info!(wallet_id = %wallet.id, balance = wallet.balance, "wallet re-enabled");
        Ok(WalletOutcome::Applied(WalletTransition {
            change: StatusChange::Reactivated,
            wallet,
        }))
    }
}
