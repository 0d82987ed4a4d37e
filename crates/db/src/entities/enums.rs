//! String-backed enums stored in wallet tables.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stored wallet status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum WalletStatus {
    /// Accepts balance changes.
    #[sea_orm(string_value = "active")]
    Active,
    /// Disabled by its owner.
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

impl From<wallet_core::wallet::WalletStatus> for WalletStatus {
    fn from(status: wallet_core::wallet::WalletStatus) -> Self {
        match status {
            wallet_core::wallet::WalletStatus::Active => Self::Active,
            wallet_core::wallet::WalletStatus::Inactive => Self::Inactive,
        }
    }
}

impl From<WalletStatus> for wallet_core::wallet::WalletStatus {
    fn from(status: WalletStatus) -> Self {
        match status {
            WalletStatus::Active => Self::Active,
            WalletStatus::Inactive => Self::Inactive,
        }
    }
}

/// Stored transaction direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum TransactionDirection {
    /// Credit.
    #[sea_orm(string_value = "deposit")]
    Deposit,
    /// Debit.
    #[sea_orm(string_value = "withdrawal")]
    Withdrawal,
}

impl From<wallet_core::wallet::TransactionDirection> for TransactionDirection {
    fn from(direction: wallet_core::wallet::TransactionDirection) -> Self {
        match direction {
            wallet_core::wallet::TransactionDirection::Deposit => Self::Deposit,
            wallet_core::wallet::TransactionDirection::Withdrawal => Self::Withdrawal,
        }
    }
}

impl From<TransactionDirection> for wallet_core::wallet::TransactionDirection {
    fn from(direction: TransactionDirection) -> Self {
        match direction {
            TransactionDirection::Deposit => Self::Deposit,
            TransactionDirection::Withdrawal => Self::Withdrawal,
        }
    }
}
