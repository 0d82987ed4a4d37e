//! Entity re-exports.

pub use super::sessions::Entity as Sessions;
pub use super::users::Entity as Users;
pub use super::wallet_transactions::Entity as WalletTransactions;
pub use super::wallets::Entity as Wallets;
