//! `SeaORM` entity definitions.

pub mod prelude;

pub mod enums;
pub mod sessions;
pub mod users;
pub mod wallet_transactions;
pub mod wallets;
