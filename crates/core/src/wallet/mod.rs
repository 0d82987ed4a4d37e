//! Wallet ledger: state machine and balance-mutation engine.
//!
//! - Domain types (wallets, ledger entries, outcomes)
//! - Error types for validation and store failures
//! - The `LedgerStore` contract and an in-memory implementation
//! - Enable/disable/view transitions
//! - Deposit and withdrawal processing

pub mod error;
pub mod memory;
pub mod processor;
pub mod service;
pub mod state;
pub mod store;
pub mod types;

#[cfg(test)]
mod props;

pub use error::{StoreError, WalletError};
pub use memory::MemoryLedgerStore;
pub use processor::{plan_balance_change, validate_request};
pub use service::WalletService;
pub use state::{DisablePlan, EnablePlan, active_only};
pub use store::LedgerStore;
pub use types::{
    BalanceChange, StatusChange, TransactionDirection, Wallet, WalletOutcome, WalletStatus,
    WalletTransaction, WalletTransition,
};
