//! Core business logic for the wallet service.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Persistence is reached only through the `LedgerStore` trait, which the db
//! crate implements.
//!
//! # Modules
//!
//! - `wallet` - Wallet state machine, transaction processor and ledger store contract

pub mod wallet;
