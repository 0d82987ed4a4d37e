//! Shared types, errors, and configuration for the wallet service.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for wallets, transactions, users and sessions
//! - Pagination types for list endpoints
//! - Request-level error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::AppError;
