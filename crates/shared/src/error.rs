//! Request-level errors shared by the HTTP surface.
//!
//! Ledger failures have their own types in `wallet-core`; this enum covers what
//! goes wrong before a request reaches the ledger.

use thiserror::Error;

/// Errors raised outside the ledger itself.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing, malformed or revoked session token.
    #[error("Invalid session: {0}")]
    Unauthorized(String),

    /// Request body or query could not be accepted.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Account or session storage failed.
    #[error("Database error: {0}")]
    Database(String),
}

impl AppError {
    /// HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::Validation(_) => 400,
            Self::Database(_) => 500,
        }
    }

    /// Error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}
