//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - Session token middleware
//! - Request extractors
//! - The `success`/`fail` response envelope

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use wallet_core::wallet::WalletService;
use wallet_db::WalletRepository;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Wallet service over the database ledger store.
    pub wallets: Arc<WalletService<WalletRepository>>,
}

impl AppState {
    /// Builds the state from a connection and the balance new wallets open with.
    #[must_use]
    pub fn new(db: DatabaseConnection, default_balance: i64) -> Self {
        let store = Arc::new(WalletRepository::new(db.clone()));
        Self {
            db: Arc::new(db),
            wallets: Arc::new(WalletService::new(store, default_balance)),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
