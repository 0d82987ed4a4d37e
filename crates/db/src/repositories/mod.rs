//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod session;
pub mod user;
pub mod wallet;

pub use session::SessionRepository;
pub use user::UserRepository;
pub use wallet::WalletRepository;
