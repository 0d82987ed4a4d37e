//! Accounts migration.
//!
//! Creates the users and sessions tables. Session tokens are stored only as
//! SHA-256 hashes.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        for statement in UP_SQL {
            db.execute_unprepared(statement).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS sessions;").await?;
        db.execute_unprepared("DROP TABLE IF EXISTS users;").await?;
        Ok(())
    }
}

// Portable between PostgreSQL and SQLite: no server-side defaults, one statement each.
const UP_SQL: [&str; 4] = [
    r"
CREATE TABLE users (
    id UUID PRIMARY KEY,
    customer_xid VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
);",
    r"CREATE UNIQUE INDEX idx_users_customer_xid ON users(customer_xid);",
    r"
CREATE TABLE sessions (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    token_hash VARCHAR(64) NOT NULL,
    revoked_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL
);",
    // Token lookup is the hot path of every authenticated request
    r"CREATE INDEX idx_sessions_token_hash ON sessions(token_hash) WHERE revoked_at IS NULL;",
];
