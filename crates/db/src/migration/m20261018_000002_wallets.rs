//! Wallets migration.
//!
//! Creates the wallets table and the append-only wallet_transactions ledger.
//! The database enforces the ledger invariants as a second line behind the
//! store's own checks: non-negative balances, positive amounts, one wallet
//! per owner and one entry per (reference_id, direction).

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
        db.execute_unprepared("DROP TABLE IF EXISTS wallet_transactions;")
            .await?;
        db.execute_unprepared("DROP TABLE IF EXISTS wallets;").await?;
        Ok(())
    }
}

const UP_SQL: [&str; 5] = [
    r"
CREATE TABLE wallets (
    id UUID PRIMARY KEY,
    owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    balance BIGINT NOT NULL,
    status VARCHAR(16) NOT NULL,
    status_changed_at TIMESTAMPTZ NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT chk_wallets_balance_non_negative CHECK (balance >= 0),
    CONSTRAINT chk_wallets_status CHECK (status IN ('active', 'inactive'))
);",
    r"CREATE UNIQUE INDEX idx_wallets_owner ON wallets(owner_id);",
    r"
CREATE TABLE wallet_transactions (
    id UUID PRIMARY KEY,
    wallet_id UUID NOT NULL REFERENCES wallets(id) ON DELETE CASCADE,
    direction VARCHAR(16) NOT NULL,
    amount BIGINT NOT NULL,
    reference_id VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT chk_wallet_transactions_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_wallet_transactions_direction CHECK (direction IN ('deposit', 'withdrawal'))
);",
    r"CREATE UNIQUE INDEX idx_wallet_transactions_reference ON wallet_transactions(reference_id, direction);",
    r"CREATE INDEX idx_wallet_transactions_wallet ON wallet_transactions(wallet_id, created_at DESC);",
];
