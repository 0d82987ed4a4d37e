//! Wallet repository: the durable [`LedgerStore`].
//!
//! Every balance change runs inside one `SeaORM` database transaction that
//! claims the wallet row, re-validates the planned change, overwrites the
//! balance and appends the ledger entry. A failure at any step rolls the whole
//! unit back.
//!
//! The claim is a no-op `UPDATE` issued as the first statement. On PostgreSQL
//! it takes the row lock; on SQLite it takes the database write lock before
//! anything is read, so a second writer waits on the busy timeout instead of
//! failing to upgrade a read transaction. Lock contention that still escapes
//! (busy timeout, serialization failure, deadlock) is reported as
//! [`StoreError::ConcurrentModification`].

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, RuntimeErr, Set, SqlErr, TransactionTrait, prelude::DateTimeWithTimeZone,
    sea_query::Expr, sqlx,
};
use tracing::{debug, warn};

use wallet_core::wallet::{
    BalanceChange, LedgerStore, StoreError, TransactionDirection, Wallet, WalletStatus,
    WalletTransaction,
};
use wallet_shared::types::{PageRequest, UserId, WalletId, WalletTransactionId};

use crate::entities::{enums, wallet_transactions, wallets};

/// Wallet repository backed by a `SeaORM` connection.
#[derive(Debug, Clone)]
pub struct WalletRepository {
    db: DatabaseConnection,
}

impl WalletRepository {
    /// Creates a new wallet repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Runs the checks and writes of a balance change on an open transaction.
    async fn apply_in(
        txn: &DatabaseTransaction,
        change: &BalanceChange,
    ) -> Result<WalletTransaction, StoreError> {
        let claimed = wallets::Entity::update_many()
            .col_expr(wallets::Column::UpdatedAt, Expr::col(wallets::Column::UpdatedAt).into())
            .filter(wallets::Column::Id.eq(change.wallet_id.into_inner()))
            .exec(txn)
            .await
            .map_err(|err| store_error(change, err))?;
        if claimed.rows_affected == 0 {
            return Err(StoreError::WalletNotFound(change.wallet_id));
        }

        let wallet = wallets::Entity::find_by_id(change.wallet_id.into_inner())
            .one(txn)
            .await
            .map_err(|err| store_error(change, err))?
            .ok_or(StoreError::WalletNotFound(change.wallet_id))?;

        let direction = enums::TransactionDirection::from(change.direction);
        let applied = wallet_transactions::Entity::find()
            .filter(wallet_transactions::Column::ReferenceId.eq(change.reference_id.as_str()))
            .filter(wallet_transactions::Column::Direction.eq(direction))
            .one(txn)
            .await
            .map_err(|err| store_error(change, err))?;
        if applied.is_some() {
            return Err(duplicate_reference(change));
        }

        if wallet.status != enums::WalletStatus::Active
            || wallet.balance != change.expected_balance
        {
            return Err(StoreError::ConcurrentModification(change.wallet_id));
        }
        if change.new_balance < 0 {
            return Err(StoreError::InvariantViolation(format!(
                "balance of wallet {} would become {}",
                change.wallet_id, change.new_balance
            )));
        }

        let now: DateTimeWithTimeZone = Utc::now().into();

        // Compare-and-set on the balance, so a backend without row locks still
        // cannot overwrite a newer value.
        let updated = wallets::Entity::update_many()
            .col_expr(wallets::Column::Balance, Expr::value(change.new_balance))
            .col_expr(wallets::Column::UpdatedAt, Expr::value(now))
            .filter(wallets::Column::Id.eq(wallet.id))
            .filter(wallets::Column::Balance.eq(change.expected_balance))
            .exec(txn)
            .await
            .map_err(|err| store_error(change, err))?;
        if updated.rows_affected != 1 {
            return Err(StoreError::ConcurrentModification(change.wallet_id));
        }

        let entry = wallet_transactions::ActiveModel {
            id: Set(WalletTransactionId::new().into_inner()),
            wallet_id: Set(wallet.id),
            direction: Set(direction),
            amount: Set(change.amount),
            reference_id: Set(change.reference_id.clone()),
            created_at: Set(now),
        }
        .insert(txn)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                duplicate_reference(change)
            } else {
                store_error(change, err)
            }
        })?;

        Ok(to_transaction(entry))
    }
}

impl LedgerStore for WalletRepository {
    async fn get_wallet(&self, owner_id: UserId) -> Result<Option<Wallet>, StoreError> {
        let model = wallets::Entity::find()
            .filter(wallets::Column::OwnerId.eq(owner_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(database_error)?;
        Ok(model.map(to_wallet))
    }

    async fn create_wallet(
        &self,
        owner_id: UserId,
        initial_balance: i64,
    ) -> Result<Wallet, StoreError> {
        if initial_balance < 0 {
            return Err(StoreError::InvariantViolation(format!(
                "initial balance {initial_balance} is negative"
            )));
        }

        let now: DateTimeWithTimeZone = Utc::now().into();
        let wallet = wallets::ActiveModel {
            id: Set(WalletId::new().into_inner()),
            owner_id: Set(owner_id.into_inner()),
            balance: Set(initial_balance),
            status: Set(enums::WalletStatus::Active),
            status_changed_at: Set(now),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = wallet.insert(&self.db).await.map_err(|err| {
            if is_unique_violation(&err) {
                StoreError::WalletExists(owner_id)
            } else {
                database_error(err)
            }
        })?;

        debug!(wallet_id = %model.id, %owner_id, "Wallet row created");
        Ok(to_wallet(model))
    }

    async fn set_wallet_status(
        &self,
        wallet_id: WalletId,
        status: WalletStatus,
    ) -> Result<Wallet, StoreError> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let wallet = wallets::ActiveModel {
            id: Unchanged(wallet_id.into_inner()),
            status: Set(status.into()),
            status_changed_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        match wallet.update(&self.db).await {
            Ok(model) => Ok(to_wallet(model)),
            Err(DbErr::RecordNotUpdated) => Err(StoreError::WalletNotFound(wallet_id)),
            Err(err) => Err(database_error(err)),
        }
    }

    async fn find_transaction_by_reference(
        &self,
        reference_id: &str,
        direction: TransactionDirection,
    ) -> Result<Option<WalletTransaction>, StoreError> {
        let model = wallet_transactions::Entity::find()
            .filter(wallet_transactions::Column::ReferenceId.eq(reference_id))
            .filter(
                wallet_transactions::Column::Direction
                    .eq(enums::TransactionDirection::from(direction)),
            )
            .one(&self.db)
            .await
            .map_err(database_error)?;
        Ok(model.map(to_transaction))
    }

    async fn apply_balance_change(
        &self,
        change: BalanceChange,
    ) -> Result<WalletTransaction, StoreError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|err| store_error(&change, err))?;

        match Self::apply_in(&txn, &change).await {
            Ok(transaction) => {
                txn.commit().await.map_err(|err| store_error(&change, err))?;
                debug!(
                    wallet_id = %change.wallet_id,
                    transaction_id = %transaction.id,
                    new_balance = change.new_balance,
                    "Balance change committed"
                );
                Ok(transaction)
            }
            Err(err) => {
                if let Err(rollback) = txn.rollback().await {
                    warn!(error = %rollback, wallet_id = %change.wallet_id, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    async fn list_transactions(
        &self,
        wallet_id: WalletId,
        page: PageRequest,
    ) -> Result<(Vec<WalletTransaction>, u64), StoreError> {
        let query = wallet_transactions::Entity::find()
            .filter(wallet_transactions::Column::WalletId.eq(wallet_id.into_inner()));

        let total = query
            .clone()
            .count(&self.db)
            .await
            .map_err(database_error)?;

        let rows = query
            .order_by_desc(wallet_transactions::Column::CreatedAt)
            .order_by_desc(wallet_transactions::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(database_error)?;

        Ok((rows.into_iter().map(to_transaction).collect(), total))
    }
}

fn to_wallet(model: wallets::Model) -> Wallet {
    Wallet {
        id: WalletId::from_uuid(model.id),
        owner_id: UserId::from_uuid(model.owner_id),
        balance: model.balance,
        status: model.status.into(),
        status_changed_at: model.status_changed_at.with_timezone(&Utc),
    }
}

fn to_transaction(model: wallet_transactions::Model) -> WalletTransaction {
    WalletTransaction {
        id: WalletTransactionId::from_uuid(model.id),
        wallet_id: WalletId::from_uuid(model.wallet_id),
        direction: model.direction.into(),
        amount: model.amount,
        reference_id: model.reference_id,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn duplicate_reference(change: &BalanceChange) -> StoreError {
    StoreError::DuplicateReference {
        reference_id: change.reference_id.clone(),
        direction: change.direction,
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// SQLite `BUSY`/`LOCKED` (primary codes 5 and 6) and PostgreSQL
/// serialization failures or deadlocks.
fn is_lock_contention(err: &DbErr) -> bool {
    let (DbErr::Conn(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))
    | DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))
    | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))) = err
    else {
        return false;
    };
    let Some(code) = db_err.code() else {
        return false;
    };
    if db_err
        .try_downcast_ref::<sqlx::sqlite::SqliteError>()
        .is_some()
    {
        // Extended result codes keep the primary code in the low byte.
        code.parse::<i32>()
            .is_ok_and(|extended| matches!(extended & 0xff, 5 | 6))
    } else {
        matches!(&*code, "40001" | "40P01")
    }
}

/// Maps a failure inside the balance-change unit.
fn store_error(change: &BalanceChange, err: DbErr) -> StoreError {
    if is_lock_contention(&err) {
        debug!(wallet_id = %change.wallet_id, error = %err, "Wallet write lock contended");
        StoreError::ConcurrentModification(change.wallet_id)
    } else {
        database_error(err)
    }
}

#[allow(clippy::needless_pass_by_value)]
fn database_error(err: DbErr) -> StoreError {
    StoreError::Database(err.to_string())
}
