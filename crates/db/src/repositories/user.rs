//! User repository for database operations.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr,
};

use wallet_shared::types::UserId;

use crate::entities::users;

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by customer ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_customer_xid(
        &self,
        customer_xid: &str,
    ) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::CustomerXid.eq(customer_xid))
            .one(&self.db)
            .await
    }

    /// Creates a new user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails, including when the
    /// customer ID is already registered.
    pub async fn create(&self, customer_xid: &str) -> Result<users::Model, DbErr> {
        users::ActiveModel {
            id: Set(UserId::new().into_inner()),
            customer_xid: Set(customer_xid.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(&self.db)
        .await
    }

    /// Returns the user registered for a customer ID, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query or insert fails.
    pub async fn find_or_create(&self, customer_xid: &str) -> Result<users::Model, DbErr> {
        if let Some(user) = self.find_by_customer_xid(customer_xid).await? {
            return Ok(user);
        }

        match self.create(customer_xid).await {
            Ok(user) => Ok(user),
            // Lost a registration race; the winner's row is now visible.
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                self.find_by_customer_xid(customer_xid)
                    .await?
                    .ok_or(err)
            }
            Err(err) => Err(err),
        }
    }
}
