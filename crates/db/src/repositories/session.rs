//! Session repository for database operations.
//!
//! A session token is shown to the client once; only its SHA-256 hash is stored.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    prelude::DateTimeWithTimeZone, sea_query::Expr,
};
use sha2::{Digest, Sha256};

use wallet_shared::types::{SessionId, UserId};

use crate::entities::{sessions, users};

/// Number of random bytes in a session token.
pub const TOKEN_BYTES: usize = 32;

/// A freshly issued session and its plaintext token.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// Bearer token for the `Authorization: Token <token>` header.
    pub token: String,
    /// The stored session row.
    pub session: sessions::Model,
}

/// Session repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    db: DatabaseConnection,
}

impl SessionRepository {
    /// Creates a new session repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Hashes a session token for storage.
    #[must_use]
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Generates a random URL-safe token.
    #[must_use]
    pub fn generate_token() -> String {
        let bytes: [u8; TOKEN_BYTES] = rand::random();
        base64_url::encode(&bytes)
    }

    /// Issues a new session for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, user_id: UserId) -> Result<IssuedSession, DbErr> {
        let token = Self::generate_token();
        let now: DateTimeWithTimeZone = chrono::Utc::now().into();

        let session = sessions::ActiveModel {
            id: Set(SessionId::new().into_inner()),
            user_id: Set(user_id.into_inner()),
            token_hash: Set(Self::hash_token(&token)),
            revoked_at: Set(None),
            created_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        Ok(IssuedSession { token, session })
    }

    /// Finds the active session a token belongs to, together with its user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_active_with_user(
        &self,
        token: &str,
    ) -> Result<Option<(sessions::Model, users::Model)>, DbErr> {
        let found = sessions::Entity::find()
            .filter(sessions::Column::TokenHash.eq(Self::hash_token(token)))
            .filter(sessions::Column::RevokedAt.is_null())
            .find_also_related(users::Entity)
            .one(&self.db)
            .await?;

        Ok(found.and_then(|(session, user)| user.map(|user| (session, user))))
    }

    /// Revokes a session.
    ///
    /// Returns false if the session does not exist or was already revoked.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn revoke(&self, id: SessionId) -> Result<bool, DbErr> {
        let now: DateTimeWithTimeZone = chrono::Utc::now().into();

        let result = sessions::Entity::update_many()
            .col_expr(sessions::Column::RevokedAt, Expr::value(now))
            .filter(sessions::Column::Id.eq(id.into_inner()))
            .filter(sessions::Column::RevokedAt.is_null())
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }
}
