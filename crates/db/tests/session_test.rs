//! Integration tests for the User and Session repositories.

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use uuid::Uuid;
use wallet_db::{SessionRepository, UserRepository};
use wallet_shared::types::{SessionId, UserId};

/// In-memory SQLite behind a single pooled connection.
async fn setup() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to connect to database");
    wallet_db::migrate(&db)
        .await
        .expect("Failed to run migrations");
    db
}

fn customer_xid() -> String {
    format!("customer-{}", Uuid::new_v4())
}

#[tokio::test]
async fn test_user_find_or_create_reuses_customer() {
    let db = setup().await;
    let repo = UserRepository::new(db);
    let xid = customer_xid();

    let first = repo.find_or_create(&xid).await.expect("Failed to create user");
    let second = repo.find_or_create(&xid).await.expect("Failed to find user");

    assert_eq!(first.id, second.id);
    assert_eq!(second.customer_xid, xid);

    let found = repo
        .find_by_customer_xid(&xid)
        .await
        .expect("Query should succeed")
        .expect("User should exist");
    assert_eq!(found.id, first.id);
}

#[tokio::test]
async fn test_user_create_rejects_duplicate_customer() {
    let db = setup().await;
    let repo = UserRepository::new(db);
    let xid = customer_xid();

    repo.create(&xid).await.expect("Failed to create user");
    let result = repo.create(&xid).await;

    assert!(result.is_err(), "customer_xid must be unique");
}

#[tokio::test]
async fn test_session_create_and_find_by_token() {
    let db = setup().await;
    let user = UserRepository::new(db.clone())
        .create(&customer_xid())
        .await
        .expect("Failed to create user");
    let repo = SessionRepository::new(db);

    let issued = repo
        .create(UserId::from_uuid(user.id))
        .await
        .expect("Failed to create session");

    assert_eq!(issued.session.user_id, user.id);
    assert!(issued.session.revoked_at.is_none());
    assert_eq!(
        issued.session.token_hash,
        SessionRepository::hash_token(&issued.token)
    );
    assert_ne!(issued.session.token_hash, issued.token);

    let (found, _) = repo
        .find_active_with_user(&issued.token)
        .await
        .expect("Query should succeed")
        .expect("Session should exist");
    assert_eq!(found.id, issued.session.id);
}

#[tokio::test]
async fn test_session_find_by_unknown_token() {
    let db = setup().await;
    let repo = SessionRepository::new(db);

    let result = repo
        .find_active_with_user("nonexistent_token")
        .await
        .expect("Query should succeed");

    assert!(result.is_none());
}

#[tokio::test]
async fn test_session_revoke() {
    let db = setup().await;
    let user = UserRepository::new(db.clone())
        .create(&customer_xid())
        .await
        .expect("Failed to create user");
    let user_id = UserId::from_uuid(user.id);
    let repo = SessionRepository::new(db);

    let kept = repo.create(user_id).await.expect("Failed to create session");
    let revoked = repo.create(user_id).await.expect("Failed to create session");

    let session_id = SessionId::from_uuid(revoked.session.id);
    assert!(repo.revoke(session_id).await.expect("Failed to revoke"));
    assert!(!repo.revoke(session_id).await.expect("Second revoke"));

    assert!(
        repo.find_active_with_user(&revoked.token)
            .await
            .expect("Query should succeed")
            .is_none()
    );
    assert!(
        repo.find_active_with_user(&kept.token)
            .await
            .expect("Query should succeed")
            .is_some()
    );
}

#[tokio::test]
async fn test_session_find_active_with_user() {
    let db = setup().await;
    let xid = customer_xid();
    let user = UserRepository::new(db.clone())
        .create(&xid)
        .await
        .expect("Failed to create user");
    let repo = SessionRepository::new(db);
    let issued = repo
        .create(UserId::from_uuid(user.id))
        .await
        .expect("Failed to create session");

    let (session, owner) = repo
        .find_active_with_user(&issued.token)
        .await
        .expect("Query should succeed")
        .expect("Session should exist");
    assert_eq!(session.id, issued.session.id);
    assert_eq!(owner.customer_xid, xid);

    repo.revoke(SessionId::from_uuid(session.id))
        .await
        .expect("Failed to revoke");
    assert!(
        repo.find_active_with_user(&issued.token)
            .await
            .expect("Query should succeed")
            .is_none()
    );
}
