//! End-to-end tests of the HTTP surface over SQLite.

use axum::{
    Router,
    body::Body,
    http::{
        Method, Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
};
use futures::future::join_all;
use http_body_util::BodyExt;
use sea_orm::{ConnectOptions, Database};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;
use wallet_api::{AppState, create_router};
use wallet_shared::config::DatabaseConfig;

async fn app() -> Router {
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
    create_router(AppState::new(db, 0))
}

/// Router over a file database behind a multi-connection pool.
async fn pooled_app(path: &std::path::Path) -> Router {
    let config = DatabaseConfig {
        url: format!("sqlite://{}?mode=rwc", path.display()),
        max_connections: 5,
        min_connections: 1,
        run_migrations: true,
    };
    let db = wallet_db::connect(&config)
        .await
        .expect("Failed to connect to database");
    wallet_db::migrate(&db)
        .await
        .expect("Failed to run migrations");
    create_router(AppState::new(db, 0))
}

fn form(method: Method, uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Token {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

fn json(method: Method, uri: &str, token: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Token {token}"))
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body is readable")
        .to_bytes();
    let body = serde_json::from_slice(&bytes).expect("body is JSON");
    (status, body)
}

async fn init(app: &Router, customer_xid: &str) -> String {
    let (status, body) = send(
        app,
        form(
            Method::POST,
            "/api/v1/init",
            None,
            &format!("customer_xid={customer_xid}"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["status"], "success");
    body["data"]["token"]
        .as_str()
        .expect("token is a string")
        .to_string()
}

#[tokio::test]
async fn test_health() {
    let app = app().await;

    let (status, body) = send(&app, form(Method::GET, "/api/v1/health", None, "")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["database"], true);
}

#[tokio::test]
async fn test_init_requires_customer_xid() {
    let app = app().await;

    let (status, body) = send(&app, form(Method::POST, "/api/v1/init", None, "")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");
    assert_eq!(
        body["data"]["error"]["customer_xid"][0],
        "Missing data for required field."
    );
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = app().await;

    let (status, body) = send(&app, form(Method::GET, "/api/v1/wallet", None, "")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "fail");

    let (status, _) = send(
        &app,
        form(Method::GET, "/api/v1/wallet", Some("not-a-session"), ""),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_view_before_enable_is_not_found() {
    let app = app().await;
    let token = init(&app, "cust-view").await;

    let (status, body) = send(&app, form(Method::GET, "/api/v1/wallet", Some(&token), "")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["error"], "Disabled");
}

#[tokio::test]
async fn test_wallet_lifecycle() {
    let app = app().await;
    let token = init(&app, "cust-flow").await;
    let auth = Some(token.as_str());

    // Enable
    let (status, body) = send(&app, form(Method::POST, "/api/v1/wallet", auth, "")).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["wallet"]["status"], "enabled");
    assert_eq!(body["data"]["wallet"]["owned_by"], "cust-flow");
    assert_eq!(body["data"]["wallet"]["balance"], 0);
    assert!(body["data"]["wallet"]["enabled_at"].is_string());

    let (status, body) = send(&app, form(Method::POST, "/api/v1/wallet", auth, "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["error"], "Already enabled");

    // Deposits, form and JSON
    let (status, body) = send(
        &app,
        form(
            Method::POST,
            "/api/v1/wallet/deposits",
            auth,
            "amount=100&reference_id=ref-a",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["deposit"]["amount"], 100);
    assert_eq!(body["data"]["deposit"]["reference_id"], "ref-a");
    assert_eq!(body["data"]["deposit"]["deposited_by"], "cust-flow");
    assert_eq!(body["data"]["deposit"]["status"], "success");

    let (status, _) = send(
        &app,
        json(
            Method::POST,
            "/api/v1/wallet/deposits",
            &token,
            &serde_json::json!({ "amount": 50, "reference_id": "ref-b" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Duplicate reference
    let (status, body) = send(
        &app,
        form(
            Method::POST,
            "/api/v1/wallet/deposits",
            auth,
            "amount=100&reference_id=ref-a",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["data"]["code"], "DUPLICATE_REFERENCE");

    // Withdrawals
    let (status, body) = send(
        &app,
        form(
            Method::POST,
            "/api/v1/wallet/withdrawals",
            auth,
            "amount=500&reference_id=ref-c",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["data"]["code"], "INSUFFICIENT_BALANCE");

    let (status, body) = send(
        &app,
        form(
            Method::POST,
            "/api/v1/wallet/withdrawals",
            auth,
            "amount=60&reference_id=ref-a",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["withdrawal"]["withdrawn_by"], "cust-flow");

    // Balance and history
    let (status, body) = send(&app, form(Method::GET, "/api/v1/wallet", auth, "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["wallet"]["balance"], 90);

    let (status, body) = send(
        &app,
        form(
            Method::GET,
            "/api/v1/wallet/transactions?page=1&per_page=2",
            auth,
            "",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["meta"]["total"], 3);
    assert_eq!(body["data"]["meta"]["total_pages"], 2);
    assert_eq!(body["data"]["transactions"][0]["type"], "withdrawal");
    assert_eq!(body["data"]["transactions"][0]["amount"], 60);

    // Disable
    let (status, body) = send(&app, form(Method::PATCH, "/api/v1/wallet", auth, "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["wallet"]["status"], "disabled");
    assert_eq!(body["data"]["wallet"]["balance"], 90);
    assert!(body["data"]["wallet"]["disabled_at"].is_string());

    let (status, body) = send(&app, form(Method::GET, "/api/v1/wallet", auth, "")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["error"], "Disabled");

    let (status, body) = send(
        &app,
        form(
            Method::POST,
            "/api/v1/wallet/deposits",
            auth,
            "amount=10&reference_id=ref-d",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["error"], "Wallet disabled");

    let (status, body) = send(&app, form(Method::PATCH, "/api/v1/wallet", auth, "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["error"], "Already disabled");

    // Re-enable keeps the balance
    let (status, body) = send(&app, form(Method::POST, "/api/v1/wallet", auth, "")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["wallet"]["balance"], 90);
}

#[tokio::test]
async fn test_invalid_amounts_rejected() {
    let app = app().await;
    let token = init(&app, "cust-invalid").await;
    let auth = Some(token.as_str());
    send(&app, form(Method::POST, "/api/v1/wallet", auth, "")).await;

    let (status, body) = send(
        &app,
        form(
            Method::POST,
            "/api/v1/wallet/deposits",
            auth,
            "amount=0&reference_id=ref-zero",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["code"], "INVALID_AMOUNT");

    let (status, body) = send(
        &app,
        form(
            Method::POST,
            "/api/v1/wallet/deposits",
            auth,
            "amount=lots&reference_id=ref-text",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["code"], "VALIDATION_ERROR");

    let (status, body) = send(
        &app,
        form(Method::POST, "/api/v1/wallet/deposits", auth, "amount=10"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["code"], "MISSING_REFERENCE");
}

#[tokio::test]
async fn test_init_reuses_account_for_customer() {
    let app = app().await;
    let first = init(&app, "cust-repeat").await;
    let second = init(&app, "cust-repeat").await;
    assert_ne!(first, second);

    let (status, _) = send(&app, form(Method::POST, "/api/v1/wallet", Some(&first), "")).await;
    assert_eq!(status, StatusCode::CREATED);

    // The second session belongs to the same user, so the wallet is already enabled.
    let (status, body) = send(&app, form(Method::POST, "/api/v1/wallet", Some(&second), "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["error"], "Already enabled");
}

#[tokio::test]
async fn test_logout_revokes_only_the_calling_session() {
    let app = app().await;
    let first = init(&app, "cust-logout").await;
    let second = init(&app, "cust-logout").await;

    let (status, body) = send(&app, form(Method::POST, "/api/v1/logout", Some(&first), "")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["revoked"], true);

    let (status, _) = send(&app, form(Method::GET, "/api/v1/wallet", Some(&first), "")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, form(Method::POST, "/api/v1/logout", Some(&first), "")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The other session of the same customer still authenticates.
    let (status, body) = send(&app, form(Method::GET, "/api/v1/wallet", Some(&second), "")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["error"], "Disabled");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deposits_on_pooled_database_never_fail_server_side() {
    let path = std::env::temp_dir().join(format!("wallet-router-{}.db", Uuid::new_v4()));
    let app = pooled_app(&path).await;
    let token = init(&app, "cust-pooled").await;
    let (status, _) = send(&app, form(Method::POST, "/api/v1/wallet", Some(&token), "")).await;
    assert_eq!(status, StatusCode::CREATED);

    let same_reference = (0..8).map(|_| {
        let app = app.clone();
        let token = token.clone();
        tokio::spawn(async move {
            send(
                &app,
                form(
                    Method::POST,
                    "/api/v1/wallet/deposits",
                    Some(&token),
                    "amount=10&reference_id=pooled-same",
                ),
            )
            .await
        })
    });
    let responses: Vec<_> = join_all(same_reference)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    let created = responses
        .iter()
        .filter(|(status, _)| *status == StatusCode::CREATED)
        .count();
    assert_eq!(created, 1, "{responses:?}");
    for (status, body) in &responses {
        assert!(!status.is_server_error(), "{status}: {body}");
        if *status != StatusCode::CREATED {
            assert_eq!(*status, StatusCode::CONFLICT, "{body}");
            assert_eq!(body["data"]["code"], "DUPLICATE_REFERENCE");
        }
    }

    let distinct = (0..8).map(|n| {
        let app = app.clone();
        let token = token.clone();
        tokio::spawn(async move {
            send(
                &app,
                form(
                    Method::POST,
                    "/api/v1/wallet/deposits",
                    Some(&token),
                    &format!("amount=10&reference_id=pooled-{n}"),
                ),
            )
            .await
        })
    });
    for joined in join_all(distinct).await {
        let (status, body) = joined.expect("task panicked");
        // A writer that stays stale past the retry budget gets a 409 to resubmit.
        assert!(
            status == StatusCode::CREATED || status == StatusCode::CONFLICT,
            "{status}: {body}"
        );
    }

    drop(app);
    for suffix in ["", "-journal", "-wal", "-shm"] {
        let mut file = path.clone().into_os_string();
        file.push(suffix);
        let _ = std::fs::remove_file(file);
    }
}
