//! Account registration and session routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use wallet_db::{SessionRepository, UserRepository};
use wallet_shared::types::UserId;

use crate::{
    AppState, error::ApiError, extractors::FormOrJson, middleware::AuthUser, response::success,
};

/// Creates the public account routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/init", post(init_account))
}

/// Creates the account routes that need a session.
pub fn session_routes() -> Router<AppState> {
    Router::new().route("/logout", post(logout))
}

/// Request body for account initialization.
#[derive(Debug, Deserialize)]
pub struct InitAccountRequest {
    /// External customer ID.
    #[serde(default)]
    pub customer_xid: String,
}

/// POST `/init` - Register a customer (or reuse the registration) and issue a session token.
async fn init_account(
    State(state): State<AppState>,
    FormOrJson(body): FormOrJson<InitAccountRequest>,
) -> Result<Response, ApiError> {
    let customer_xid = body.customer_xid.trim();
    if customer_xid.is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "status": "fail",
                "data": { "error": { "customer_xid": ["Missing data for required field."] } }
            })),
        )
            .into_response());
    }

    let user = UserRepository::new((*state.db).clone())
        .find_or_create(customer_xid)
        .await?;
    let issued = SessionRepository::new((*state.db).clone())
        .create(UserId::from_uuid(user.id))
        .await?;

    info!(user_id = %user.id, session_id = %issued.session.id, "Session issued");
    Ok(success(
        StatusCode::CREATED,
        json!({ "token": issued.token }),
    ))
}

/// POST `/logout` - Revoke the session the request was made with.
async fn logout(State(state): State<AppState>, auth: AuthUser) -> Result<Response, ApiError> {
    let revoked = SessionRepository::new((*state.db).clone())
        .revoke(auth.session_id)
        .await?;

    info!(user_id = %auth.user_id, session_id = %auth.session_id, revoked, "Session revoked");
    Ok(success(StatusCode::OK, json!({ "revoked": revoked })))
}
