//! Session token middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

use wallet_db::SessionRepository;
use wallet_shared::types::{SessionId, UserId};

use crate::{AppState, error::ApiError};

/// Extracts the session token from an `Authorization: Token <token>` header.
///
/// The scheme is case-insensitive and the header must hold exactly two fields.
fn extract_session_token(header: &str) -> Option<&str> {
    let mut fields = header.split_whitespace();
    let scheme = fields.next()?;
    let token = fields.next()?;
    if fields.next().is_some() || !scheme.eq_ignore_ascii_case("token") {
        return None;
    }
    Some(token)
}

/// Authentication middleware that resolves session tokens.
///
/// This middleware:
/// 1. Extracts the token from the Authorization header
/// 2. Looks up the active session by the token's hash
/// 3. Stores the [`AuthUser`] in request extensions for handlers to access
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_session_token);

    let Some(token) = token else {
        return ApiError::unauthorized("Authorization header with Token scheme is required")
            .into_response();
    };

    let sessions = SessionRepository::new((*state.db).clone());
    match sessions.find_active_with_user(token).await {
        Ok(Some((session, user))) => {
            let auth = AuthUser {
                user_id: UserId::from_uuid(user.id),
                session_id: SessionId::from_uuid(session.id),
                customer_xid: user.customer_xid,
            };
            debug!(user_id = %auth.user_id, "Session resolved");
            request.extensions_mut().insert(auth);
            next.run(request).await
        }
        Ok(None) => ApiError::unauthorized("Authorization failed").into_response(),
        Err(e) => {
            error!(error = %e, "Failed to look up session");
            ApiError::from(e).into_response()
        }
    }
}

/// The authenticated caller.
///
/// Use this in handlers behind [`auth_middleware`]:
///
/// ```ignore
/// async fn handler(auth: AuthUser) -> impl IntoResponse {
///     let user_id = auth.user_id;
///     // ...
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Internal user ID.
    pub user_id: UserId,
    /// The session the request was authenticated with.
    pub session_id: SessionId,
    /// External customer ID the account was registered with.
    pub customer_xid: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Token abc123", Some("abc123"))]
    #[case("token abc123", Some("abc123"))]
    #[case("TOKEN   abc123", Some("abc123"))]
    #[case("Bearer abc123", None)]
    #[case("Token", None)]
    #[case("Token abc 123", None)]
    #[case("", None)]
    fn test_extract_session_token(#[case] header: &str, #[case] expected: Option<&str>) {
        assert_eq!(extract_session_token(header), expected);
    }
}
