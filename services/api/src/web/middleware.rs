//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use food_share_core::{resolve_session, Actor};
use std::sync::Arc;
use tracing::{error, warn};

use crate::error::HttpError;
use crate::web::state::AppState;

/// Name of the cookie carrying the auth token.
pub const SESSION_COOKIE: &str = "session";

/// Finds the auth token in an `Authorization: Bearer` header, falling back to
/// the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|c| {
                c.trim()
                    .strip_prefix(SESSION_COOKIE)
                    .and_then(|rest| rest.strip_prefix('='))
            })
        })
        .filter(|t| !t.is_empty())
}

/// Middleware that validates the auth token and resolves the caller.
///
/// If valid, inserts the caller's `Identity` and `Actor` into request
/// extensions for handlers to use. If invalid or missing, returns 401.
/// A caller whose profile cannot be read still passes, with no role.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = session_token(req.headers()).map(str::to_string) else {
        return HttpError::unauthorized().into_response();
    };

    let user_id = match state.accounts.validate_auth_session(&token).await {
        Ok(user_id) => user_id,
        Err(e) => {
            warn!("Rejected auth token: {}", e);
            return HttpError::unauthorized().into_response();
        }
    };

    let identity = match state.accounts.get_identity(user_id).await {
        Ok(identity) => identity,
        Err(e) => {
            error!("Failed to load identity for user {}: {:?}", user_id, e);
            return HttpError::unauthorized().into_response();
        }
    };

    let session = resolve_session(state.profiles.as_ref(), identity).await;
    let actor = Actor::from(&session);
    req.extensions_mut().insert(session.identity);
    req.extensions_mut().insert(actor);

    next.run(req).await
}
