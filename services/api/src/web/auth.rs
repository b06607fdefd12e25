//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, logout, and the current identity.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use food_share_core::domain::{is_valid_email, Identity, MIN_PASSWORD_LEN};
use food_share_core::{AuthFailure, PortError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ErrorBody, HttpError};
use crate::web::middleware::{session_token, SESSION_COOKIE};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: String,
    /// Bearer token for the `Authorization` header; also set as the session cookie.
    pub token: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct IdentityResponse {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl From<Identity> for IdentityResponse {
    fn from(identity: Identity) -> Self {
        Self {
            user_id: identity.user_id,
            email: identity.email,
            display_name: identity.display_name,
        }
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Creates an auth session for `user_id` and returns its token with the matching cookie.
async fn issue_session(state: &AppState, user_id: Uuid) -> Result<(String, String), HttpError> {
    let token = Uuid::new_v4().to_string();
    let ttl = Duration::days(state.config.session_ttl_days);
    let expires_at = Utc::now() + ttl;

    state
        .accounts
        .create_auth_session(&token, user_id, expires_at)
        .await
        .map_err(|e| {
            error!("Failed to create auth session: {:?}", e);
            HttpError::internal("Failed to create session")
        })?;

    let cookie = format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        token,
        ttl.num_seconds()
    );
    Ok((token, cookie))
}

fn hash_password(password: &str) -> Result<String, HttpError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            HttpError::internal("Failed to hash password")
        })
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Badly formatted email or weak password", body = ErrorBody),
        (status = 409, description = "Email already in use", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let email = req.email.trim();
    if !is_valid_email(email) {
        return Err(AuthFailure::InvalidEmail.into());
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AuthFailure::WeakPassword.into());
    }

    let password_hash = hash_password(&req.password)?;

    let identity = state
        .accounts
        .create_account(email, &password_hash)
        .await
        .map_err(|e| match e {
            PortError::Conflict(_) => HttpError::from(AuthFailure::EmailInUse),
            other => {
                error!("Failed to create user: {:?}", other);
                HttpError::internal("Failed to create user")
            }
        })?;

    let (token, cookie) = issue_session(&state, identity.user_id).await?;
    info!(user_id = %identity.user_id, "Account created");

    let response = AuthResponse {
        user_id: identity.user_id,
        email: identity.email.unwrap_or_default(),
        token,
    };
    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(response),
    ))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Badly formatted email", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 403, description = "Account disabled", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let email = req.email.trim();
    if !is_valid_email(email) {
        return Err(AuthFailure::InvalidEmail.into());
    }

    // 1. Get user by email
    let user_creds = state
        .accounts
        .get_credentials_by_email(email)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => HttpError::from(AuthFailure::InvalidCredentials),
            other => {
                error!("Failed to get user: {:?}", other);
                HttpError::from(AuthFailure::Other(other.to_string()))
            }
        })?;

    // 2. Verify password
    let parsed_hash = PasswordHash::new(&user_creds.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        HttpError::internal("Authentication error")
    })?;
    let valid = Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_ok();
    if !valid {
        return Err(AuthFailure::InvalidCredentials.into());
    }
    if user_creds.disabled {
        return Err(AuthFailure::UserDisabled.into());
    }

    // 3. Issue the session
    let (token, cookie) = issue_session(&state, user_creds.user_id).await?;
    info!(user_id = %user_creds.user_id, "Signed in");

    let response = AuthResponse {
        user_id: user_creds.user_id,
        email: user_creds.email,
        token,
    };
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(response)))
}

/// POST /auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session", body = ErrorBody)
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpError> {
    let token = session_token(&headers).ok_or_else(HttpError::unauthorized)?;

    state.accounts.delete_auth_session(token).await.map_err(|e| {
        error!("Failed to delete auth session: {:?}", e);
        HttpError::internal("Failed to logout")
    })?;

    let cookie = format!(
        "{}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0",
        SESSION_COOKIE
    );
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)]))
}

/// GET /auth/me - The identity behind the current token
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current identity", body = IdentityResponse),
        (status = 401, description = "No active session", body = ErrorBody)
    )
)]
pub async fn me_handler(Extension(identity): Extension<Identity>) -> Json<IdentityResponse> {
    Json(identity.into())
}
