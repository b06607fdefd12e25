//! services/api/src/web/profiles.rs
//!
//! Profile endpoints: each user records their role once, right after signing up.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use food_share_core::domain::{GeoPoint, Identity, Role, UserProfile};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ErrorBody, HttpError};
use crate::web::rest::GeoPointBody;
use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
pub struct CreateProfileRequest {
    #[schema(value_type = String, example = "donor")]
    pub role: Role,
    pub display_name: String,
    pub location: Option<GeoPointBody>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub user_id: Uuid,
    pub email: String,
    #[schema(value_type = String, example = "ngo")]
    pub role: Role,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub location: Option<GeoPointBody>,
}

impl From<UserProfile> for ProfileResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            user_id: profile.user_id,
            email: profile.email,
            role: profile.role,
            display_name: profile.display_name,
            created_at: profile.created_at,
            location: profile.location.map(GeoPointBody::from),
        }
    }
}

/// POST /profiles - Record the caller's role and display name
#[utoipa::path(
    post,
    path = "/profiles",
    request_body = CreateProfileRequest,
    responses(
        (status = 201, description = "Profile created", body = ProfileResponse),
        (status = 400, description = "Missing display name or bad location", body = ErrorBody),
        (status = 409, description = "Profile already exists", body = ErrorBody)
    )
)]
pub async fn create_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateProfileRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let display_name = req.display_name.trim();
    if display_name.is_empty() {
        return Err(HttpError::bad_request("display_name is required"));
    }
    let location = req.location.map(GeoPoint::from);
    if location.is_some_and(|l| !l.is_valid()) {
        return Err(HttpError::bad_request("location is out of range"));
    }

    let profile = UserProfile {
        user_id: identity.user_id,
        email: identity.email.unwrap_or_default(),
        role: req.role,
        display_name: display_name.to_string(),
        created_at: Utc::now(),
        location,
    };
    state.profiles.create_profile(profile.clone()).await?;
    info!(user_id = %profile.user_id, role = %profile.role, "Profile created");

    Ok((StatusCode::CREATED, Json(ProfileResponse::from(profile))))
}

/// GET /profiles/{user_id} - Read a profile
#[utoipa::path(
    get,
    path = "/profiles/{user_id}",
    params(("user_id" = Uuid, Path, description = "The user whose profile to read.")),
    responses(
        (status = 200, description = "The profile", body = ProfileResponse),
        (status = 404, description = "No profile for this user", body = ErrorBody)
    )
)]
pub async fn get_profile_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ProfileResponse>, HttpError> {
    let profile = state.profiles.get_profile(user_id).await?;
    Ok(Json(profile.into()))
}
