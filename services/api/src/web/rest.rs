//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the donation and media endpoints and the
//! master definition for the OpenAPI specification.

use crate::error::{ErrorBody, HttpError};
use crate::web::{auth, profiles, state::AppState};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use food_share_core::domain::{Donation, DonationDraft, DonationStatus, GeoPoint};
use food_share_core::Actor;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
        profiles::create_profile_handler,
        profiles::get_profile_handler,
        list_donations_handler,
        create_donation_handler,
        get_donation_handler,
        accept_donation_handler,
        delete_donation_handler,
        upload_media_handler,
    ),
    components(
        schemas(
            ErrorBody,
            auth::SignupRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            auth::IdentityResponse,
            profiles::CreateProfileRequest,
            profiles::ProfileResponse,
            GeoPointBody,
            DonationResponse,
            CreateDonationRequest,
            UploadResponse,
        )
    ),
    tags(
        (name = "FoodShare API", description = "Surplus food listings for donors and NGOs.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct GeoPointBody {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<GeoPoint> for GeoPointBody {
    fn from(point: GeoPoint) -> Self {
        Self {
            latitude: point.latitude,
            longitude: point.longitude,
        }
    }
}

impl From<GeoPointBody> for GeoPoint {
    fn from(body: GeoPointBody) -> Self {
        GeoPoint::new(body.latitude, body.longitude)
    }
}

/// A donation as returned by every donation endpoint.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct DonationResponse {
    pub id: Uuid,
    pub donor_id: Uuid,
    pub donor_name: String,
    pub title: String,
    pub description: String,
    pub quantity: String,
    pub image_url: String,
    pub location: GeoPointBody,
    #[schema(value_type = String, example = "available")]
    pub status: DonationStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Donation> for DonationResponse {
    fn from(d: Donation) -> Self {
        Self {
            id: d.id,
            donor_id: d.donor_id,
            donor_name: d.donor_name,
            title: d.title,
            description: d.description,
            quantity: d.quantity,
            image_url: d.image_url,
            location: d.location.into(),
            status: d.status,
            created_at: d.created_at,
        }
    }
}

/// The fields a donor submits. Missing or blank fields are reported as validation errors.
#[derive(Deserialize, ToSchema)]
pub struct CreateDonationRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub quantity: String,
    pub image_url: Option<String>,
    pub location: Option<GeoPointBody>,
}

impl From<CreateDonationRequest> for DonationDraft {
    fn from(req: CreateDonationRequest) -> Self {
        DonationDraft {
            title: req.title,
            description: req.description,
            quantity: req.quantity,
            image_url: req.image_url,
            location: req.location.map(GeoPoint::from),
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListDonationsQuery {
    /// Status to list; defaults to `available`. Ignored when `donor_id` is set.
    #[param(value_type = Option<String>, example = "available")]
    pub status: Option<DonationStatus>,
    /// List one donor's donations in every status.
    pub donor_id: Option<Uuid>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub url: String,
}

//=========================================================================================
// Donation Handlers
//=========================================================================================

/// List donations, newest first.
#[utoipa::path(
    get,
    path = "/donations",
    params(ListDonationsQuery),
    responses(
        (status = 200, description = "Matching donations, newest first", body = [DonationResponse]),
        (status = 500, description = "Backend failure", body = ErrorBody)
    )
)]
pub async fn list_donations_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListDonationsQuery>,
) -> Result<Json<Vec<DonationResponse>>, HttpError> {
    let donations = match query.donor_id {
        Some(donor_id) => state.donations.list_by_donor(donor_id).await,
        None => {
            let status = query.status.unwrap_or(DonationStatus::Available);
            state.donations.list(status).await
        }
    }
    .map_err(|e| {
        error!("Failed to list donations: {:?}", e);
        HttpError::from(e)
    })?;

    Ok(Json(donations.into_iter().map(Into::into).collect()))
}

/// Post a new donation as the signed-in donor.
#[utoipa::path(
    post,
    path = "/donations",
    request_body = CreateDonationRequest,
    responses(
        (status = 201, description = "Donation posted", body = DonationResponse),
        (status = 400, description = "A required field is missing", body = ErrorBody),
        (status = 403, description = "Caller is not a donor", body = ErrorBody)
    )
)]
pub async fn create_donation_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateDonationRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let donation = state.donations.create(&actor, req.into()).await?;
    Ok((StatusCode::CREATED, Json(DonationResponse::from(donation))))
}

/// Read one donation.
#[utoipa::path(
    get,
    path = "/donations/{id}",
    params(("id" = Uuid, Path, description = "Donation id")),
    responses(
        (status = 200, description = "The donation", body = DonationResponse),
        (status = 404, description = "No such donation", body = ErrorBody)
    )
)]
pub async fn get_donation_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DonationResponse>, HttpError> {
    let donation = state.donations.get(id).await?;
    Ok(Json(donation.into()))
}

/// Claim an available donation as the signed-in NGO.
#[utoipa::path(
    post,
    path = "/donations/{id}/accept",
    params(("id" = Uuid, Path, description = "Donation id")),
    responses(
        (status = 200, description = "Donation is now pending", body = DonationResponse),
        (status = 403, description = "Caller is not an NGO", body = ErrorBody),
        (status = 404, description = "No such donation", body = ErrorBody),
        (status = 409, description = "Donation is no longer available", body = ErrorBody)
    )
)]
pub async fn accept_donation_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<DonationResponse>, HttpError> {
    let donation = state.donations.accept(id, &actor).await?;
    Ok(Json(donation.into()))
}

/// Delete one of the caller's own donations.
#[utoipa::path(
    delete,
    path = "/donations/{id}",
    params(("id" = Uuid, Path, description = "Donation id")),
    responses(
        (status = 204, description = "Donation deleted"),
        (status = 403, description = "Caller did not post this donation", body = ErrorBody),
        (status = 404, description = "No such donation", body = ErrorBody)
    )
)]
pub async fn delete_donation_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpError> {
    state.donations.remove(id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Media Handler
//=========================================================================================

/// Upload a donation photo.
///
/// Accepts a multipart/form-data request with a single file part.
#[utoipa::path(
    post,
    path = "/uploads",
    request_body(content_type = "multipart/form-data", description = "The photo to upload."),
    responses(
        (status = 201, description = "Photo stored", body = UploadResponse),
        (status = 400, description = "Missing or oversized file", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody)
    )
)]
pub async fn upload_media_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| HttpError::bad_request(format!("Failed to read multipart data: {}", e)))?
        .ok_or_else(|| HttpError::bad_request("Multipart form must include a file"))?;

    let file_name = field.file_name().unwrap_or("photo.jpg").to_string();
    let content_type = field.content_type().map(str::to_string);
    let data = field
        .bytes()
        .await
        .map_err(|e| HttpError::bad_request(format!("Failed to read file bytes: {}", e)))?;
    if data.is_empty() {
        return Err(HttpError::bad_request("Uploaded file is empty"));
    }
    if data.len() > state.config.max_upload_bytes {
        return Err(HttpError::bad_request("Uploaded file is too large"));
    }

    let url = state
        .media
        .upload(&file_name, content_type.as_deref(), data)
        .await
        .map_err(|e| {
            error!("Failed to store upload: {:?}", e);
            HttpError::internal("Failed to store upload")
        })?;

    Ok((StatusCode::CREATED, Json(UploadResponse { url })))
}
