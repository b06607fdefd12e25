//! crates/food_share_client/src/http.rs
//!
//! Implements every client-side port against the FoodShare API over HTTP.
//! One `HttpBackend` holds the bearer token for the signed-in user and
//! publishes identity changes to local subscribers.

use async_trait::async_trait;
use bytes::Bytes;
use food_share_core::domain::{
    Donation, DonationStatus, GeoPoint, Identity, NewDonation, Role, UserProfile,
};
use food_share_core::ports::{
    identity_stream, AuthFailure, AuthGateway, AuthResult, DonationFilter, DonationStore,
    IdentityStream, MediaStore, PortError, PortResult, ProfileStore,
};
use reqwest::{
    multipart::{Form, Part},
    Method, RequestBuilder, Response, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::ClientError;

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Serialize)]
struct CredentialsBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct AuthBody {
    user_id: Uuid,
    email: String,
    token: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

#[derive(Serialize)]
struct DonationBody<'a> {
    title: &'a str,
    description: &'a str,
    quantity: &'a str,
    image_url: &'a str,
    location: GeoPoint,
}

#[derive(Serialize)]
struct ProfileBody<'a> {
    role: Role,
    display_name: &'a str,
    location: Option<GeoPoint>,
}

#[derive(Deserialize)]
struct UploadBody {
    url: String,
}

//=========================================================================================
// Response Helpers
//=========================================================================================

async fn error_body(response: Response) -> ErrorBody {
    let status = response.status();
    response.json::<ErrorBody>().await.unwrap_or_else(|_| ErrorBody {
        code: "internal".to_string(),
        message: status.to_string(),
    })
}

fn port_error(status: StatusCode, body: ErrorBody) -> PortError {
    match status {
        StatusCode::NOT_FOUND => PortError::NotFound(body.message),
        StatusCode::CONFLICT => PortError::Conflict(body.message),
        StatusCode::UNAUTHORIZED => PortError::Unauthorized,
        _ => PortError::Unexpected(format!("{} ({}): {}", status, body.code, body.message)),
    }
}

fn transport(e: reqwest::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Sends `builder` and decodes a JSON success body, mapping error statuses to `PortError`.
async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> PortResult<T> {
    let response = builder.send().await.map_err(transport)?;
    let status = response.status();
    if !status.is_success() {
        return Err(port_error(status, error_body(response).await));
    }
    response.json::<T>().await.map_err(transport)
}

//=========================================================================================
// HttpBackend
//=========================================================================================

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
    current: RwLock<Option<Identity>>,
    changes: broadcast::Sender<Option<Identity>>,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        let (changes, _) = broadcast::channel(64);
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            token: RwLock::new(None),
            current: RwLock::new(None),
            changes,
        })
    }

    /// The bearer token of the signed-in user. This is the only state worth
    /// persisting between launches.
    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Resumes a saved session. Returns `None`, and forgets the token, when
    /// the API no longer accepts it.
    pub async fn restore(&self, token: &str) -> PortResult<Option<Identity>> {
        *self.token.write().await = Some(token.to_string());

        match send_json::<Identity>(self.request(Method::GET, "/auth/me").await).await {
            Ok(identity) => {
                info!(user_id = %identity.user_id, "Restored saved session");
                self.publish(Some(identity.clone())).await;
                Ok(Some(identity))
            }
            Err(PortError::Unauthorized) => {
                warn!("Saved session was rejected, signing out");
                *self.token.write().await = None;
                self.publish(None).await;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match self.token.read().await.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn publish(&self, identity: Option<Identity>) {
        *self.current.write().await = identity.clone();
        let _ = self.changes.send(identity);
    }

    async fn authenticate(&self, path: &str, email: &str, password: &str) -> AuthResult<Identity> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(&CredentialsBody {
                email: email.trim(),
                password,
            })
            .send()
            .await
            .map_err(|e| AuthFailure::Network(e.to_string()))?;

        if !response.status().is_success() {
            let body = error_body(response).await;
            return Err(AuthFailure::from_code(&body.code, body.message));
        }

        let body: AuthBody = response
            .json()
            .await
            .map_err(|e| AuthFailure::Other(e.to_string()))?;
        *self.token.write().await = Some(body.token);

        let identity = Identity {
            user_id: body.user_id,
            email: Some(body.email),
            display_name: None,
        };
        self.publish(Some(identity.clone())).await;
        Ok(identity)
    }
}

#[async_trait]
impl AuthGateway for HttpBackend {
    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<Identity> {
        self.authenticate("/auth/signup", email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Identity> {
        self.authenticate("/auth/login", email, password).await
    }

    async fn sign_out(&self) -> AuthResult<()> {
        let token = self.token.write().await.take();
        self.publish(None).await;

        if let Some(token) = token {
            let result = self
                .client
                .post(format!("{}/auth/logout", self.base_url))
                .bearer_auth(token)
                .send()
                .await;
            if let Err(e) = result {
                warn!("Server-side logout failed, token dropped locally: {}", e);
            }
        }
        Ok(())
    }

    fn identity_changes(&self) -> IdentityStream {
        let receiver = self.changes.subscribe();
        let initial = self
            .current
            .try_read()
            .map(|current| current.clone())
            .unwrap_or(None);
        identity_stream(initial, receiver)
    }
}

#[async_trait]
impl DonationStore for HttpBackend {
    async fn insert_donation(&self, donation: NewDonation) -> PortResult<Donation> {
        let body = DonationBody {
            title: &donation.title,
            description: &donation.description,
            quantity: &donation.quantity,
            image_url: &donation.image_url,
            location: donation.location,
        };
        send_json(self.request(Method::POST, "/donations").await.json(&body)).await
    }

    async fn get_donation(&self, donation_id: Uuid) -> PortResult<Donation> {
        let path = format!("/donations/{}", donation_id);
        send_json(self.request(Method::GET, &path).await).await
    }

    async fn query_donations(&self, filter: DonationFilter) -> PortResult<Vec<Donation>> {
        let query = match filter {
            DonationFilter::Status(status) => [("status", status.as_str().to_string())],
            DonationFilter::Donor(donor_id) => [("donor_id", donor_id.to_string())],
        };
        send_json(self.request(Method::GET, "/donations").await.query(&query[..])).await
    }

    async fn update_status_if(
        &self,
        donation_id: Uuid,
        expected: DonationStatus,
        next: DonationStatus,
    ) -> PortResult<bool> {
        if (expected, next) != (DonationStatus::Available, DonationStatus::Pending) {
            return Err(PortError::Unexpected(format!(
                "the API cannot move a donation from {} to {}",
                expected, next
            )));
        }

        let path = format!("/donations/{}/accept", donation_id);
        let response = self
            .request(Method::POST, &path)
            .await
            .send()
            .await
            .map_err(transport)?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::CONFLICT => Ok(false),
            status => Err(port_error(status, error_body(response).await)),
        }
    }

    async fn delete_donation(&self, donation_id: Uuid) -> PortResult<()> {
        let path = format!("/donations/{}", donation_id);
        let response = self
            .request(Method::DELETE, &path)
            .await
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(port_error(status, error_body(response).await));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for HttpBackend {
    async fn get_profile(&self, user_id: Uuid) -> PortResult<UserProfile> {
        let path = format!("/profiles/{}", user_id);
        send_json(self.request(Method::GET, &path).await).await
    }

    /// The API records the profile for the signed-in user; `profile.user_id`
    /// and `profile.email` come from the token, not the request.
    async fn create_profile(&self, profile: UserProfile) -> PortResult<()> {
        let body = ProfileBody {
            role: profile.role,
            display_name: &profile.display_name,
            location: profile.location,
        };
        send_json::<UserProfile>(self.request(Method::POST, "/profiles").await.json(&body))
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl MediaStore for HttpBackend {
    async fn upload(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        data: Bytes,
    ) -> PortResult<String> {
        let mut part = Part::bytes(data.to_vec()).file_name(file_name.to_string());
        if let Some(content_type) = content_type {
            part = part.mime_str(content_type).map_err(transport)?;
        }
        let form = Form::new().part("file", part);

        let body: UploadBody =
            send_json(self.request(Method::POST, "/uploads").await.multipart(form)).await?;
        Ok(body.url)
    }
}
