//! crates/food_share_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture: the hosted
//! auth, profile, donation and media backends all sit behind them.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::{stream, Stream, StreamExt};
use std::pin::Pin;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::{
    Donation, DonationStatus, Identity, NewDonation, UserCredentials, UserProfile,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    Conflict(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Why an auth gateway call was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    #[error("invalid email address")]
    InvalidEmail,
    #[error("account disabled")]
    UserDisabled,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("email already in use")]
    EmailInUse,
    #[error("password too weak")]
    WeakPassword,
    #[error("network failure: {0}")]
    Network(String),
    #[error("{0}")]
    Other(String),
}

impl AuthFailure {
    /// The stable code carried on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            AuthFailure::InvalidEmail => "invalid-email",
            AuthFailure::UserDisabled => "user-disabled",
            AuthFailure::InvalidCredentials => "invalid-credential",
            AuthFailure::EmailInUse => "email-already-in-use",
            AuthFailure::WeakPassword => "weak-password",
            AuthFailure::Network(_) => "network-request-failed",
            AuthFailure::Other(_) => "internal",
        }
    }

    /// Rebuilds a failure from a wire code. Unknown codes keep `message`.
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        match code {
            "invalid-email" => AuthFailure::InvalidEmail,
            "user-disabled" => AuthFailure::UserDisabled,
            "invalid-credential" | "user-not-found" | "wrong-password" => {
                AuthFailure::InvalidCredentials
            }
            "email-already-in-use" => AuthFailure::EmailInUse,
            "weak-password" => AuthFailure::WeakPassword,
            "network-request-failed" => AuthFailure::Network(message.into()),
            _ => AuthFailure::Other(message.into()),
        }
    }

    /// Text shown to the user when signing in fails.
    pub fn user_message(&self) -> String {
        match self {
            AuthFailure::InvalidEmail => "The email address is badly formatted.".to_string(),
            AuthFailure::UserDisabled => "This user account has been disabled.".to_string(),
            AuthFailure::InvalidCredentials => {
                "Invalid email or password. Please try again.".to_string()
            }
            AuthFailure::EmailInUse => {
                "An account with this email address already exists.".to_string()
            }
            AuthFailure::WeakPassword => "Password should be at least 6 characters.".to_string(),
            AuthFailure::Network(_) => "Network error. Please check your connection.".to_string(),
            AuthFailure::Other(_) => "An error occurred during login.".to_string(),
        }
    }
}

pub type AuthResult<T> = Result<T, AuthFailure>;

/// Identity changes as pushed by the auth gateway. `None` means signed out.
pub type IdentityStream = Pin<Box<dyn Stream<Item = Option<Identity>> + Send>>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Equality filters the donation store supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonationFilter {
    Status(DonationStatus),
    Donor(Uuid),
}

impl DonationFilter {
    pub fn matches(&self, donation: &Donation) -> bool {
        match self {
            DonationFilter::Status(status) => donation.status == *status,
            DonationFilter::Donor(donor_id) => donation.donor_id == *donor_id,
        }
    }
}

#[async_trait]
pub trait DonationStore: Send + Sync {
    /// Stores a new listing. The store assigns the id and creation time, and the
    /// status is always `Available`.
    async fn insert_donation(&self, donation: NewDonation) -> PortResult<Donation>;

    async fn get_donation(&self, donation_id: Uuid) -> PortResult<Donation>;

    /// Matching donations, newest first.
    async fn query_donations(&self, filter: DonationFilter) -> PortResult<Vec<Donation>>;

    /// Sets `next` only if the stored status is still `expected`.
    /// Returns whether a record was updated.
    async fn update_status_if(
        &self,
        donation_id: Uuid,
        expected: DonationStatus,
        next: DonationStatus,
    ) -> PortResult<bool>;

    async fn delete_donation(&self, donation_id: Uuid) -> PortResult<()>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, user_id: Uuid) -> PortResult<UserProfile>;

    /// Fails with `PortError::Conflict` when the user already has a profile.
    async fn create_profile(&self, profile: UserProfile) -> PortResult<()>;
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stores a donation photo and returns a URL anyone can fetch it from.
    async fn upload(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        data: Bytes,
    ) -> PortResult<String>;
}

/// Account and bearer-token storage used by the backend's own auth endpoints.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn create_account(&self, email: &str, hashed_password: &str) -> PortResult<Identity>;

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_identity(&self, user_id: Uuid) -> PortResult<Identity>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Resolves a live token to its user. Expired or unknown tokens are `Unauthorized`.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}

/// The hosted identity provider as the client sees it.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<Identity>;

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Identity>;

    async fn sign_out(&self) -> AuthResult<()>;

    /// Yields the current identity first, then one item per change.
    fn identity_changes(&self) -> IdentityStream;
}

/// Builds an `IdentityStream` that yields `initial`, then everything sent on
/// the broadcast channel. Lagged receivers skip what they missed.
pub fn identity_stream(
    initial: Option<Identity>,
    receiver: broadcast::Receiver<Option<Identity>>,
) -> IdentityStream {
    let changes = stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(identity) => return Some((identity, receiver)),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });
    stream::once(async move { initial }).chain(changes).boxed()
}

/// Storage key for an uploaded photo: `donations/{unix_millis}_{file_name}`.
pub fn media_object_key(file_name: &str, uploaded_at: DateTime<Utc>) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    let name = if cleaned.is_empty() { "upload" } else { cleaned };
    format!("donations/{}_{}", uploaded_at.timestamp_millis(), name)
}
