//! crates/food_share_client/src/error.rs
//!
//! Errors surfaced by the client, and the one-line notification each maps to.

use food_share_core::{AuthFailure, LifecycleError, PortError};

/// Failures setting up the client itself.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    Config(String, String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Every way a user action can fail.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error("Missing field: {0}")]
    Incomplete(&'static str),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthFailure),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("Photo upload failed: {0}")]
    Upload(PortError),

    #[error("Profile could not be saved: {0}")]
    Profile(PortError),
}

impl AppError {
    /// The text shown to the user in the blocking notification.
    pub fn notification(&self) -> String {
        match self {
            AppError::NotSignedIn => "Please sign in to continue.".to_string(),
            AppError::Incomplete(_) => "Please fill in all fields.".to_string(),
            AppError::Auth(failure) => failure.user_message(),
            AppError::Lifecycle(e) => match e {
                LifecycleError::Validation { .. } => {
                    "Please fill all fields and add an image.".to_string()
                }
                LifecycleError::Authorization(_) => {
                    "You are not allowed to do that with this account.".to_string()
                }
                LifecycleError::State { .. } => {
                    "This donation is no longer available.".to_string()
                }
                LifecycleError::NotFound(_) => "This donation no longer exists.".to_string(),
                LifecycleError::Fetch(_) => {
                    "Failed to load donations. Please try again.".to_string()
                }
                LifecycleError::Write(_) => {
                    "Failed to save the donation. Please try again.".to_string()
                }
            },
            AppError::Upload(_) => "Failed to upload the image. Please try again.".to_string(),
            AppError::Profile(_) => "Failed to save your profile. Please try again.".to_string(),
        }
    }
}
