//! crates/food_share_client/src/app.rs
//!
//! `FoodShareApp` is the context the screens are handed: it owns the ports,
//! the session store and the donation lifecycle, and turns each user action
//! into a single `Result` whose error carries the notification to show.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use food_share_core::lifecycle::validate_draft;
use food_share_core::{
    Actor, AuthGateway, Donation, DonationDraft, DonationLifecycle, DonationStatus,
    DonationStore, GeoPoint, Identity, LifecycleError, MediaStore, Operation, ProfileStore,
    Role, Session, SessionStore, Subscription, Tab, UserProfile,
};
use tokio::sync::{watch, Mutex};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::http::HttpBackend;

/// A photo picked for a new donation.
#[derive(Debug, Clone)]
pub struct Photo {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

pub struct FoodShareApp {
    auth: Arc<dyn AuthGateway>,
    profiles: Arc<dyn ProfileStore>,
    media: Arc<dyn MediaStore>,
    donations: DonationLifecycle,
    session: Arc<SessionStore>,
    subscription: Mutex<Option<Subscription>>,
}

impl FoodShareApp {
    pub fn new(
        auth: Arc<dyn AuthGateway>,
        profiles: Arc<dyn ProfileStore>,
        donations: Arc<dyn DonationStore>,
        media: Arc<dyn MediaStore>,
    ) -> Self {
        Self {
            auth,
            session: Arc::new(SessionStore::new(profiles.clone())),
            profiles,
            media,
            donations: DonationLifecycle::new(donations),
            subscription: Mutex::new(None),
        }
    }

    /// Runs every port against the API through one backend.
    pub fn with_backend(backend: Arc<HttpBackend>) -> Self {
        Self::new(backend.clone(), backend.clone(), backend.clone(), backend)
    }

    /// Starts following the auth gateway's identity changes. Calling it
    /// again while running does nothing.
    pub async fn start(&self) {
        let mut subscription = self.subscription.lock().await;
        if subscription.is_none() {
            *subscription = Some(self.session.subscribe(self.auth.as_ref()));
            info!("Following identity changes");
        }
    }

    /// Stops following identity changes.
    pub async fn shutdown(&self) {
        let subscription = self.subscription.lock().await.take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe().await;
        }
    }

    pub fn session(&self) -> Option<Session> {
        self.session.current()
    }

    pub fn watch_session(&self) -> watch::Receiver<Option<Session>> {
        self.session.watch()
    }

    pub fn role(&self) -> Option<Role> {
        self.session.current_role()
    }

    /// The tabs to show; none while signed out.
    pub fn tabs(&self) -> Vec<Tab> {
        match self.session.current() {
            Some(session) => Tab::visible_for(session.role),
            None => Vec::new(),
        }
    }

    fn actor(&self) -> Result<Actor, AppError> {
        self.session.actor().ok_or(AppError::NotSignedIn)
    }

    //=====================================================================================
    // Account
    //=====================================================================================

    /// Creates an account and its profile, and signs the new user in.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        role: Role,
        display_name: &str,
        location: Option<GeoPoint>,
    ) -> Result<Session, AppError> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(AppError::Incomplete("display_name"));
        }

        let identity = self.auth.sign_up(email, password).await?;
        let profile = UserProfile {
            user_id: identity.user_id,
            email: identity.email.clone().unwrap_or_default(),
            role,
            display_name: display_name.to_string(),
            created_at: Utc::now(),
            location,
        };
        self.profiles
            .create_profile(profile)
            .await
            .map_err(AppError::Profile)?;

        let session = Session {
            identity: Identity {
                display_name: Some(display_name.to_string()),
                ..identity
            },
            role: Some(role),
        };
        self.session.establish(session.clone()).await;
        info!(user_id = %session.identity.user_id, role = %role, "Registered");
        Ok(session)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let identity = self.auth.sign_in(email, password).await?;
        self.session.sync(Some(identity)).await;
        self.session.current().ok_or(AppError::NotSignedIn)
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        self.auth.sign_out().await?;
        self.session.clear().await;
        Ok(())
    }

    //=====================================================================================
    // Donations
    //=====================================================================================

    /// Uploads `photo` (when given) and posts the donation. The draft is
    /// checked before anything is uploaded.
    pub async fn post_donation(
        &self,
        mut draft: DonationDraft,
        photo: Option<Photo>,
    ) -> Result<Donation, AppError> {
        let actor = self.actor()?;
        if !actor.can(Operation::CreateDonation, None) {
            return Err(LifecycleError::Authorization(
                "only donors can post donations".to_string(),
            )
            .into());
        }

        let Some(photo) = photo else {
            return Ok(self.donations.create(&actor, draft).await?);
        };

        validate_draft(
            &actor,
            DonationDraft {
                image_url: Some(photo.file_name.clone()),
                ..draft.clone()
            },
        )?;
        let url = self
            .media
            .upload(&photo.file_name, photo.content_type.as_deref(), photo.data)
            .await
            .map_err(AppError::Upload)?;
        draft.image_url = Some(url);
        Ok(self.donations.create(&actor, draft).await?)
    }

    /// Available donations, newest first.
    pub async fn browse(&self) -> Result<Vec<Donation>, AppError> {
        self.actor()?;
        Ok(self.donations.list(DonationStatus::Available).await?)
    }

    /// The signed-in donor's own donations in every status, newest first.
    pub async fn my_donations(&self) -> Result<Vec<Donation>, AppError> {
        let actor = self.actor()?;
        Ok(self.donations.list_by_donor(actor.user_id).await?)
    }

    pub async fn donation(&self, donation_id: Uuid) -> Result<Donation, AppError> {
        self.actor()?;
        Ok(self.donations.get(donation_id).await?)
    }

    pub async fn accept(&self, donation_id: Uuid) -> Result<Donation, AppError> {
        let actor = self.actor()?;
        Ok(self.donations.accept(donation_id, &actor).await?)
    }

    pub async fn remove(&self, donation_id: Uuid) -> Result<(), AppError> {
        let actor = self.actor()?;
        Ok(self.donations.remove(donation_id, &actor).await?)
    }
}
