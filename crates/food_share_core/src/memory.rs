//! crates/food_share_core/src/memory.rs
//!
//! In-process implementations of every port. They back the test suites and
//! can stand in for the hosted services when running locally.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::domain::{
    is_valid_email, Donation, DonationStatus, Identity, NewDonation, UserCredentials,
    UserProfile, MIN_PASSWORD_LEN,
};
use crate::ports::{
    identity_stream, media_object_key, AccountStore, AuthFailure, AuthGateway, AuthResult,
    DonationFilter, DonationStore, IdentityStream, MediaStore, PortError, PortResult,
    ProfileStore,
};

//=========================================================================================
// Donations
//=========================================================================================

#[derive(Default)]
pub struct InMemoryDonationStore {
    donations: RwLock<HashMap<Uuid, Donation>>,
}

impl InMemoryDonationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fully formed record, bypassing id and timestamp assignment.
    pub async fn put(&self, donation: Donation) {
        self.donations.write().await.insert(donation.id, donation);
    }
}

#[async_trait]
impl DonationStore for InMemoryDonationStore {
    async fn insert_donation(&self, donation: NewDonation) -> PortResult<Donation> {
        let record = Donation {
            id: Uuid::new_v4(),
            donor_id: donation.donor_id,
            donor_name: donation.donor_name,
            title: donation.title,
            description: donation.description,
            quantity: donation.quantity,
            image_url: donation.image_url,
            location: donation.location,
            status: DonationStatus::Available,
            created_at: Utc::now(),
        };
        self.donations
            .write()
            .await
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_donation(&self, donation_id: Uuid) -> PortResult<Donation> {
        self.donations
            .read()
            .await
            .get(&donation_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Donation {} not found", donation_id)))
    }

    async fn query_donations(&self, filter: DonationFilter) -> PortResult<Vec<Donation>> {
        let mut matching: Vec<Donation> = self
            .donations
            .read()
            .await
            .values()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn update_status_if(
        &self,
        donation_id: Uuid,
        expected: DonationStatus,
        next: DonationStatus,
    ) -> PortResult<bool> {
        let mut donations = self.donations.write().await;
        match donations.get_mut(&donation_id) {
            Some(donation) if donation.status == expected => {
                donation.status = next;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(PortError::NotFound(format!(
                "Donation {} not found",
                donation_id
            ))),
        }
    }

    async fn delete_donation(&self, donation_id: Uuid) -> PortResult<()> {
        self.donations
            .write()
            .await
            .remove(&donation_id)
            .map(|_| ())
            .ok_or_else(|| PortError::NotFound(format!("Donation {} not found", donation_id)))
    }
}

//=========================================================================================
// Profiles
//=========================================================================================

#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<Uuid, UserProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_profile(&self, user_id: Uuid) -> PortResult<UserProfile> {
        self.profiles
            .read()
            .await
            .get(&user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Profile {} not found", user_id)))
    }

    async fn create_profile(&self, profile: UserProfile) -> PortResult<()> {
        let mut profiles = self.profiles.write().await;
        if profiles.contains_key(&profile.user_id) {
            return Err(PortError::Conflict(format!(
                "Profile {} already exists",
                profile.user_id
            )));
        }
        profiles.insert(profile.user_id, profile);
        Ok(())
    }
}

//=========================================================================================
// Media
//=========================================================================================

pub struct InMemoryMediaStore {
    base_url: String,
    objects: RwLock<HashMap<String, Bytes>>,
}

impl InMemoryMediaStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    pub async fn object(&self, key: &str) -> Option<Bytes> {
        self.objects.read().await.get(key).cloned()
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn upload(
        &self,
        file_name: &str,
        _content_type: Option<&str>,
        data: Bytes,
    ) -> PortResult<String> {
        let key = media_object_key(file_name, Utc::now());
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), key);
        self.objects.write().await.insert(key, data);
        Ok(url)
    }
}

//=========================================================================================
// Accounts and Auth Sessions (backend side)
//=========================================================================================

#[derive(Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<Uuid, UserCredentials>>,
    sessions: RwLock<HashMap<String, (Uuid, DateTime<Utc>)>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_disabled(&self, user_id: Uuid, disabled: bool) -> PortResult<()> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        account.disabled = disabled;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn create_account(&self, email: &str, hashed_password: &str) -> PortResult<Identity> {
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.email.eq_ignore_ascii_case(email)) {
            return Err(PortError::Conflict(format!("Email {} already registered", email)));
        }
        let credentials = UserCredentials {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            disabled: false,
        };
        let identity = Identity {
            user_id: credentials.user_id,
            email: Some(credentials.email.clone()),
            display_name: None,
        };
        accounts.insert(credentials.user_id, credentials);
        Ok(identity)
    }

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.accounts
            .read()
            .await
            .values()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("No account for {}", email)))
    }

    async fn get_identity(&self, user_id: Uuid) -> PortResult<Identity> {
        self.accounts
            .read()
            .await
            .get(&user_id)
            .map(|a| Identity {
                user_id: a.user_id,
                email: Some(a.email.clone()),
                display_name: None,
            })
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id = match self.sessions.read().await.get(session_id) {
            Some((user_id, expires_at)) if *expires_at > Utc::now() => *user_id,
            _ => return Err(PortError::Unauthorized),
        };
        match self.accounts.read().await.get(&user_id) {
            Some(account) if !account.disabled => Ok(user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}

//=========================================================================================
// Auth Gateway (client side)
//=========================================================================================

struct GatewayAccount {
    identity: Identity,
    password: String,
    disabled: bool,
}

/// A local identity provider that signs users in against accounts it holds.
pub struct InMemoryAuthGateway {
    accounts: RwLock<HashMap<String, GatewayAccount>>,
    current: RwLock<Option<Identity>>,
    changes: broadcast::Sender<Option<Identity>>,
}

impl Default for InMemoryAuthGateway {
    fn default() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            accounts: RwLock::new(HashMap::new()),
            current: RwLock::new(None),
            changes,
        }
    }
}

impl InMemoryAuthGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn disable(&self, email: &str) {
        if let Some(account) = self.accounts.write().await.get_mut(&email.to_lowercase()) {
            account.disabled = true;
        }
    }

    /// Pushes an identity change as if it came from the provider itself,
    /// e.g. a token refresh or a remote sign-out.
    pub async fn emit(&self, identity: Option<Identity>) {
        *self.current.write().await = identity.clone();
        let _ = self.changes.send(identity);
    }
}

#[async_trait]
impl AuthGateway for InMemoryAuthGateway {
    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<Identity> {
        if !is_valid_email(email) {
            return Err(AuthFailure::InvalidEmail);
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthFailure::WeakPassword);
        }
        let key = email.trim().to_lowercase();
        let identity = {
            let mut accounts = self.accounts.write().await;
            if accounts.contains_key(&key) {
                return Err(AuthFailure::EmailInUse);
            }
            let identity = Identity {
                user_id: Uuid::new_v4(),
                email: Some(email.trim().to_string()),
                display_name: None,
            };
            accounts.insert(
                key,
                GatewayAccount {
                    identity: identity.clone(),
                    password: password.to_string(),
                    disabled: false,
                },
            );
            identity
        };
        self.emit(Some(identity.clone())).await;
        Ok(identity)
    }

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Identity> {
        if !is_valid_email(email) {
            return Err(AuthFailure::InvalidEmail);
        }
        let identity = {
            let accounts = self.accounts.read().await;
            let account = accounts
                .get(&email.trim().to_lowercase())
                .ok_or(AuthFailure::InvalidCredentials)?;
            if account.password != password {
                return Err(AuthFailure::InvalidCredentials);
            }
            if account.disabled {
                return Err(AuthFailure::UserDisabled);
            }
            account.identity.clone()
        };
        self.emit(Some(identity.clone())).await;
        Ok(identity)
    }

    async fn sign_out(&self) -> AuthResult<()> {
        self.emit(None).await;
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
