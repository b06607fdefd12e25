//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete implementation of
//! the `DonationStore`, `ProfileStore` and `AccountStore` ports from the core
//! crate. It handles all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use food_share_core::domain::{
    Donation, DonationStatus, GeoPoint, Identity, NewDonation, Role, UserCredentials,
    UserProfile,
};
use food_share_core::ports::{
    AccountStore, DonationFilter, DonationStore, PortError, PortResult, ProfileStore,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the storage ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or_unexpected(e: sqlx::Error, what: String) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what),
        other => unexpected(other),
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct DonationRecord {
    id: Uuid,
    donor_id: Uuid,
    donor_name: String,
    title: String,
    description: String,
    quantity: String,
    image_url: String,
    latitude: f64,
    longitude: f64,
    status: String,
    created_at: DateTime<Utc>,
}
impl DonationRecord {
    fn to_domain(self) -> PortResult<Donation> {
        let status = self
            .status
            .parse::<DonationStatus>()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Donation {
            id: self.id,
            donor_id: self.donor_id,
            donor_name: self.donor_name,
            title: self.title,
            description: self.description,
            quantity: self.quantity,
            image_url: self.image_url,
            location: GeoPoint::new(self.latitude, self.longitude),
            status,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct ProfileRecord {
    user_id: Uuid,
    email: String,
    role: String,
    display_name: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    created_at: DateTime<Utc>,
}
impl ProfileRecord {
    fn to_domain(self) -> PortResult<UserProfile> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let location = match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint::new(latitude, longitude)),
            _ => None,
        };
        Ok(UserProfile {
            user_id: self.user_id,
            email: self.email,
            role,
            display_name: self.display_name,
            created_at: self.created_at,
            location,
        })
    }
}

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
    disabled: bool,
}
impl UserRecord {
    fn to_credentials(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
            disabled: self.disabled,
        }
    }

    fn to_identity(self) -> Identity {
        Identity {
            user_id: self.user_id,
            email: Some(self.email),
            display_name: None,
        }
    }
}

const DONATION_COLUMNS: &str = "id, donor_id, donor_name, title, description, quantity, \
     image_url, latitude, longitude, status, created_at";

//=========================================================================================
// `DonationStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DonationStore for DbAdapter {
    async fn insert_donation(&self, donation: NewDonation) -> PortResult<Donation> {
        let sql = format!(
            "INSERT INTO donations (id, donor_id, donor_name, title, description, quantity, \
             image_url, latitude, longitude, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {}",
            DONATION_COLUMNS
        );
        let record = sqlx::query_as::<_, DonationRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(donation.donor_id)
            .bind(&donation.donor_name)
            .bind(&donation.title)
            .bind(&donation.description)
            .bind(&donation.quantity)
            .bind(&donation.image_url)
            .bind(donation.location.latitude)
            .bind(donation.location.longitude)
            .bind(DonationStatus::Available.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        record.to_domain()
    }

    async fn get_donation(&self, donation_id: Uuid) -> PortResult<Donation> {
        let sql = format!("SELECT {} FROM donations WHERE id = $1", DONATION_COLUMNS);
        let record = sqlx::query_as::<_, DonationRecord>(&sql)
            .bind(donation_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| not_found_or_unexpected(e, format!("Donation {} not found", donation_id)))?;
        record.to_domain()
    }

    async fn query_donations(&self, filter: DonationFilter) -> PortResult<Vec<Donation>> {
        let records = match filter {
            DonationFilter::Status(status) => {
                let sql = format!(
                    "SELECT {} FROM donations WHERE status = $1 ORDER BY created_at DESC",
                    DONATION_COLUMNS
                );
                sqlx::query_as::<_, DonationRecord>(&sql)
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await
            }
            DonationFilter::Donor(donor_id) => {
                let sql = format!(
                    "SELECT {} FROM donations WHERE donor_id = $1 ORDER BY created_at DESC",
                    DONATION_COLUMNS
                );
                sqlx::query_as::<_, DonationRecord>(&sql)
                    .bind(donor_id)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn update_status_if(
        &self,
        donation_id: Uuid,
        expected: DonationStatus,
        next: DonationStatus,
    ) -> PortResult<bool> {
        let result = sqlx::query("UPDATE donations SET status = $1 WHERE id = $2 AND status = $3")
            .bind(next.as_str())
            .bind(donation_id)
            .bind(expected.as_str())
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_donation(&self, donation_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM donations WHERE id = $1")
            .bind(donation_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Donation {} not found",
                donation_id
            )));
        }
        Ok(())
    }
}

//=========================================================================================
// `ProfileStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProfileStore for DbAdapter {
    async fn get_profile(&self, user_id: Uuid) -> PortResult<UserProfile> {
        let record = sqlx::query_as::<_, ProfileRecord>(
            "SELECT user_id, email, role, display_name, latitude, longitude, created_at \
             FROM profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("Profile {} not found", user_id)))?;
        record.to_domain()
    }

    async fn create_profile(&self, profile: UserProfile) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO profiles (user_id, email, role, display_name, latitude, longitude, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(profile.user_id)
        .bind(&profile.email)
        .bind(profile.role.as_str())
        .bind(&profile.display_name)
        .bind(profile.location.map(|l| l.latitude))
        .bind(profile.location.map(|l| l.longitude))
        .bind(profile.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PortError::Conflict(format!("Profile {} already exists", profile.user_id))
            } else {
                unexpected(e)
            }
        })?;
        Ok(())
    }
}

//=========================================================================================
// `AccountStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl AccountStore for DbAdapter {
    async fn create_account(&self, email: &str, hashed_password: &str) -> PortResult<Identity> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3) \
             RETURNING user_id, email, hashed_password, disabled",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PortError::Conflict(format!("Email {} already registered", email))
            } else {
                unexpected(e)
            }
        })?;
        Ok(record.to_identity())
    }

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, email, hashed_password, disabled FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("No account for {}", email)))?;
        Ok(record.to_credentials())
    }

    async fn get_identity(&self, user_id: Uuid) -> PortResult<Identity> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, email, hashed_password, disabled FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("User {} not found", user_id)))?;
        Ok(record.to_identity())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT s.user_id FROM auth_sessions s JOIN users u ON u.user_id = s.user_id \
             WHERE s.id = $1 AND s.expires_at > NOW() AND NOT u.disabled",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        user_id.ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}
