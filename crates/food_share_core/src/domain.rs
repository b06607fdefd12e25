//! crates/food_share_core/src/domain.rs
//!
//! Defines the core data structures for the application: donations, the
//! people who post and claim them, and their sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Display name recorded on a donation when the donor has none.
pub const ANONYMOUS_DONOR: &str = "Anonymous";

/// Shortest password the auth backends accept.
pub const MIN_PASSWORD_LEN: usize = 6;

//=========================================================================================
// Roles and Statuses
//=========================================================================================

/// The role a user picked at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Donor,
    Ngo,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Donor => "donor",
            Role::Ngo => "ngo",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "donor" => Ok(Role::Donor),
            "ngo" => Ok(Role::Ngo),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Where a donation is in its lifecycle.
///
/// `Available` is the only initial state and `Available -> Pending` the only
/// transition the application performs. `Collected` and `Expired` exist in
/// stored data but nothing in the application moves a donation into them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    Available,
    Pending,
    Collected,
    Expired,
}

impl DonationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Available => "available",
            DonationStatus::Pending => "pending",
            DonationStatus::Collected => "collected",
            DonationStatus::Expired => "expired",
        }
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: DonationStatus) -> bool {
        matches!(
            (self, next),
            (DonationStatus::Available, DonationStatus::Pending)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DonationStatus::Collected | DonationStatus::Expired)
    }
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DonationStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(DonationStatus::Available),
            "pending" => Ok(DonationStatus::Pending),
            "collected" => Ok(DonationStatus::Collected),
            "expired" => Ok(DonationStatus::Expired),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Returned when a stored string names no known role or status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown variant: {0}")]
pub struct UnknownVariant(pub String);

//=========================================================================================
// Donations
//=========================================================================================

/// A point on the map, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// One surplus-food listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donation {
    pub id: Uuid,
    pub donor_id: Uuid,
    pub donor_name: String,
    pub title: String,
    pub description: String,
    pub quantity: String,
    pub image_url: String,
    pub location: GeoPoint,
    pub status: DonationStatus,
    pub created_at: DateTime<Utc>,
}

/// What a donor filled in before submitting. Nothing here is checked yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DonationDraft {
    pub title: String,
    pub description: String,
    pub quantity: String,
    pub image_url: Option<String>,
    pub location: Option<GeoPoint>,
}

/// A validated draft bound to its donor, ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDonation {
    pub donor_id: Uuid,
    pub donor_name: String,
    pub title: String,
    pub description: String,
    pub quantity: String,
    pub image_url: String,
    pub location: GeoPoint,
}

//=========================================================================================
// Users and Sessions
//=========================================================================================

/// Who the auth backend says the current user is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// The persisted pairing of an identity with its role. Written once at registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
}

/// The current actor: identity plus the role resolved for it.
///
/// `role` is `None` when the profile lookup failed; the user stays signed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub identity: Identity,
    pub role: Option<Role>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub disabled: bool,
}

// Represents a bearer token issued at sign-in
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// A loose shape check: one `@`, something on each side, a dot in the domain.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_available_to_pending_is_allowed() {
        use DonationStatus::*;
        let all = [Available, Pending, Collected, Expired];
        for from in all {
            for to in all {
                let expected = from == Available && to == Pending;
                assert_eq!(from.can_transition_to(to), expected, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn status_and_role_strings_round_trip() {
        for status in ["available", "pending", "collected", "expired"] {
            assert_eq!(status.parse::<DonationStatus>().unwrap().as_str(), status);
        }
        for role in ["donor", "ngo", "admin"] {
            assert_eq!(role.parse::<Role>().unwrap().as_str(), role);
        }
        assert!("volunteer".parse::<Role>().is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&DonationStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(GeoPoint::new(51.5, -0.12).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 180.5).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("donor@example.org"));
        assert!(!is_valid_email("donor.example.org"));
        assert!(!is_valid_email("@example.org"));
        assert!(!is_valid_email("donor@localhost"));
        assert!(!is_valid_email("do nor@example.org"));
    }
}
