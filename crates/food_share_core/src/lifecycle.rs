//! crates/food_share_core/src/lifecycle.rs
//!
//! The donation lifecycle: which listings can be created, who may claim or
//! delete them, and the single status transition the application performs.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::access::{Actor, Operation};
use crate::domain::{Donation, DonationDraft, DonationStatus, NewDonation, ANONYMOUS_DONOR};
use crate::ports::{DonationFilter, DonationStore, PortError};

/// Errors raised by lifecycle operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LifecycleError {
    #[error("Missing or invalid field: {field}")]
    Validation { field: &'static str },

    #[error("Not allowed: {0}")]
    Authorization(String),

    #[error("Donation {id} is {status}, not {expected}")]
    State {
        id: Uuid,
        status: DonationStatus,
        expected: DonationStatus,
    },

    #[error("Donation {0} not found")]
    NotFound(Uuid),

    #[error("Failed to load donations: {0}")]
    Fetch(PortError),

    #[error("Failed to save donation: {0}")]
    Write(PortError),
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Runs donation operations against a `DonationStore`.
#[derive(Clone)]
pub struct DonationLifecycle {
    store: Arc<dyn DonationStore>,
}

impl DonationLifecycle {
    pub fn new(store: Arc<dyn DonationStore>) -> Self {
        Self { store }
    }

    /// Posts a new listing for `actor`, who must be a donor.
    pub async fn create(&self, actor: &Actor, draft: DonationDraft) -> LifecycleResult<Donation> {
        if !actor.can(Operation::CreateDonation, None) {
            return Err(LifecycleError::Authorization(
                "only donors can post donations".to_string(),
            ));
        }
        let new_donation = validate_draft(actor, draft)?;

        let donation = self
            .store
            .insert_donation(new_donation)
            .await
            .map_err(LifecycleError::Write)?;
        info!(donation_id = %donation.id, donor_id = %donation.donor_id, "Donation posted");
        Ok(donation)
    }

    /// Donations in `status`, newest first.
    pub async fn list(&self, status: DonationStatus) -> LifecycleResult<Vec<Donation>> {
        self.query(DonationFilter::Status(status)).await
    }

    /// A donor's own listings in any status, newest first.
    pub async fn list_by_donor(&self, donor_id: Uuid) -> LifecycleResult<Vec<Donation>> {
        self.query(DonationFilter::Donor(donor_id)).await
    }

    pub async fn get(&self, donation_id: Uuid) -> LifecycleResult<Donation> {
        self.store
            .get_donation(donation_id)
            .await
            .map_err(|e| match e {
                PortError::NotFound(_) => LifecycleError::NotFound(donation_id),
                other => LifecycleError::Fetch(other),
            })
    }

    /// Claims an available donation for an NGO, moving it to `Pending`.
    pub async fn accept(&self, donation_id: Uuid, actor: &Actor) -> LifecycleResult<Donation> {
        let donation = self.get(donation_id).await?;
        if !actor.can(Operation::AcceptDonation, Some(&donation)) {
            return Err(LifecycleError::Authorization(
                "only NGOs can accept donations".to_string(),
            ));
        }

        let next = DonationStatus::Pending;
        if !donation.status.can_transition_to(next) {
            return Err(LifecycleError::State {
                id: donation.id,
                status: donation.status,
                expected: DonationStatus::Available,
            });
        }

        let updated = self
            .store
            .update_status_if(donation.id, donation.status, next)
            .await
            .map_err(LifecycleError::Write)?;
        if !updated {
            // Someone else changed the status between our read and the write.
            let current = self.get(donation_id).await?;
            warn!(donation_id = %donation_id, status = %current.status, "Accept lost a race");
            return Err(LifecycleError::State {
                id: donation_id,
                status: current.status,
                expected: DonationStatus::Available,
            });
        }

        info!(donation_id = %donation_id, ngo_id = %actor.user_id, "Donation accepted");
        Ok(Donation {
            status: next,
            ..donation
        })
    }

    /// Deletes a listing. Only the donor who posted it may do this.
    pub async fn remove(&self, donation_id: Uuid, actor: &Actor) -> LifecycleResult<()> {
        let donation = self.get(donation_id).await?;
        if !actor.can(Operation::RemoveDonation, Some(&donation)) {
            return Err(LifecycleError::Authorization(
                "only the donor who posted a donation can remove it".to_string(),
            ));
        }

        self.store
            .delete_donation(donation_id)
            .await
            .map_err(LifecycleError::Write)?;
        info!(donation_id = %donation_id, "Donation removed");
        Ok(())
    }

    async fn query(&self, filter: DonationFilter) -> LifecycleResult<Vec<Donation>> {
        let mut donations = self
            .store
            .query_donations(filter)
            .await
            .map_err(LifecycleError::Fetch)?;
        donations.retain(|d| filter.matches(d));
        donations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(donations)
    }
}

fn required(value: String, field: &'static str) -> LifecycleResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LifecycleError::Validation { field });
    }
    Ok(trimmed.to_string())
}

/// Checks every required field of a draft and binds it to its donor.
pub fn validate_draft(actor: &Actor, draft: DonationDraft) -> LifecycleResult<NewDonation> {
    let title = required(draft.title, "title")?;
    let description = required(draft.description, "description")?;
    let quantity = required(draft.quantity, "quantity")?;
    let image_url = required(draft.image_url.unwrap_or_default(), "image")?;
    let location = draft
        .location
        .filter(|point| point.is_valid())
        .ok_or(LifecycleError::Validation { field: "location" })?;

    let donor_name = actor
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(ANONYMOUS_DONOR)
        .to_string();

    Ok(NewDonation {
        donor_id: actor.user_id,
        donor_name,
        title,
        description,
        quantity,
        image_url,
        location,
    })
}
